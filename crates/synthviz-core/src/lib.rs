#![forbid(unsafe_code)]

//! Data model and display arithmetic for synthetic-control diagnostic charts.
//!
//! A host analysis hands over a finished [`SyntheticControlStudy`]: the time axis, the treated
//! and synthetic outcomes, the control outcomes and, optionally, the in-space placebo outcomes.
//! This crate validates those arrays, resolves which [`Panel`]s to draw and derives the effect
//! series the charts plot. Layout and SVG output live in `synthviz-render`.

pub mod config;
pub mod effects;
pub mod error;
pub mod panel;
pub mod request;
pub mod study;

pub use config::PlotConfig;
pub use effects::EffectSeries;
pub use error::{Error, Result};
pub use panel::{Panel, PanelSelection};
pub use request::{FigureSize, PlotRequest};
pub use study::SyntheticControlStudy;
