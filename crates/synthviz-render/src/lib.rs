#![forbid(unsafe_code)]

//! Headless layout and SVG rendering for synthetic-control diagnostic figures.
//!
//! Rendering is split in two: [`layout_study`] turns a study into a serializable
//! [`model::FigureLayout`] of positioned drawables, and [`svg::render_figure_svg`] serializes
//! that layout into a standalone SVG document.

mod axis;
pub mod layout;
pub mod model;
mod panels;
mod style;
pub mod svg;
pub mod text;
pub mod ticks;

use crate::model::FigureLayout;
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;
use synthviz_core::{PlotConfig, PlotRequest, SyntheticControlStudy};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] synthviz_core::Error),
    #[error("invalid figure layout: {message}")]
    InvalidLayout { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

pub fn layout_study(
    study: &SyntheticControlStudy,
    request: &PlotRequest,
    config: &PlotConfig,
    options: &LayoutOptions,
) -> Result<FigureLayout> {
    layout::layout_figure(study, request, config, options.text_measurer.as_ref())
}
