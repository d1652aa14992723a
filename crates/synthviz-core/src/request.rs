use crate::panel::PanelSelection;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Figure dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: 15.0,
            height: 12.0,
        }
    }
}

impl FigureSize {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        for (name, v) in [("width", width), ("height", height)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidFigureSize {
                    message: format!("{name} must be a positive number, got {v}"),
                });
            }
        }
        Ok(Self { width, height })
    }
}

impl FromStr for FigureSize {
    type Err = Error;

    /// Accepts `WxH` (or `W,H`), e.g. `15x12`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((w, h)) = s.split_once(['x', 'X', ',']) else {
            return Err(Error::InvalidFigureSize {
                message: format!("expected WIDTHxHEIGHT, got `{s}`"),
            });
        };
        let parse = |v: &str| {
            v.trim().parse::<f64>().map_err(|_| Error::InvalidFigureSize {
                message: format!("`{}` is not a number", v.trim()),
            })
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

/// What to draw and how to label it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotRequest {
    pub panels: PanelSelection,
    pub figsize: FigureSize,
    pub treated_label: String,
    pub synth_label: String,
}

impl Default for PlotRequest {
    fn default() -> Self {
        Self {
            panels: PanelSelection::all(),
            figsize: FigureSize::default(),
            treated_label: "Treated Unit".to_string(),
            synth_label: "Synthetic Control".to_string(),
        }
    }
}

impl PlotRequest {
    pub fn with_panels<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Ok(Self {
            panels: PanelSelection::parse(names)?,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Panel;

    #[test]
    fn parses_figsize() {
        let size: FigureSize = "8x4.5".parse().unwrap();
        assert_eq!(size, FigureSize { width: 8.0, height: 4.5 });
        assert!("8".parse::<FigureSize>().is_err());
        assert!("0x4".parse::<FigureSize>().is_err());
        assert!("ax4".parse::<FigureSize>().is_err());
    }

    #[test]
    fn defaults_match_reference_figure() {
        let req = PlotRequest::default();
        assert_eq!(req.figsize, FigureSize { width: 15.0, height: 12.0 });
        assert_eq!(req.treated_label, "Treated Unit");
        assert_eq!(req.synth_label, "Synthetic Control");
        assert_eq!(req.panels.len(), 4);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: PlotRequest =
            serde_json::from_str(r#"{"panels": ["pointwise"], "treated_label": "Basque"}"#)
                .unwrap();
        assert_eq!(req.panels.as_slice(), &[Panel::Pointwise]);
        assert_eq!(req.treated_label, "Basque");
        assert_eq!(req.synth_label, "Synthetic Control");
    }
}
