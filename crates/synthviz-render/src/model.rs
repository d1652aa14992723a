use serde::{Deserialize, Serialize};
use synthviz_core::Panel;

/// Path coordinate rounded to three decimals, without a negative zero.
pub(crate) fn fmt_pt(v: f64) -> String {
    let v = (v * 1000.0).round() / 1000.0;
    if v == 0.0 {
        return "0".to_string();
    }
    format!("{v}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// SVG `stroke-dasharray` for a stroke of the given width.
    pub fn dash_array(self, stroke_width: f64) -> Option<String> {
        let w = stroke_width.max(0.5);
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some(format!("{},{}", 3.7 * w, 1.6 * w)),
            LineStyle::Dotted => Some(format!("{},{}", w, 1.65 * w)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    #[serde(rename = "strokeFill")]
    pub stroke_fill: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub fill: String,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(rename = "verticalPos")]
    pub vertical_pos: String,
    #[serde(rename = "horizontalPos")]
    pub horizontal_pos: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathData {
    pub path: String,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(rename = "strokeFill")]
    pub stroke_fill: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(default, rename = "lineStyle")]
    pub line_style: LineStyle,
    /// Draw an arrow head at the last point.
    #[serde(default, rename = "arrowEnd")]
    pub arrow_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DrawableElem {
    #[serde(rename = "rect")]
    Rect {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        data: Vec<RectData>,
    },
    #[serde(rename = "text")]
    Text {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        data: Vec<TextData>,
    },
    #[serde(rename = "path")]
    Path {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        data: Vec<PathData>,
    },
}

impl DrawableElem {
    pub fn group_texts(&self) -> &[String] {
        match self {
            DrawableElem::Rect { group_texts, .. }
            | DrawableElem::Text { group_texts, .. }
            | DrawableElem::Path { group_texts, .. } => group_texts,
        }
    }
}

/// Placement of one panel's plot area and the data domain it maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelLayout {
    pub panel: Panel,
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "xDomain")]
    pub x_domain: (f64, f64),
    #[serde(rename = "yDomain")]
    pub y_domain: (f64, f64),
    #[serde(rename = "showXTickLabels")]
    pub show_x_tick_labels: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureLayout {
    pub width: f64,
    pub height: f64,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
    #[serde(rename = "fontFamily")]
    pub font_family: String,
    pub panels: Vec<PanelLayout>,
    #[serde(default)]
    pub drawables: Vec<DrawableElem>,
}
