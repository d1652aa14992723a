use crate::model::{DrawableElem, LineStyle, PathData, TextData, fmt_pt};
use crate::text::{TextMeasurer, TextStyle};
use crate::ticks::{format_tick, nice_ticks};

#[derive(Debug, Clone)]
pub(crate) struct AxisConfig {
    pub show_label: bool,
    pub label_font_size: f64,
    pub label_padding: f64,
    pub show_title: bool,
    pub title_font_size: f64,
    pub title_padding: f64,
    pub show_tick: bool,
    pub tick_length: f64,
    pub tick_width: f64,
    pub show_axis_line: bool,
    pub axis_line_width: f64,
    pub tick_count: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct AxisTheme {
    pub title_color: String,
    pub label_color: String,
    pub tick_color: String,
    pub axis_line_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AxisPosition {
    Left,
    Bottom,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Dimension {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub(crate) fn max_text_dimension(
    texts: &[String],
    font_size: f64,
    measurer: &dyn TextMeasurer,
) -> Dimension {
    let style = TextStyle {
        font_size,
        ..Default::default()
    };
    texts.iter().fold(
        Dimension {
            width: 0.0,
            height: 0.0,
        },
        |acc, t| {
            let m = measurer.measure(t, &style);
            Dimension {
                width: acc.width.max(m.width),
                height: acc.height.max(m.height),
            }
        },
    )
}

/// A linear axis on the left (y) or bottom (x) edge of a panel's plot area.
///
/// `calculate_space` decides which parts (line, tick labels, ticks, title) fit in the space
/// offered, in that priority order; the drawables only include the parts that fit.
#[derive(Debug, Clone)]
pub(crate) struct Axis {
    domain: (f64, f64),
    config: AxisConfig,
    theme: AxisTheme,
    position: AxisPosition,
    bounding_rect: BoundingRect,
    range: (f64, f64),
    show_title: bool,
    show_label: bool,
    show_tick: bool,
    show_axis_line: bool,
    title: String,
    title_text_height: f64,
    group: Vec<String>,
}

impl Axis {
    pub fn new(
        domain: (f64, f64),
        config: AxisConfig,
        theme: AxisTheme,
        position: AxisPosition,
        title: String,
        group: Vec<String>,
    ) -> Self {
        Self {
            domain,
            config,
            theme,
            position,
            bounding_rect: BoundingRect::default(),
            range: (0.0, 10.0),
            show_title: false,
            show_label: false,
            show_tick: false,
            show_axis_line: false,
            title,
            title_text_height: 0.0,
            group,
        }
    }

    pub fn set_range(&mut self, range: (f64, f64)) {
        self.range = range;
        match self.position {
            AxisPosition::Left => self.bounding_rect.height = range.1 - range.0,
            AxisPosition::Bottom => self.bounding_rect.width = range.1 - range.0,
        }
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.bounding_rect.x = x;
        self.bounding_rect.y = y;
    }

    pub fn tick_values(&self) -> Vec<f64> {
        let (a, b) = self.domain;
        nice_ticks(a, b, self.config.tick_count)
    }

    fn tick_labels(&self) -> Vec<String> {
        self.tick_values().into_iter().map(format_tick).collect()
    }

    /// Maps a data value to a pixel coordinate along this axis.
    ///
    /// Left axes grow upwards, so the domain maximum sits at the top of the range.
    pub fn scale(&self, v: f64) -> f64 {
        let (mut d0, mut d1) = self.domain;
        if self.position == AxisPosition::Left {
            std::mem::swap(&mut d0, &mut d1);
        }
        let (r0, r1) = self.range;
        if d0 == d1 {
            return r0 + (r1 - r0) * 0.5;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn contains(&self, v: f64) -> bool {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        v >= lo && v <= hi
    }

    pub fn calculate_space(&mut self, available: Dimension, measurer: &dyn TextMeasurer) -> Dimension {
        self.show_title = false;
        self.show_label = false;
        self.show_tick = false;
        self.show_axis_line = false;
        self.title_text_height = 0.0;

        let title_dim = if self.config.show_title && !self.title.is_empty() {
            Some(max_text_dimension(
                std::slice::from_ref(&self.title),
                self.config.title_font_size,
                measurer,
            ))
        } else {
            None
        };

        match self.position {
            AxisPosition::Left => {
                let mut available_width = available.width;

                if self.config.show_axis_line && available_width > self.config.axis_line_width {
                    available_width -= self.config.axis_line_width;
                    self.show_axis_line = true;
                }

                if self.config.show_label {
                    let dim = max_text_dimension(
                        &self.tick_labels(),
                        self.config.label_font_size,
                        measurer,
                    );
                    let width_required = dim.width + self.config.label_padding * 2.0;
                    if width_required <= available_width {
                        available_width -= width_required;
                        self.show_label = true;
                    }
                }

                if self.config.show_tick && available_width >= self.config.tick_length {
                    self.show_tick = true;
                    available_width -= self.config.tick_length;
                }

                if let Some(dim) = title_dim {
                    // Rotated 270 degrees: the text height consumes width.
                    let width_required = dim.height + self.config.title_padding * 2.0;
                    self.title_text_height = dim.height;
                    if width_required <= available_width {
                        available_width -= width_required;
                        self.show_title = true;
                    }
                }

                self.bounding_rect.width = available.width - available_width;
                self.bounding_rect.height = available.height;
            }
            AxisPosition::Bottom => {
                let mut available_height = available.height;

                if self.config.show_axis_line && available_height > self.config.axis_line_width {
                    available_height -= self.config.axis_line_width;
                    self.show_axis_line = true;
                }

                if self.config.show_label {
                    let dim = max_text_dimension(
                        &self.tick_labels(),
                        self.config.label_font_size,
                        measurer,
                    );
                    let height_required = dim.height + self.config.label_padding * 2.0;
                    if height_required <= available_height {
                        available_height -= height_required;
                        self.show_label = true;
                    }
                }

                if self.config.show_tick && available_height >= self.config.tick_length {
                    self.show_tick = true;
                    available_height -= self.config.tick_length;
                }

                if let Some(dim) = title_dim {
                    let height_required = dim.height + self.config.title_padding * 2.0;
                    self.title_text_height = dim.height;
                    if height_required <= available_height {
                        available_height -= height_required;
                        self.show_title = true;
                    }
                }

                self.bounding_rect.width = available.width;
                self.bounding_rect.height = available.height - available_height;
            }
        }

        Dimension {
            width: self.bounding_rect.width,
            height: self.bounding_rect.height,
        }
    }

    /// Forces the left axis to a given width so stacked panels share one plot x-range.
    pub fn set_width(&mut self, width: f64) {
        self.bounding_rect.width = width;
    }

    fn groups(&self, leaf: &str) -> Vec<String> {
        let mut out = self.group.clone();
        out.push(leaf.to_string());
        out
    }

    fn path(&self, path: String, stroke: &str, width: f64) -> PathData {
        PathData {
            path,
            fill: None,
            stroke_fill: stroke.to_string(),
            stroke_width: width,
            line_style: LineStyle::Solid,
            arrow_end: false,
        }
    }

    pub fn drawable_elements(&self) -> Vec<DrawableElem> {
        match self.position {
            AxisPosition::Left => self.drawable_elements_for_left_axis(),
            AxisPosition::Bottom => self.drawable_elements_for_bottom_axis(),
        }
    }

    fn drawable_elements_for_left_axis(&self) -> Vec<DrawableElem> {
        let mut out = Vec::new();
        let rect = self.bounding_rect;
        let line_w = if self.show_axis_line {
            self.config.axis_line_width
        } else {
            0.0
        };
        let tick_len = if self.show_tick {
            self.config.tick_length
        } else {
            0.0
        };

        if self.show_axis_line {
            let x = fmt_pt(rect.x + rect.width - self.config.axis_line_width / 2.0);
            out.push(DrawableElem::Path {
                group_texts: self.groups("axis-line"),
                data: vec![self.path(
                    format!(
                        "M {x},{} L {x},{}",
                        fmt_pt(rect.y),
                        fmt_pt(rect.y + rect.height)
                    ),
                    &self.theme.axis_line_color,
                    self.config.axis_line_width,
                )],
            });
        }
        if self.show_label {
            let x = rect.x + rect.width - self.config.label_padding - tick_len - line_w;
            out.push(DrawableElem::Text {
                group_texts: self.groups("label"),
                data: self
                    .tick_values()
                    .into_iter()
                    .map(|v| TextData {
                        text: format_tick(v),
                        x,
                        y: self.scale(v),
                        fill: self.theme.label_color.clone(),
                        font_size: self.config.label_font_size,
                        rotation: 0.0,
                        vertical_pos: "middle".to_string(),
                        horizontal_pos: "right".to_string(),
                    })
                    .collect(),
            });
        }
        if self.show_tick {
            let x = rect.x + rect.width - line_w;
            out.push(DrawableElem::Path {
                group_texts: self.groups("ticks"),
                data: self
                    .tick_values()
                    .into_iter()
                    .map(|v| {
                        let y = fmt_pt(self.scale(v));
                        self.path(
                            format!(
                                "M {},{y} L {},{y}",
                                fmt_pt(x),
                                fmt_pt(x - self.config.tick_length)
                            ),
                            &self.theme.tick_color,
                            self.config.tick_width,
                        )
                    })
                    .collect(),
            });
        }
        if self.show_title {
            out.push(DrawableElem::Text {
                group_texts: self.groups("title"),
                data: vec![TextData {
                    text: self.title.clone(),
                    x: rect.x + self.config.title_padding,
                    y: rect.y + rect.height / 2.0,
                    fill: self.theme.title_color.clone(),
                    font_size: self.config.title_font_size,
                    rotation: 270.0,
                    vertical_pos: "top".to_string(),
                    horizontal_pos: "center".to_string(),
                }],
            });
        }
        out
    }

    fn drawable_elements_for_bottom_axis(&self) -> Vec<DrawableElem> {
        let mut out = Vec::new();
        let rect = self.bounding_rect;
        let line_w = if self.show_axis_line {
            self.config.axis_line_width
        } else {
            0.0
        };
        let tick_len = if self.show_tick {
            self.config.tick_length
        } else {
            0.0
        };

        if self.show_axis_line {
            let y = fmt_pt(rect.y + self.config.axis_line_width / 2.0);
            out.push(DrawableElem::Path {
                group_texts: self.groups("axis-line"),
                data: vec![self.path(
                    format!(
                        "M {},{y} L {},{y}",
                        fmt_pt(rect.x),
                        fmt_pt(rect.x + rect.width)
                    ),
                    &self.theme.axis_line_color,
                    self.config.axis_line_width,
                )],
            });
        }
        if self.show_label {
            let y = rect.y + self.config.label_padding + tick_len + line_w;
            out.push(DrawableElem::Text {
                group_texts: self.groups("label"),
                data: self
                    .tick_values()
                    .into_iter()
                    .map(|v| TextData {
                        text: format_tick(v),
                        x: self.scale(v),
                        y,
                        fill: self.theme.label_color.clone(),
                        font_size: self.config.label_font_size,
                        rotation: 0.0,
                        vertical_pos: "top".to_string(),
                        horizontal_pos: "center".to_string(),
                    })
                    .collect(),
            });
        }
        if self.show_tick {
            let y = rect.y + line_w;
            out.push(DrawableElem::Path {
                group_texts: self.groups("ticks"),
                data: self
                    .tick_values()
                    .into_iter()
                    .map(|v| {
                        let x = fmt_pt(self.scale(v));
                        self.path(
                            format!(
                                "M {x},{} L {x},{}",
                                fmt_pt(y),
                                fmt_pt(y + self.config.tick_length)
                            ),
                            &self.theme.tick_color,
                            self.config.tick_width,
                        )
                    })
                    .collect(),
            });
        }
        if self.show_title {
            out.push(DrawableElem::Text {
                group_texts: self.groups("title"),
                data: vec![TextData {
                    text: self.title.clone(),
                    x: self.range.0 + (self.range.1 - self.range.0) / 2.0,
                    y: rect.y + rect.height - self.config.title_padding - self.title_text_height,
                    fill: self.theme.title_color.clone(),
                    font_size: self.config.title_font_size,
                    rotation: 0.0,
                    vertical_pos: "top".to_string(),
                    horizontal_pos: "center".to_string(),
                }],
            });
        }
        out
    }
}
