use crate::Result;
use crate::axis::{Axis, AxisPosition, BoundingRect, Dimension};
use crate::model::{
    DrawableElem, FigureLayout, LineStyle, PanelLayout, PathData, RectData, TextData, fmt_pt,
};
use crate::panels::{PanelSpec, build_panel_specs};
use crate::style::FigureStyle;
use crate::text::{TextMeasurer, TextStyle};
use synthviz_core::{EffectSeries, PlotConfig, PlotRequest, SyntheticControlStudy};

/// Fraction of the time span added on both sides of the shared x domain.
const X_MARGIN: f64 = 0.05;

fn line_path(points: &[(f64, f64)]) -> Option<String> {
    let (first, rest) = points.split_first()?;
    let mut out = format!("M{},{}", fmt_pt(first.0), fmt_pt(first.1));
    if rest.is_empty() {
        out.push('Z');
        return Some(out);
    }
    for p in rest {
        out.push_str(&format!("L{},{}", fmt_pt(p.0), fmt_pt(p.1)));
    }
    Some(out)
}

fn x_domain(study: &SyntheticControlStudy) -> (f64, f64) {
    let marker = study.treatment_marker();
    let (lo, hi) = study
        .time
        .iter()
        .chain(std::iter::once(&marker))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(*t), hi.max(*t))
        });
    let span = hi - lo;
    if span <= 0.0 {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - X_MARGIN * span, hi + X_MARGIN * span)
}

struct PanelAxes {
    slot: BoundingRect,
    title_height: f64,
    x_axis: Axis,
    y_axis: Axis,
    x_axis_height: f64,
    y_axis_width: f64,
}

/// Lays out every requested panel of a synthetic-control figure.
///
/// Panels are stacked top to bottom in drawing order, share one x domain and one plot x-range,
/// and only the bottom panel carries x tick labels.
pub fn layout_figure(
    study: &SyntheticControlStudy,
    request: &PlotRequest,
    config: &PlotConfig,
    measurer: &dyn TextMeasurer,
) -> Result<FigureLayout> {
    study.validate_for(&request.panels)?;
    let effects = EffectSeries::compute(study)?;
    let style = FigureStyle::resolve(request, config);
    let specs = build_panel_specs(study, &effects, request, &style)?;

    let x_domain = x_domain(study);
    let n = specs.len().max(1) as f64;
    let pad = style.pad.min(style.width / 4.0).min(style.height / 4.0);
    let gap = pad / 2.0;
    let content_width = (style.width - 2.0 * pad).max(1.0);
    let slot_height = ((style.height - 2.0 * pad - gap * (n - 1.0)) / n).max(1.0);

    let title_style = TextStyle {
        font_size: style.title_font_size,
        ..Default::default()
    };
    let title_padding = 0.5 * style.font_size;

    let mut axes: Vec<PanelAxes> = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let slot = BoundingRect {
            x: pad,
            y: pad + i as f64 * (slot_height + gap),
            width: content_width,
            height: slot_height,
        };
        let title_height = measurer.measure(&spec.title, &title_style).height + 2.0 * title_padding;
        let region_height = (slot.height - title_height).max(0.0);

        let panel_group = format!("panel-{i}");
        let show_x_labels = request.panels.is_last(spec.panel);
        let mut x_axis = Axis::new(
            x_domain,
            style.axis_config(show_x_labels),
            style.axis_theme(),
            AxisPosition::Bottom,
            study.time_var.clone(),
            vec![panel_group.clone(), "x-axis".to_string()],
        );
        let mut y_axis = Axis::new(
            spec.y_domain,
            style.axis_config(true),
            style.axis_theme(),
            AxisPosition::Left,
            study.outcome_var.clone(),
            vec![panel_group, "y-axis".to_string()],
        );

        let reserved = style.plot_reserved_space_percent / 100.0;
        let available_width = slot.width - (slot.width * reserved).floor();
        let mut available_height = region_height - (region_height * reserved).floor();

        let x_used = x_axis.calculate_space(
            Dimension {
                width: available_width,
                height: available_height,
            },
            measurer,
        );
        available_height = (available_height - x_used.height).max(0.0);
        let y_used = y_axis.calculate_space(
            Dimension {
                width: available_width,
                height: available_height,
            },
            measurer,
        );

        axes.push(PanelAxes {
            slot,
            title_height,
            x_axis,
            y_axis,
            x_axis_height: x_used.height,
            y_axis_width: y_used.width,
        });
    }

    let y_axis_width = axes.iter().fold(0.0_f64, |m, a| m.max(a.y_axis_width));
    let plot_x = pad + y_axis_width;
    let plot_width = (content_width - y_axis_width).max(1.0);

    let mut panels = Vec::with_capacity(specs.len());
    let mut drawables = Vec::new();
    for (i, (spec, mut ax)) in specs.iter().zip(axes).enumerate() {
        let plot_y = ax.slot.y + ax.title_height;
        let plot_height = (ax.slot.height - ax.title_height - ax.x_axis_height).max(1.0);
        let plot = BoundingRect {
            x: plot_x,
            y: plot_y,
            width: plot_width,
            height: plot_height,
        };

        ax.x_axis.set_range((plot.x, plot.x + plot.width));
        ax.x_axis.set_origin(plot.x, plot.y + plot.height);
        ax.y_axis.set_range((plot.y, plot.y + plot.height));
        ax.y_axis.set_origin(pad, plot.y);
        ax.y_axis.set_width(y_axis_width);

        let group = format!("panel-{i}");
        let ctx = PanelCtx {
            group: &group,
            plot,
            x_axis: &ax.x_axis,
            y_axis: &ax.y_axis,
            style: &style,
            measurer,
        };

        drawables.push(ctx.frame());
        drawables.extend(ctx.series(spec, &study.time));
        drawables.push(ctx.treatment_line(study.treatment_marker()));
        if let Some((ax_x, ax_y)) = spec.annotation {
            drawables.extend(ctx.annotation(ax_x, ax_y));
        }
        drawables.extend(ax.x_axis.drawable_elements());
        drawables.extend(ax.y_axis.drawable_elements());
        drawables.push(DrawableElem::Text {
            group_texts: vec![group.clone(), "title".to_string()],
            data: vec![TextData {
                text: spec.title.clone(),
                x: plot.x + plot.width / 2.0,
                y: ax.slot.y + ax.title_height / 2.0,
                fill: style.text_color.clone(),
                font_size: style.title_font_size,
                rotation: 0.0,
                vertical_pos: "middle".to_string(),
                horizontal_pos: "center".to_string(),
            }],
        });
        if style.show_legend {
            drawables.extend(ctx.legend(spec));
        }

        panels.push(PanelLayout {
            panel: spec.panel,
            title: spec.title.clone(),
            x: plot.x,
            y: plot.y,
            width: plot.width,
            height: plot.height,
            x_domain,
            y_domain: spec.y_domain,
            show_x_tick_labels: request.panels.is_last(spec.panel),
        });
    }

    tracing::debug!(
        panels = panels.len(),
        width = style.width,
        height = style.height,
        drawables = drawables.len(),
        "laid out synthetic-control figure"
    );

    Ok(FigureLayout {
        width: style.width,
        height: style.height,
        background_color: style.background.clone(),
        font_family: style.font_family.clone(),
        panels,
        drawables,
    })
}

struct PanelCtx<'a> {
    group: &'a str,
    plot: BoundingRect,
    x_axis: &'a Axis,
    y_axis: &'a Axis,
    style: &'a FigureStyle,
    measurer: &'a dyn TextMeasurer,
}

impl PanelCtx<'_> {
    fn groups(&self, leaves: &[&str]) -> Vec<String> {
        std::iter::once(self.group)
            .chain(leaves.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn frame(&self) -> DrawableElem {
        DrawableElem::Rect {
            group_texts: self.groups(&["frame"]),
            data: vec![RectData {
                x: self.plot.x,
                y: self.plot.y,
                width: self.plot.width,
                height: self.plot.height,
                fill: "none".to_string(),
                stroke_fill: self.style.text_color.clone(),
                stroke_width: 0.8 * self.style.dpi / 72.0,
            }],
        }
    }

    fn series(&self, spec: &PanelSpec, time: &[f64]) -> Vec<DrawableElem> {
        spec.series
            .iter()
            .filter_map(|s| {
                let points: Vec<(f64, f64)> = time
                    .iter()
                    .zip(&s.values)
                    .map(|(t, v)| (self.x_axis.scale(*t), self.y_axis.scale(*v)))
                    .collect();
                let path = line_path(&points)?;
                Some(DrawableElem::Path {
                    group_texts: self.groups(&["series", s.class.as_str()]),
                    data: vec![PathData {
                        path,
                        fill: None,
                        stroke_fill: s.color.clone(),
                        stroke_width: s.width,
                        line_style: s.line_style,
                        arrow_end: false,
                    }],
                })
            })
            .collect()
    }

    /// Dotted vertical line at the treatment marker, which the shared x domain always covers.
    fn treatment_line(&self, marker: f64) -> DrawableElem {
        let x = fmt_pt(self.x_axis.scale(marker));
        DrawableElem::Path {
            group_texts: self.groups(&["treatment"]),
            data: vec![PathData {
                path: format!(
                    "M{x},{}L{x},{}",
                    fmt_pt(self.plot.y),
                    fmt_pt(self.plot.y + self.plot.height)
                ),
                fill: None,
                stroke_fill: self.style.colors.treatment.clone(),
                stroke_width: self.style.line_width,
                line_style: LineStyle::Dotted,
                arrow_end: false,
            }],
        }
    }

    /// "Treatment" label offset from the anchor, with an arrow pointing back at it.
    ///
    /// Anchors outside the axes' domains are not annotated at all.
    fn annotation(&self, x: f64, y: f64) -> Vec<DrawableElem> {
        if !self.x_axis.contains(x) || !self.y_axis.contains(y) {
            tracing::debug!(
                panel = self.group,
                x,
                y,
                "treatment anchor outside the plot area; annotation not drawn"
            );
            return Vec::new();
        }
        let px = self.x_axis.scale(x);
        let py = self.y_axis.scale(y);
        let (dx, dy) = self.style.annotation_offset;
        let text_x = px + dx;
        let text_y = py + dy;
        let text = &self.style.annotation_text;
        let text_width = self
            .measurer
            .measure(
                text,
                &TextStyle {
                    font_size: self.style.font_size,
                    ..Default::default()
                },
            )
            .width;

        let mut out = vec![DrawableElem::Text {
            group_texts: self.groups(&["annotation", "label"]),
            data: vec![TextData {
                text: text.clone(),
                x: text_x,
                y: text_y,
                fill: self.style.text_color.clone(),
                font_size: self.style.font_size,
                rotation: 0.0,
                vertical_pos: "middle".to_string(),
                horizontal_pos: "left".to_string(),
            }],
        }];

        let gap = 0.25 * self.style.font_size;
        let start_x = text_x + text_width + gap;
        if start_x < px - gap {
            out.push(DrawableElem::Path {
                group_texts: self.groups(&["annotation", "arrow"]),
                data: vec![PathData {
                    path: format!(
                        "M{},{}L{},{}",
                        fmt_pt(start_x),
                        fmt_pt(text_y),
                        fmt_pt(px),
                        fmt_pt(py)
                    ),
                    fill: None,
                    stroke_fill: self.style.text_color.clone(),
                    stroke_width: 0.8 * self.style.dpi / 72.0,
                    line_style: LineStyle::Solid,
                    arrow_end: true,
                }],
            });
        }
        out
    }

    fn legend(&self, spec: &PanelSpec) -> Vec<DrawableElem> {
        let entries: Vec<_> = spec
            .series
            .iter()
            .filter_map(|s| s.label.as_deref().map(|label| (label, s)))
            .collect();
        if entries.is_empty() {
            return Vec::new();
        }

        let fs = self.style.font_size;
        let labels: Vec<String> = entries.iter().map(|(l, _)| l.to_string()).collect();
        let label_dim = crate::axis::max_text_dimension(&labels, fs, self.measurer);
        let row = fs * 1.4;
        let sample = 2.0 * fs;
        let inner = 0.4 * fs;
        let width = inner + sample + 0.8 * fs + label_dim.width + inner;
        let height = entries.len() as f64 * row + 2.0 * inner;
        let x = self.plot.x + self.plot.width - width - 0.5 * fs;
        let y = self.plot.y + 0.5 * fs;

        let mut out = vec![DrawableElem::Rect {
            group_texts: self.groups(&["legend", "box"]),
            data: vec![RectData {
                x,
                y,
                width,
                height,
                fill: self.style.background.clone(),
                stroke_fill: "#cccccc".to_string(),
                stroke_width: 1.0,
            }],
        }];

        let mut samples = Vec::with_capacity(entries.len());
        let mut texts = Vec::with_capacity(entries.len());
        for (k, (label, s)) in entries.iter().enumerate() {
            let cy = y + inner + (k as f64 + 0.5) * row;
            let x0 = x + inner;
            samples.push(PathData {
                path: format!(
                    "M{},{}L{},{}",
                    fmt_pt(x0),
                    fmt_pt(cy),
                    fmt_pt(x0 + sample),
                    fmt_pt(cy)
                ),
                fill: None,
                stroke_fill: s.color.clone(),
                stroke_width: s.width,
                line_style: s.line_style,
                arrow_end: false,
            });
            texts.push(TextData {
                text: label.to_string(),
                x: x0 + sample + 0.8 * fs,
                y: cy,
                fill: self.style.text_color.clone(),
                font_size: fs,
                rotation: 0.0,
                vertical_pos: "middle".to_string(),
                horizontal_pos: "left".to_string(),
            });
        }
        out.push(DrawableElem::Path {
            group_texts: self.groups(&["legend", "sample"]),
            data: samples,
        });
        out.push(DrawableElem::Text {
            group_texts: self.groups(&["legend", "entry"]),
            data: texts,
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_path_rounds_to_three_decimals() {
        assert_eq!(
            line_path(&[(0.0, 1.23456), (2.0, -0.0000000001)]).as_deref(),
            Some("M0,1.235L2,0")
        );
        assert_eq!(line_path(&[(1.0, 1.0)]).as_deref(), Some("M1,1Z"));
        assert!(line_path(&[]).is_none());
    }

    #[test]
    fn x_domain_includes_marker_with_margin() {
        let study = SyntheticControlStudy {
            outcome_var: "y".to_string(),
            time_var: "t".to_string(),
            time: vec![10.0, 20.0],
            treated_outcome: vec![0.0, 0.0],
            synth_outcome: vec![0.0, 0.0],
            treatment_period: 8.0,
            periods_pre_treatment: 1,
            control_outcomes: Vec::new(),
            in_space_placebos: None,
        };
        let (lo, hi) = x_domain(&study);
        assert!((lo - 6.35).abs() < 1e-9);
        assert!((hi - 20.65).abs() < 1e-9);
    }
}
