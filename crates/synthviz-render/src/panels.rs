use crate::model::LineStyle;
use crate::style::FigureStyle;
use synthviz_core::effects::max_abs;
use synthviz_core::{EffectSeries, Error, Panel, PlotRequest, Result, SyntheticControlStudy};

/// Fraction of the data span added above and below auto-scaled y domains.
const Y_MARGIN: f64 = 0.05;

#[derive(Debug, Clone)]
pub(crate) struct SeriesSpec {
    pub label: Option<String>,
    pub values: Vec<f64>,
    pub color: String,
    pub line_style: LineStyle,
    pub width: f64,
    pub class: String,
}

/// Everything needed to draw one panel, independent of where it lands on the figure.
#[derive(Debug, Clone)]
pub(crate) struct PanelSpec {
    pub panel: Panel,
    pub title: String,
    pub series: Vec<SeriesSpec>,
    pub y_domain: (f64, f64),
    /// Data-space point the "Treatment" arrow points at.
    pub annotation: Option<(f64, f64)>,
}

pub(crate) fn build_panel_specs(
    study: &SyntheticControlStudy,
    effects: &EffectSeries,
    request: &PlotRequest,
    style: &FigureStyle,
) -> Result<Vec<PanelSpec>> {
    let marker = study.treatment_marker();
    let zeros = vec![0.0; study.periods_all()];

    let treated_label = Some(request.treated_label.as_str());
    let synth_label = Some(request.synth_label.as_str());
    let width = style.line_width;

    let mut specs = Vec::with_capacity(request.panels.len());
    for panel in request.panels.iter() {
        let spec = match panel {
            Panel::Original => {
                let series = vec![
                    line(
                        synth_label,
                        &study.synth_outcome,
                        &style.colors.synthetic,
                        LineStyle::Dashed,
                        width,
                        "synthetic",
                    ),
                    line(
                        treated_label,
                        &study.treated_outcome,
                        &style.colors.treated,
                        LineStyle::Solid,
                        width,
                        "treated",
                    ),
                ];
                let anchor_y = study
                    .last_pre_treatment_outcome()
                    .map(|v| v * 1.2)
                    .ok_or(Error::PreTreatmentOutOfRange {
                        periods_pre_treatment: study.periods_pre_treatment,
                        periods_all: study.periods_all(),
                    })?;
                PanelSpec {
                    panel,
                    title: format!("{} vs. {}", request.treated_label, request.synth_label),
                    y_domain: auto_domain(&series),
                    series,
                    annotation: Some((marker, anchor_y)),
                }
            }
            Panel::Pointwise => {
                let extreme = effects.max_abs_pointwise;
                let series = vec![
                    line(
                        synth_label,
                        &zeros,
                        &style.colors.zero,
                        LineStyle::Dashed,
                        width,
                        "zero",
                    ),
                    line(
                        treated_label,
                        &effects.pointwise,
                        &style.colors.treated,
                        LineStyle::Solid,
                        width,
                        "treated",
                    ),
                ];
                let y_domain = if extreme > 0.0 {
                    (-1.1 * extreme, 1.1 * extreme)
                } else {
                    auto_domain(&series)
                };
                PanelSpec {
                    panel,
                    title: "Pointwise Effects".to_string(),
                    series,
                    y_domain,
                    annotation: Some((marker, 0.5 * extreme)),
                }
            }
            Panel::Cumulative => {
                let series = vec![
                    line(
                        synth_label,
                        &zeros,
                        &style.colors.zero,
                        LineStyle::Dashed,
                        width,
                        "zero",
                    ),
                    line(
                        treated_label,
                        &effects.cumulative,
                        &style.colors.treated,
                        LineStyle::Solid,
                        width,
                        "treated",
                    ),
                ];
                PanelSpec {
                    panel,
                    title: "Cumulative Effects".to_string(),
                    y_domain: auto_domain(&series),
                    series,
                    annotation: Some((marker, effects.cumulative_total() * 0.3)),
                }
            }
            Panel::InSpacePlacebo => {
                let gaps = effects.placebo_gaps.as_ref().ok_or(Error::PlaceboMissing)?;
                let mut series = Vec::with_capacity(gaps.len() + 2);
                series.push(line(
                    None,
                    &zeros,
                    &style.colors.placebo_zero,
                    LineStyle::Dashed,
                    width,
                    "zero",
                ));
                for gap in gaps {
                    series.push(line(
                        None,
                        gap,
                        &style.colors.placebo,
                        LineStyle::Solid,
                        style.placebo_line_width,
                        "placebo",
                    ));
                }
                // Drawn last so the treated gap sits on top of the placebo cloud.
                series.push(line(
                    treated_label,
                    &effects.pointwise,
                    &style.colors.treated,
                    LineStyle::Solid,
                    width,
                    "treated",
                ));
                PanelSpec {
                    panel,
                    title: "In-space placebo's".to_string(),
                    y_domain: auto_domain(&series),
                    series,
                    annotation: None,
                }
            }
        };
        specs.push(spec);
    }
    Ok(specs)
}

fn line(
    label: Option<&str>,
    values: &[f64],
    color: &str,
    line_style: LineStyle,
    width: f64,
    class: &str,
) -> SeriesSpec {
    SeriesSpec {
        label: label.map(str::to_string),
        values: values.to_vec(),
        color: color.to_string(),
        line_style,
        width,
        class: class.to_string(),
    }
}

/// Data range of every series plus a small margin; flat data gets a unit-wide window.
pub(crate) fn auto_domain(series: &[SeriesSpec]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in series.iter().flat_map(|s| s.values.iter()) {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let span = hi - lo;
    if span <= f64::EPSILON * max_abs(&[lo, hi]).max(1.0) {
        let half = if lo == 0.0 { 1.0 } else { 0.5 * lo.abs() };
        return (lo - half, hi + half);
    }
    (lo - Y_MARGIN * span, hi + Y_MARGIN * span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthviz_core::{PanelSelection, PlotConfig};

    fn study() -> SyntheticControlStudy {
        SyntheticControlStudy {
            outcome_var: "gdp".to_string(),
            time_var: "year".to_string(),
            time: vec![1.0, 2.0, 3.0, 4.0],
            treated_outcome: vec![10.0, 11.0, 14.0, 16.0],
            synth_outcome: vec![10.0, 11.0, 12.0, 12.0],
            treatment_period: 3.0,
            periods_pre_treatment: 2,
            control_outcomes: vec![vec![5.0; 4]],
            in_space_placebos: Some(vec![vec![5.0, 6.0, 4.0, 5.0]]),
        }
    }

    fn specs(panels: &[&str]) -> Vec<PanelSpec> {
        let study = study();
        let request = PlotRequest {
            panels: PanelSelection::parse(panels).unwrap(),
            ..PlotRequest::default()
        };
        let style = FigureStyle::resolve(&request, &PlotConfig::default());
        let effects = EffectSeries::compute(&study).unwrap();
        build_panel_specs(&study, &effects, &request, &style).unwrap()
    }

    #[test]
    fn original_panel_compares_treated_and_synthetic() {
        let spec = &specs(&["original"])[0];
        assert_eq!(spec.title, "Treated Unit vs. Synthetic Control");
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].line_style, LineStyle::Dashed);
        assert_eq!(spec.series[0].label.as_deref(), Some("Synthetic Control"));
        assert_eq!(spec.series[1].label.as_deref(), Some("Treated Unit"));
        // Marker one period before treatment, arrow at 1.2x the last pre-treatment outcome.
        let (ax, ay) = spec.annotation.unwrap();
        assert_eq!(ax, 2.0);
        assert!((ay - 13.2).abs() < 1e-9);
    }

    #[test]
    fn pointwise_panel_is_symmetric_around_zero() {
        let spec = &specs(&["pointwise"])[0];
        assert_eq!(spec.series[1].values, vec![0.0, 0.0, 2.0, 4.0]);
        let (lo, hi) = spec.y_domain;
        assert!((lo + 4.4).abs() < 1e-9 && (hi - 4.4).abs() < 1e-9);
        assert_eq!(spec.annotation, Some((2.0, 2.0)));
    }

    #[test]
    fn cumulative_panel_accumulates_post_treatment_gaps() {
        let spec = &specs(&["cumulative"])[0];
        assert_eq!(spec.series[1].values, vec![0.0, 0.0, 2.0, 6.0]);
        let (_, ay) = spec.annotation.unwrap();
        assert!((ay - 1.8).abs() < 1e-9);
    }

    #[test]
    fn placebo_panel_draws_treated_gap_last() {
        let spec = &specs(&["in-space placebo"])[0];
        assert_eq!(spec.title, "In-space placebo's");
        assert_eq!(spec.series.len(), 3);
        assert!(spec.series[0].label.is_none());
        assert_eq!(spec.series[1].values, vec![0.0, 1.0, -1.0, 0.0]);
        assert_eq!(spec.series[2].class, "treated");
        assert!(spec.annotation.is_none());
    }

    #[test]
    fn flat_series_get_a_non_degenerate_domain() {
        let flat = SeriesSpec {
            label: None,
            values: vec![0.0; 3],
            color: String::new(),
            line_style: LineStyle::Solid,
            width: 1.0,
            class: String::new(),
        };
        assert_eq!(auto_domain(std::slice::from_ref(&flat)), (-1.0, 1.0));
        let mut five = flat.clone();
        five.values = vec![5.0; 3];
        assert_eq!(auto_domain(&[five]), (2.5, 7.5));
    }
}
