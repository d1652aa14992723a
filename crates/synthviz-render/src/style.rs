use crate::axis::{AxisConfig, AxisTheme};
use synthviz_core::{PlotConfig, PlotRequest};

/// Matplotlib's single-letter and gray-level colors used by the reference figure.
pub(crate) const BLUE: &str = "#0000ff";
pub(crate) const RED: &str = "#ff0000";
pub(crate) const BLACK: &str = "#000000";
pub(crate) const GRAY: &str = "#808080";
pub(crate) const LIGHT_GRAY: &str = "#b3b3b3";

const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone)]
pub(crate) struct SeriesColors {
    pub treated: String,
    pub synthetic: String,
    pub placebo: String,
    pub zero: String,
    pub placebo_zero: String,
    pub treatment: String,
}

/// Resolved styling for one figure: config values with defaults filled in, in pixels.
#[derive(Debug, Clone)]
pub(crate) struct FigureStyle {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
    pub font_family: String,
    pub font_size: f64,
    pub title_font_size: f64,
    pub tick_font_size: f64,
    pub pad: f64,
    pub line_width: f64,
    pub placebo_line_width: f64,
    pub background: String,
    pub text_color: String,
    pub colors: SeriesColors,
    pub show_legend: bool,
    pub annotation_text: String,
    pub annotation_offset: (f64, f64),
    pub plot_reserved_space_percent: f64,
    pub tick_count: usize,
}

impl FigureStyle {
    pub fn resolve(request: &PlotRequest, config: &PlotConfig) -> Self {
        let dpi = config.get_f64("dpi").filter(|v| *v > 0.0).unwrap_or(100.0);
        let px = |points: f64| points * dpi / POINTS_PER_INCH;

        let font_size = config.get_f64("fontSize").unwrap_or_else(|| px(10.0));
        let color = |key: &str, fallback: &str| {
            config
                .get_str(&format!("colors.{key}"))
                .unwrap_or(fallback)
                .to_string()
        };

        // Offsets are given in points; y grows downwards in SVG.
        let offset = config
            .get_f64("annotation.offsetX")
            .zip(config.get_f64("annotation.offsetY"))
            .unwrap_or((-80.0, -4.0));

        Self {
            width: (request.figsize.width * dpi).round(),
            height: (request.figsize.height * dpi).round(),
            dpi,
            font_family: config
                .get_str("fontFamily")
                .unwrap_or("DejaVu Sans, Arial, sans-serif")
                .to_string(),
            font_size,
            title_font_size: config
                .get_f64("titleFontSize")
                .unwrap_or(font_size * 1.2),
            tick_font_size: config.get_f64("tickFontSize").unwrap_or(font_size),
            pad: config.get_f64("pad").unwrap_or(3.0) * font_size,
            line_width: config.get_f64("lineWidth").unwrap_or_else(|| px(1.5)),
            placebo_line_width: config
                .get_f64("placeboLineWidth")
                .unwrap_or_else(|| px(1.0)),
            background: config
                .get_str("background")
                .unwrap_or("white")
                .to_string(),
            text_color: color("text", BLACK),
            colors: SeriesColors {
                treated: color("treated", BLUE),
                synthetic: color("synthetic", RED),
                placebo: color("placebo", LIGHT_GRAY),
                zero: color("zero", RED),
                placebo_zero: color("placeboZero", BLACK),
                treatment: color("treatment", GRAY),
            },
            show_legend: config.get_bool("showLegend").unwrap_or(true),
            annotation_text: config
                .get_str("annotation.text")
                .unwrap_or("Treatment")
                .to_string(),
            annotation_offset: (px(offset.0), -px(offset.1)),
            plot_reserved_space_percent: config
                .get_f64("plotReservedSpacePercent")
                .unwrap_or(60.0)
                .clamp(10.0, 100.0),
            tick_count: config
                .get_f64("tickCount")
                .map(|v| v.clamp(1.0, crate::ticks::MAX_TICKS as f64) as usize)
                .unwrap_or(6),
        }
    }

    pub fn axis_config(&self, show_label: bool) -> AxisConfig {
        let dpi_scale = self.dpi / POINTS_PER_INCH;
        AxisConfig {
            show_label,
            label_font_size: self.tick_font_size,
            label_padding: 3.5 * dpi_scale,
            show_title: true,
            title_font_size: self.font_size,
            title_padding: 4.0 * dpi_scale,
            show_tick: true,
            tick_length: 3.5 * dpi_scale,
            tick_width: 0.8 * dpi_scale,
            show_axis_line: true,
            axis_line_width: 0.8 * dpi_scale,
            tick_count: self.tick_count,
        }
    }

    pub fn axis_theme(&self) -> AxisTheme {
        AxisTheme {
            title_color: self.text_color.clone(),
            label_color: self.text_color.clone(),
            tick_color: self.text_color.clone(),
            axis_line_color: self.text_color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synthviz_core::FigureSize;

    #[test]
    fn defaults_follow_figsize_and_dpi() {
        let style = FigureStyle::resolve(&PlotRequest::default(), &PlotConfig::default());
        assert_eq!(style.width, 1500.0);
        assert_eq!(style.height, 1200.0);
        assert_eq!(style.colors.treated, BLUE);
        assert_eq!(style.colors.synthetic, RED);
        assert_eq!(style.annotation_text, "Treatment");
        assert!((style.pad - 3.0 * style.font_size).abs() < 1e-9);
    }

    #[test]
    fn config_overrides_defaults() {
        let request = PlotRequest {
            figsize: FigureSize::new(4.0, 3.0).unwrap(),
            ..PlotRequest::default()
        };
        let config = PlotConfig::from_value(json!({
            "dpi": 50,
            "fontSize": 9,
            "colors": {"treated": "#112233"},
            "showLegend": false
        }));
        let style = FigureStyle::resolve(&request, &config);
        assert_eq!(style.width, 200.0);
        assert_eq!(style.height, 150.0);
        assert_eq!(style.font_size, 9.0);
        assert_eq!(style.colors.treated, "#112233");
        assert_eq!(style.colors.zero, RED);
        assert!(!style.show_legend);
    }

    #[test]
    fn tick_count_is_clamped() {
        let resolve = |v: serde_json::Value| {
            FigureStyle::resolve(
                &PlotRequest::default(),
                &PlotConfig::from_value(json!({ "tickCount": v })),
            )
            .tick_count
        };
        assert_eq!(resolve(json!(1e13)), crate::ticks::MAX_TICKS);
        assert_eq!(resolve(json!(0)), 1);
        assert_eq!(resolve(json!(8)), 8);
    }

    #[test]
    fn annotation_offset_converts_points_to_pixels() {
        let config = PlotConfig::from_value(json!({"dpi": 72}));
        let style = FigureStyle::resolve(&PlotRequest::default(), &config);
        assert_eq!(style.annotation_offset, (-80.0, 4.0));
    }
}
