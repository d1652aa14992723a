#![forbid(unsafe_code)]

//! `synthviz` draws the diagnostic figure of a synthetic-control study: treated versus
//! synthetic outcomes, pointwise and cumulative effects, and the in-space placebo overlay.
//!
//! The study itself (weights, synthetic outcomes, placebo runs) is computed elsewhere; this
//! crate only validates and plots it.
//!
//! # Features
//!
//! - `render`: enable layout + SVG rendering (`synthviz::render`)
//! - `raster`: enable PNG/JPG/PDF output via pure-Rust SVG rasterization/conversion

pub use synthviz_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use synthviz_render::model::FigureLayout;
    pub use synthviz_render::svg::SvgRenderOptions;
    pub use synthviz_render::text::{DeterministicTextMeasurer, TextMeasurer};
    pub use synthviz_render::{LayoutOptions, layout_study};

    use synthviz_core::{PlotConfig, PlotRequest, SyntheticControlStudy};

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Study(#[from] synthviz_core::Error),
        #[error(transparent)]
        Render(#[from] synthviz_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token.
    ///
    /// Marker ids and the embedded CSS are scoped by the root id, so figures inlined in one
    /// document need distinct, valid ids. Unsupported characters become `-`, and ids that do
    /// not start with an ASCII letter get an `s-` prefix.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return "s-untitled".to_string();
        }

        let mut out = String::with_capacity(raw.len() + 4);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }

        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() {
            return "s-untitled".to_string();
        }
        if out.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.to_string()
        } else {
            format!("s-{out}")
        }
    }

    /// Lays out and serializes a study in one call.
    pub fn render_svg(
        study: &SyntheticControlStudy,
        request: &PlotRequest,
        config: &PlotConfig,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<String> {
        let layout = layout_study(study, request, config, layout_options)?;
        let svg_options = SvgRenderOptions {
            figure_id: svg_options.figure_id.as_deref().map(sanitize_svg_id),
        };
        Ok(synthviz_render::svg::render_figure_svg(
            &layout,
            &svg_options,
        )?)
    }

    /// Bundles the per-call options for repeated headless renders.
    #[derive(Clone, Default)]
    pub struct HeadlessRenderer {
        pub config: PlotConfig,
        pub layout: LayoutOptions,
        pub svg: SvgRenderOptions,
    }

    impl HeadlessRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_config(mut self, config: PlotConfig) -> Self {
            self.config = config;
            self
        }

        pub fn with_figure_id(mut self, id: impl Into<String>) -> Self {
            self.svg.figure_id = Some(id.into());
            self
        }

        pub fn layout_sync(
            &self,
            study: &SyntheticControlStudy,
            request: &PlotRequest,
        ) -> Result<FigureLayout> {
            Ok(layout_study(study, request, &self.config, &self.layout)?)
        }

        pub fn render_svg_sync(
            &self,
            study: &SyntheticControlStudy,
            request: &PlotRequest,
        ) -> Result<String> {
            render_svg(study, request, &self.config, &self.layout, &self.svg)
        }

        /// Parses a study JSON document and renders it.
        pub fn render_json_sync(&self, study_json: &str, request: &PlotRequest) -> Result<String> {
            let study = SyntheticControlStudy::from_json_str(study_json)?;
            self.render_svg_sync(&study, request)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sanitize_svg_id_replaces_unsupported_characters() {
            assert_eq!(sanitize_svg_id("  basque country "), "basque-country");
            assert_eq!(sanitize_svg_id("1970"), "s-1970");
            assert_eq!(sanitize_svg_id("a<>b"), "a-b");
            assert_eq!(sanitize_svg_id("---"), "s-untitled");
            assert_eq!(sanitize_svg_id("s"), "s");
            assert_eq!(sanitize_svg_id("-_x"), "s-_x");
            assert_eq!(sanitize_svg_id(""), "s-untitled");
        }

        #[test]
        fn renderer_applies_sanitized_figure_id() {
            let study = SyntheticControlStudy {
                outcome_var: "gdp".to_string(),
                time_var: "year".to_string(),
                time: vec![2000.0, 2001.0, 2002.0, 2003.0],
                treated_outcome: vec![1.0, 2.0, 3.0, 5.0],
                synth_outcome: vec![1.0, 2.0, 3.0, 3.5],
                treatment_period: 2002.0,
                periods_pre_treatment: 2,
                control_outcomes: vec![vec![1.0; 4]],
                in_space_placebos: None,
            };
            let request = PlotRequest::with_panels(&["original", "cumulative"]).unwrap();
            let svg = HeadlessRenderer::new()
                .with_figure_id("my figure")
                .render_svg_sync(&study, &request)
                .unwrap();
            assert!(svg.starts_with(r#"<svg id="my-figure""#));
        }

        #[test]
        fn placebo_panel_error_surfaces_through_facade() {
            let study = SyntheticControlStudy {
                outcome_var: "gdp".to_string(),
                time_var: "year".to_string(),
                time: vec![1.0, 2.0],
                treated_outcome: vec![1.0, 2.0],
                synth_outcome: vec![1.0, 2.0],
                treatment_period: 2.0,
                periods_pre_treatment: 1,
                control_outcomes: Vec::new(),
                in_space_placebos: None,
            };
            let err = HeadlessRenderer::new()
                .render_svg_sync(&study, &PlotRequest::default())
                .unwrap_err();
            assert!(err.to_string().contains("placebo"));
        }

        #[test]
        fn malformed_study_json_is_a_study_error() {
            let err = HeadlessRenderer::new()
                .render_json_sync("{\"time\": []}", &PlotRequest::default())
                .unwrap_err();
            assert!(matches!(err, HeadlessError::Study(_)));
        }
    }
}
