use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use synthviz::render::{LayoutOptions, SvgRenderOptions, layout_study, render_svg};
use synthviz::{EffectSeries, PlotConfig, PlotRequest, SyntheticControlStudy};

fn study(periods: usize, controls: usize) -> SyntheticControlStudy {
    let time: Vec<f64> = (0..periods).map(|i| 1950.0 + i as f64).collect();
    let series = |phase: f64| -> Vec<f64> {
        (0..periods)
            .map(|i| 4.0 + 0.08 * i as f64 + 0.05 * (i as f64 + phase).sin())
            .collect()
    };
    let control_outcomes: Vec<Vec<f64>> = (0..controls).map(|k| series(k as f64)).collect();
    let in_space_placebos = control_outcomes
        .iter()
        .map(|c| c.iter().map(|v| v * 0.98).collect())
        .collect();
    SyntheticControlStudy {
        outcome_var: "gdpcap".to_string(),
        time_var: "year".to_string(),
        treated_outcome: series(0.3),
        synth_outcome: series(0.1),
        treatment_period: time[periods / 2],
        periods_pre_treatment: periods / 2,
        time,
        control_outcomes,
        in_space_placebos: Some(in_space_placebos),
    }
}

fn fixtures() -> Vec<(&'static str, SyntheticControlStudy)> {
    vec![
        ("basque_sized", study(43, 16)),
        ("long_panel", study(400, 16)),
        ("many_donors", study(43, 200)),
    ]
}

fn bench_render_svg(c: &mut Criterion) {
    let request = PlotRequest::default();
    let config = PlotConfig::default();
    let layout = LayoutOptions::default();

    let mut group = c.benchmark_group("render_svg");
    for (name, study) in fixtures() {
        let svg_opts = SvgRenderOptions {
            figure_id: Some(name.to_string()),
        };
        group.bench_function(name, |b| {
            b.iter_batched(
                || &study,
                |study| {
                    let _svg = render_svg(study, &request, &config, &layout, &svg_opts).unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_layout_only(c: &mut Criterion) {
    let request = PlotRequest::default();
    let config = PlotConfig::default();
    let layout = LayoutOptions::default();

    let mut group = c.benchmark_group("layout_only");
    for (name, study) in fixtures() {
        group.bench_function(name, |b| {
            b.iter(|| {
                let _ = layout_study(black_box(&study), &request, &config, &layout).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_effects_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("effects_only");
    for (name, study) in fixtures() {
        group.bench_function(name, |b| {
            b.iter(|| {
                let _ = EffectSeries::compute(black_box(&study)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_render_svg,
    bench_layout_only,
    bench_effects_only
);
criterion_main!(benches);
