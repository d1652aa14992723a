//! Display arithmetic over a finished study: gaps, running sums and extremes.

use crate::study::SyntheticControlStudy;
use crate::Result;
use serde::Serialize;

/// `treated[t] - synth[t]` for every period.
pub fn pointwise(treated: &[f64], synth: &[f64]) -> Vec<f64> {
    treated.iter().zip(synth).map(|(t, s)| t - s).collect()
}

/// Zeros for the pre-treatment periods, then the running sum of the post-treatment gaps.
pub fn cumulative(gaps: &[f64], periods_pre_treatment: usize) -> Vec<f64> {
    let split = periods_pre_treatment.min(gaps.len());
    let mut out = vec![0.0; split];
    out.reserve(gaps.len() - split);
    let mut acc = 0.0;
    for g in &gaps[split..] {
        acc += g;
        out.push(acc);
    }
    out
}

/// Gap between each control unit's placebo synthetic outcome and its own observed outcome.
pub fn placebo_gaps(placebos: &[Vec<f64>], controls: &[Vec<f64>]) -> Vec<Vec<f64>> {
    placebos
        .iter()
        .zip(controls)
        .map(|(placebo, control)| pointwise(placebo, control))
        .collect()
}

pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Every derived series a figure may draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSeries {
    pub time: Vec<f64>,
    pub pointwise: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub max_abs_pointwise: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placebo_gaps: Option<Vec<Vec<f64>>>,
}

impl EffectSeries {
    pub fn compute(study: &SyntheticControlStudy) -> Result<Self> {
        study.validate()?;
        let gaps = pointwise(&study.treated_outcome, &study.synth_outcome);
        let cumulative = cumulative(&gaps, study.periods_pre_treatment);
        let placebo_gaps = study
            .in_space_placebos
            .as_deref()
            .map(|placebos| placebo_gaps(placebos, &study.control_outcomes));
        tracing::debug!(
            periods = gaps.len(),
            placebos = placebo_gaps.as_ref().map_or(0, Vec::len),
            "computed effect series"
        );
        Ok(Self {
            time: study.time.clone(),
            max_abs_pointwise: max_abs(&gaps),
            pointwise: gaps,
            cumulative,
            placebo_gaps,
        })
    }

    pub fn cumulative_total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}
