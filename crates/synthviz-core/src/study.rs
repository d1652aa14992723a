use crate::panel::{Panel, PanelSelection};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The precomputed output of a synthetic-control analysis.
///
/// Every series is indexed by period and must have one entry per value of `time`. The renderer
/// only reads these arrays; estimation happens in the host analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticControlStudy {
    #[serde(alias = "outcomeVar")]
    pub outcome_var: String,
    #[serde(alias = "timeVar")]
    pub time_var: String,
    pub time: Vec<f64>,
    #[serde(alias = "treatedOutcome")]
    pub treated_outcome: Vec<f64>,
    #[serde(alias = "synthOutcome")]
    pub synth_outcome: Vec<f64>,
    /// First treated period, in time-axis units.
    #[serde(alias = "treatmentPeriod")]
    pub treatment_period: f64,
    #[serde(alias = "periodsPreTreatment")]
    pub periods_pre_treatment: usize,
    /// One full outcome series per control (donor) unit.
    #[serde(default, alias = "controlOutcomes")]
    pub control_outcomes: Vec<Vec<f64>>,
    /// Synthetic outcome of each control unit when it is treated as the treated unit.
    #[serde(default, alias = "inSpacePlacebos")]
    pub in_space_placebos: Option<Vec<Vec<f64>>>,
}

impl SyntheticControlStudy {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn periods_all(&self) -> usize {
        self.time.len()
    }

    pub fn n_controls(&self) -> usize {
        self.control_outcomes.len()
    }

    /// Where the treatment marker is drawn on the time axis.
    pub fn treatment_marker(&self) -> f64 {
        self.treatment_period - 1.0
    }

    pub fn last_pre_treatment_outcome(&self) -> Option<f64> {
        let idx = self.periods_pre_treatment.checked_sub(1)?;
        self.treated_outcome.get(idx).copied()
    }

    pub fn validate(&self) -> Result<()> {
        if self.time.is_empty() {
            return Err(Error::EmptySeries {
                name: "time".to_string(),
            });
        }
        let periods_all = self.periods_all();

        check_series("time", &self.time, periods_all)?;
        if let Some(index) = self.time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::TimeNotIncreasing { index: index + 1 });
        }
        check_series("treated_outcome", &self.treated_outcome, periods_all)?;
        check_series("synth_outcome", &self.synth_outcome, periods_all)?;
        for (i, s) in self.control_outcomes.iter().enumerate() {
            check_series(&format!("control_outcomes[{i}]"), s, periods_all)?;
        }

        if self.periods_pre_treatment == 0 || self.periods_pre_treatment > periods_all {
            return Err(Error::PreTreatmentOutOfRange {
                periods_pre_treatment: self.periods_pre_treatment,
                periods_all,
            });
        }
        if !self.treatment_period.is_finite() {
            return Err(Error::NonFiniteValue {
                name: "treatment_period".to_string(),
                index: 0,
            });
        }

        if let Some(placebos) = &self.in_space_placebos {
            if placebos.len() != self.n_controls() {
                return Err(Error::PlaceboCountMismatch {
                    controls: self.n_controls(),
                    placebos: placebos.len(),
                });
            }
            for (i, s) in placebos.iter().enumerate() {
                check_series(&format!("in_space_placebos[{i}]"), s, periods_all)?;
            }
        }

        Ok(())
    }

    /// Validates the study against the data each requested panel reads.
    pub fn validate_for(&self, panels: &PanelSelection) -> Result<()> {
        self.validate()?;
        if panels.contains(Panel::InSpacePlacebo) && self.in_space_placebos.is_none() {
            return Err(Error::PlaceboMissing);
        }
        Ok(())
    }
}

fn check_series(name: &str, values: &[f64], expected: usize) -> Result<()> {
    if values.is_empty() {
        return Err(Error::EmptySeries {
            name: name.to_string(),
        });
    }
    if values.len() != expected {
        return Err(Error::LengthMismatch {
            name: name.to_string(),
            expected,
            actual: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(Error::NonFiniteValue {
            name: name.to_string(),
            index,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_study() -> SyntheticControlStudy {
        SyntheticControlStudy {
            outcome_var: "gdpcap".to_string(),
            time_var: "year".to_string(),
            time: vec![2000.0, 2001.0, 2002.0, 2003.0, 2004.0],
            treated_outcome: vec![1.0, 2.0, 3.0, 5.0, 8.0],
            synth_outcome: vec![1.0, 2.5, 2.5, 4.0, 6.0],
            treatment_period: 2003.0,
            periods_pre_treatment: 3,
            control_outcomes: vec![
                vec![1.0, 1.0, 1.0, 1.0, 1.0],
                vec![2.0, 2.0, 2.0, 2.0, 2.0],
            ],
            in_space_placebos: Some(vec![
                vec![1.5, 0.5, 1.0, 2.0, 0.0],
                vec![2.0, 2.0, 2.5, 1.0, 3.0],
            ]),
        }
    }

    #[test]
    fn sample_is_valid() {
        let study = sample_study();
        study.validate().unwrap();
        assert_eq!(study.periods_all(), 5);
        assert_eq!(study.n_controls(), 2);
        assert_eq!(study.last_pre_treatment_outcome(), Some(3.0));
        assert_eq!(study.treatment_marker(), 2002.0);
    }

    #[test]
    fn rejects_unordered_or_repeated_periods() {
        let mut study = sample_study();
        study.time = vec![2000.0, 2001.0, 2003.0, 2002.0, 2004.0];
        assert!(matches!(
            study.validate().unwrap_err(),
            Error::TimeNotIncreasing { index: 3 }
        ));

        study.time = vec![2000.0, 2001.0, 2001.0, 2002.0, 2003.0];
        assert!(matches!(
            study.validate().unwrap_err(),
            Error::TimeNotIncreasing { index: 2 }
        ));
    }

    #[test]
    fn rejects_misaligned_series() {
        let mut study = sample_study();
        study.synth_outcome.pop();
        let err = study.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch { ref name, expected: 5, actual: 4 } if name == "synth_outcome"
        ));
    }

    #[test]
    fn rejects_empty_time_axis() {
        let mut study = sample_study();
        study.time.clear();
        assert!(matches!(study.validate(), Err(Error::EmptySeries { .. })));
    }

    #[test]
    fn rejects_pre_treatment_out_of_range() {
        let mut study = sample_study();
        study.periods_pre_treatment = 0;
        assert!(matches!(
            study.validate(),
            Err(Error::PreTreatmentOutOfRange { .. })
        ));
        study.periods_pre_treatment = 6;
        assert!(matches!(
            study.validate(),
            Err(Error::PreTreatmentOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_placebo_count_mismatch() {
        let mut study = sample_study();
        if let Some(p) = study.in_space_placebos.as_mut() {
            p.pop();
        }
        assert!(matches!(
            study.validate(),
            Err(Error::PlaceboCountMismatch {
                controls: 2,
                placebos: 1
            })
        ));
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut study = sample_study();
        study.treated_outcome[2] = f64::NAN;
        assert!(matches!(
            study.validate(),
            Err(Error::NonFiniteValue { index: 2, .. })
        ));
    }

    #[test]
    fn placebo_panel_requires_placebos() {
        let mut study = sample_study();
        study.in_space_placebos = None;
        study.validate().unwrap();
        let panels = PanelSelection::parse(&["original", "in-space placebo"]).unwrap();
        assert!(matches!(
            study.validate_for(&panels),
            Err(Error::PlaceboMissing)
        ));
        let panels = PanelSelection::parse(&["original"]).unwrap();
        study.validate_for(&panels).unwrap();
    }

    #[test]
    fn deserializes_camel_case_keys() {
        let study = SyntheticControlStudy::from_json_str(
            r#"{
                "outcomeVar": "y",
                "timeVar": "t",
                "time": [1, 2],
                "treatedOutcome": [1, 2],
                "synthOutcome": [1, 1],
                "treatmentPeriod": 2,
                "periodsPreTreatment": 1
            }"#,
        )
        .unwrap();
        assert_eq!(study.outcome_var, "y");
        assert!(study.control_outcomes.is_empty());
        assert!(study.in_space_placebos.is_none());
        study.validate().unwrap();
    }
}
