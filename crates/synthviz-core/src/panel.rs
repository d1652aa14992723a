use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One chart of the diagnostic figure.
///
/// Variants are declared in drawing order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Panel {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "pointwise")]
    Pointwise,
    #[serde(rename = "cumulative")]
    Cumulative,
    #[serde(rename = "in-space placebo")]
    InSpacePlacebo,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Original,
        Panel::Pointwise,
        Panel::Cumulative,
        Panel::InSpacePlacebo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Panel::Original => "original",
            Panel::Pointwise => "pointwise",
            Panel::Cumulative => "cumulative",
            Panel::InSpacePlacebo => "in-space placebo",
        }
    }

    /// Quoted, comma-separated list of every valid panel name.
    pub fn valid_names() -> String {
        Panel::ALL
            .iter()
            .map(|p| format!("\"{}\"", p.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Panel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Panel::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::InvalidPanel {
                panel: s.to_string(),
                valid: Panel::valid_names(),
            })
    }
}

/// A validated, de-duplicated set of panels in drawing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelSelection(Vec<Panel>);

impl Default for PanelSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl PanelSelection {
    pub fn all() -> Self {
        Self(Panel::ALL.to_vec())
    }

    /// Validates every name before accepting any of them.
    ///
    /// Input order does not matter; panels are always drawn original, pointwise, cumulative,
    /// in-space placebo.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut panels = names
            .iter()
            .map(|n| n.as_ref().parse::<Panel>())
            .collect::<Result<Vec<_>>>()?;
        if panels.is_empty() {
            return Err(Error::NoPanels);
        }
        panels.sort();
        panels.dedup();
        Ok(Self(panels))
    }

    pub fn iter(&self) -> impl Iterator<Item = Panel> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, panel: Panel) -> bool {
        self.0.contains(&panel)
    }

    /// True for the bottom panel, the only one that shows x tick labels.
    pub fn is_last(&self, panel: Panel) -> bool {
        self.0.last() == Some(&panel)
    }

    pub fn as_slice(&self) -> &[Panel] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PanelSelection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        PanelSelection::parse(names.as_slice()).map_err(serde::de::Error::custom)
    }
}
