use serde::Serialize;
use std::fmt;

use crate::results::{Dimension, Measure, SourceAuditResult};

/// Whole percentage of a rate, truncated: `0.289` gives `28`.
pub fn to_percentage(value: f64) -> i64 {
    (value * 100.0).trunc() as i64
}

/// One score of the current audit next to the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    /// `general` or a dimension key.
    pub key: String,
    pub label: String,
    pub value_pct: i64,
    /// Difference with the previous audit, in percentage points.
    pub delta_pts: Option<i64>,
    pub rank: Option<u32>,
}

impl MetricDelta {
    fn new(key: &str, label: &str, current: f64, previous: Option<f64>, rank: Option<u32>) -> Self {
        let value_pct = to_percentage(current);
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value_pct,
            delta_pts: previous.map(|p| value_pct - to_percentage(p)),
            rank,
        }
    }
}

/// Detail rate of a dimension, as a percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPercentage {
    pub dimension: String,
    pub name: String,
    pub value_pct: i64,
}

/// How one source evolved between two audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceComparison {
    pub source: String,
    pub general: MetricDelta,
    pub dimensions: Vec<MetricDelta>,
    pub details: Vec<DetailPercentage>,
}

impl SourceComparison {
    /// Compare `current` with `previous`. Without a previous audit no delta
    /// is given.
    pub fn new(current: &SourceAuditResult, previous: Option<&SourceAuditResult>) -> Self {
        let general = MetricDelta::new(
            "general",
            "Qualité globale",
            current.general.value,
            previous.map(|p| p.general.value),
            current.general.rank,
        );

        let dimensions = Dimension::ALL
            .into_iter()
            .map(|dimension| {
                let measure = current.measure(dimension);
                MetricDelta::new(
                    dimension.key(),
                    dimension.label(),
                    measure.value,
                    previous.map(|p| p.measure(dimension).value),
                    measure.rank,
                )
            })
            .collect();

        let details = current
            .measures()
            .iter()
            .flat_map(detail_percentages)
            .collect();

        Self {
            source: current.source.clone(),
            general,
            dimensions,
            details,
        }
    }
}

fn detail_percentages(measure: &Measure) -> Vec<DetailPercentage> {
    measure
        .dimension
        .detail_names()
        .iter()
        .map(|name| DetailPercentage {
            dimension: measure.dimension.key().to_string(),
            name: name.to_string(),
            value_pct: to_percentage(measure.detail(name).unwrap_or(0.0)),
        })
        .collect()
}

impl fmt::Display for MetricDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16} {:>5} %", self.label, self.value_pct)?;
        match self.delta_pts {
            Some(delta) => write!(f, "  {:>+5} pts", delta)?,
            None => write!(f, "  {:>9}", "")?,
        }
        match self.rank {
            Some(rank) => write!(f, "  rang {}", rank),
            None => write!(f, "  rang -"),
        }
    }
}

impl fmt::Display for SourceComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f)?;
        writeln!(f, "Synthèse")?;
        writeln!(f, "  {}", self.general)?;
        for dimension in &self.dimensions {
            writeln!(f, "  {}", dimension)?;
        }
        writeln!(f)?;
        writeln!(f, "Détails des indicateurs")?;
        let mut current = "";
        for detail in &self.details {
            if detail.dimension != current {
                current = detail.dimension.as_str();
                let label = Dimension::from_key(current).map_or(current, |d| d.label());
                writeln!(f, "  {}", label)?;
            }
            writeln!(f, "    {:>5} %  {}", detail.value_pct, detail.name.replace('_', " "))?;
        }
        Ok(())
    }
}
