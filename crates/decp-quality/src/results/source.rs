//! Audit result of one source and its persisted shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::measure::{Dimension, General, Measure};
use crate::error::{AuditError, Result};

/// The seven scores of one source: six dimensions plus the general one.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAuditResult {
    pub source: String,
    pub general: General,
    /// One measure per dimension, in [`Dimension::ALL`] order.
    measures: Vec<Measure>,
}

static_assertions::assert_impl_all!(SourceAuditResult: Send, Sync);

impl SourceAuditResult {
    /// Assemble a result and compute its general score.
    ///
    /// `measures` must hold exactly one measure per dimension, in any order.
    pub fn new(source: impl Into<String>, mut measures: Vec<Measure>) -> Result<Self> {
        let source = source.into();
        measures.sort_by_key(|m| m.dimension);
        let dimensions: Vec<Dimension> = measures.iter().map(|m| m.dimension).collect();
        if dimensions != Dimension::ALL {
            return Err(AuditError::InvalidMeasures(format!(
                "source '{}' needs one measure per dimension, got {:?}",
                source, dimensions
            )));
        }

        let general = General::from_measures(&measures);
        Ok(Self {
            source,
            general,
            measures,
        })
    }

    /// Result of a source without any record: every figure is zero.
    pub fn empty(source: impl Into<String>) -> Self {
        let measures: Vec<Measure> = Dimension::ALL.into_iter().map(Measure::zero).collect();
        Self {
            source: source.into(),
            general: General::from_measures(&measures),
            measures,
        }
    }

    pub fn measure(&self, dimension: Dimension) -> &Measure {
        &self.measures[dimension as usize]
    }

    pub(crate) fn measure_mut(&mut self, dimension: Dimension) -> &mut Measure {
        &mut self.measures[dimension as usize]
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Mean of the six dimension values, rounded to six decimals.
    pub fn compute_general(&self) -> f64 {
        General::from_measures(&self.measures).value
    }

    pub fn to_serialized(&self) -> SerializedSourceResult {
        let dimensions = self
            .measures
            .iter()
            .map(|m| {
                (
                    m.dimension.key().to_string(),
                    SerializedMeasure {
                        synthese: SerializedScore {
                            valeur: m.value,
                            rang: m.rank,
                        },
                        detail: m.details.clone(),
                    },
                )
            })
            .collect();

        SerializedSourceResult {
            source: self.source.clone(),
            general: SerializedScore {
                valeur: self.general.value,
                rang: self.general.rank,
            },
            dimensions,
        }
    }

    /// Rebuild a result from its persisted shape.
    ///
    /// Stored values and ranks are kept as they are, not recomputed.
    pub fn from_serialized(serialized: SerializedSourceResult) -> Result<Self> {
        let SerializedSourceResult {
            source,
            general,
            mut dimensions,
        } = serialized;

        let mut measures = Vec::with_capacity(Dimension::ALL.len());
        for dimension in Dimension::ALL {
            let stored = dimensions.remove(dimension.key()).ok_or_else(|| {
                AuditError::InvalidArtifact(format!(
                    "source '{}' has no '{}' entry",
                    source,
                    dimension.key()
                ))
            })?;
            if let Some(name) = dimension
                .detail_names()
                .iter()
                .find(|name| !stored.detail.contains_key(**name))
            {
                return Err(AuditError::InvalidArtifact(format!(
                    "source '{}' has no '{}.detail.{}' entry",
                    source,
                    dimension.key(),
                    name
                )));
            }
            measures.push(Measure {
                dimension,
                value: stored.synthese.valeur,
                rank: stored.synthese.rang,
                details: stored.detail,
            });
        }

        if let Some(unknown) = dimensions.keys().next() {
            return Err(AuditError::InvalidArtifact(format!(
                "source '{}' has an unknown '{}' entry",
                source, unknown
            )));
        }

        Ok(Self {
            source,
            general: General {
                value: general.valeur,
                rank: general.rang,
            },
            measures,
        })
    }
}

/// Score with its rank, as persisted (`{"valeur": .., "rang": ..}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedScore {
    pub valeur: f64,
    pub rang: Option<u32>,
}

/// Persisted dimension: `{"synthese": {...}, "detail": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMeasure {
    pub synthese: SerializedScore,
    pub detail: BTreeMap<String, f64>,
}

/// Persisted source result. Dimensions sit at the top level of the object,
/// next to `source` and `general`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedSourceResult {
    pub source: String,
    pub general: SerializedScore,
    #[serde(flatten)]
    pub dimensions: BTreeMap<String, SerializedMeasure>,
}
