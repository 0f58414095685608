//! Quality dimensions and their measures.
//!
//! The six dimensions share one [`Measure`] shape: a value, a rank and a
//! fixed set of named detail rates. What differs between dimensions (detail
//! names, divisor) is data held by [`Dimension`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{GENERAL_DECIMALS, RATE_DECIMALS, mean, round_to};

/// One of the six quality axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Singularite,
    Conformite,
    Completude,
    Validite,
    Coherence,
    Exactitude,
}

impl Dimension {
    /// Every dimension, in artifact order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Singularite,
        Dimension::Conformite,
        Dimension::Completude,
        Dimension::Validite,
        Dimension::Coherence,
        Dimension::Exactitude,
    ];

    /// Key of the dimension in persisted artifacts.
    pub fn key(self) -> &'static str {
        match self {
            Self::Singularite => "singularite",
            Self::Conformite => "conformite",
            Self::Completude => "completude",
            Self::Validite => "validite",
            Self::Coherence => "coherence",
            Self::Exactitude => "exactitude",
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Singularite => "Singularité",
            Self::Conformite => "Conformité",
            Self::Completude => "Complétude",
            Self::Validite => "Validité",
            Self::Coherence => "Cohérence",
            Self::Exactitude => "Exactitude",
        }
    }

    /// Names of the detail rates averaged into the dimension value.
    pub fn detail_names(self) -> &'static [&'static str] {
        match self {
            Self::Singularite => &["identifiants_non_uniques", "lignes_dupliquees"],
            Self::Conformite => &[
                "caracteres_mal_encodes",
                "formats_non_valides",
                "valeurs_non_valides",
            ],
            Self::Completude => &["donnees_manquantes", "valeurs_non_renseignees"],
            Self::Validite => &[
                "jours_depuis_derniere_publication",
                "depassements_delai_entre_notification_et_publication",
            ],
            Self::Coherence => &["incoherences_temporelles", "incoherences_montant_duree"],
            Self::Exactitude => &["valeurs_aberrantes", "valeurs_extremes"],
        }
    }

    /// Number of details the dimension value is averaged over.
    pub fn divisor(self) -> usize {
        self.detail_names().len()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score of one source on one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub dimension: Dimension,
    /// Mean of the details, rounded to two decimals. Lower is better.
    pub value: f64,
    /// Rank among audited sources, 1 being the best. `None` until ranked.
    pub rank: Option<u32>,
    pub details: BTreeMap<String, f64>,
}

impl Measure {
    /// Build a measure from its detail rates, given in
    /// [`Dimension::detail_names`] order.
    pub fn new(dimension: Dimension, values: &[f64]) -> Self {
        debug_assert_eq!(values.len(), dimension.divisor());
        let details = dimension
            .detail_names()
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        Self::with_details(dimension, details)
    }

    /// A measure whose details are all zero.
    pub fn zero(dimension: Dimension) -> Self {
        Self::new(dimension, &vec![0.0; dimension.divisor()])
    }

    pub(crate) fn with_details(dimension: Dimension, details: BTreeMap<String, f64>) -> Self {
        let mut measure = Self {
            dimension,
            value: 0.0,
            rank: None,
            details,
        };
        measure.value = measure.compute_value();
        measure
    }

    /// Mean of the detail rates, rounded to two decimals.
    pub fn compute_value(&self) -> f64 {
        round_to(mean(&self.ordered_details()), RATE_DECIMALS)
    }

    /// Detail rate by name.
    pub fn detail(&self, name: &str) -> Option<f64> {
        self.details.get(name).copied()
    }

    /// Detail rates in [`Dimension::detail_names`] order.
    pub fn ordered_details(&self) -> Vec<f64> {
        self.dimension
            .detail_names()
            .iter()
            .map(|name| self.detail(name).unwrap_or(0.0))
            .collect()
    }
}

/// Overall score of a source: the mean of its six dimension values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct General {
    pub value: f64,
    pub rank: Option<u32>,
}

impl General {
    /// Mean of the measure values, rounded to six decimals.
    pub fn from_measures(measures: &[Measure]) -> Self {
        let values: Vec<f64> = measures.iter().map(|m| m.value).collect();
        Self {
            value: round_to(mean(&values), GENERAL_DECIMALS),
            rank: None,
        }
    }
}
