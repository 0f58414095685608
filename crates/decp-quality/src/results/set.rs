//! Results of every audited source, with cross-source ranking.

use std::fs;
use std::path::Path;
use tracing::debug;

use super::measure::Dimension;
use super::source::{SerializedSourceResult, SourceAuditResult};
use crate::error::{AuditError, Result, ResultExt};

/// Ordered collection of source results, persisted as the audit artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditResultSet {
    results: Vec<SourceAuditResult>,
}

static_assertions::assert_impl_all!(AuditResultSet: Send, Sync);

impl AuditResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Source names are not checked for uniqueness.
    pub fn add(&mut self, result: SourceAuditResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[SourceAuditResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rank every source on each dimension and on the general score.
    ///
    /// The lowest value ranks 1. Ranks are dense: equal values share a rank
    /// and the next distinct value takes the following one.
    pub fn compute_ranks(&mut self) {
        for dimension in Dimension::ALL {
            let values: Vec<f64> = self
                .results
                .iter()
                .map(|r| r.measure(dimension).value)
                .collect();
            for (result, rank) in self.results.iter_mut().zip(dense_ranks(&values)) {
                result.measure_mut(dimension).rank = Some(rank);
            }
        }

        let values: Vec<f64> = self.results.iter().map(|r| r.general.value).collect();
        for (result, rank) in self.results.iter_mut().zip(dense_ranks(&values)) {
            result.general.rank = Some(rank);
        }
        debug!("Ranked {} sources", self.results.len());
    }

    /// Result of `source`. With duplicated names, the first added wins.
    pub fn lookup(&self, source: &str) -> Result<&SourceAuditResult> {
        self.results
            .iter()
            .find(|r| r.source == source)
            .ok_or_else(|| AuditError::NotFound(source.to_string()))
    }

    pub fn to_serialized(&self) -> Vec<SerializedSourceResult> {
        self.results
            .iter()
            .map(SourceAuditResult::to_serialized)
            .collect()
    }

    pub fn from_serialized(serialized: Vec<SerializedSourceResult>) -> Result<Self> {
        let results = serialized
            .into_iter()
            .map(SourceAuditResult::from_serialized)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { results })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_serialized())?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let serialized: Vec<SerializedSourceResult> = serde_json::from_str(json)
            .map_err(|e| AuditError::InvalidArtifact(e.to_string()))?;
        Self::from_serialized(serialized)
    }

    /// Write the artifact as indented JSON, creating parent directories.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Creating directory {}", parent.display()))?;
        }
        fs::write(path, self.to_json_string()?)
            .context(format!("Writing audit results to {}", path.display()))?;
        debug!("Audit results written to {}", path.display());
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Reading audit results from {}", path.display()))?;
        Self::from_json_str(&json).context(format!("Loading {}", path.display()))
    }
}

/// Dense ranks of `values`, lowest first: `[0.1, 0.3, 0.3, 0.5]` gives
/// `[1, 2, 2, 3]`.
pub fn dense_ranks(values: &[f64]) -> Vec<u32> {
    let mut distinct = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    values
        .iter()
        .map(|v| distinct.partition_point(|d| d.total_cmp(v).is_lt()) as u32 + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Measure;
    use pretty_assertions::assert_eq;

    fn result(source: &str, values: [f64; 6]) -> SourceAuditResult {
        let measures = Dimension::ALL
            .into_iter()
            .zip(values)
            .map(|(d, v)| Measure::new(d, &vec![v; d.divisor()]))
            .collect();
        SourceAuditResult::new(source, measures).unwrap()
    }

    fn sample_set() -> AuditResultSet {
        let mut set = AuditResultSet::new();
        set.add(result("aife", [0.1, 0.2, 0.0, 0.5, 0.0, 0.1]));
        set.add(result("pes", [0.3, 0.2, 0.1, 0.5, 0.0, 0.0]));
        set.add(result("megalis", [0.3, 0.0, 0.0, 1.0, 0.0, 0.2]));
        set.add(result("grandlyon", [0.5, 0.4, 0.0, 0.5, 0.0, 0.1]));
        set
    }

    // ==================== dense_ranks tests ====================

    #[test]
    fn test_dense_ranks_without_gaps() {
        assert_eq!(dense_ranks(&[0.1, 0.3, 0.3, 0.5]), vec![1, 2, 2, 3]);
        assert_eq!(dense_ranks(&[0.5, 0.1, 0.5, 0.0]), vec![3, 2, 3, 1]);
        assert_eq!(dense_ranks(&[0.0, 0.0]), vec![1, 1]);
        assert!(dense_ranks(&[]).is_empty());
    }

    // ==================== compute_ranks tests ====================

    #[test]
    fn test_compute_ranks_per_dimension() {
        let mut set = sample_set();
        set.compute_ranks();

        let ranks = |d: Dimension| -> Vec<Option<u32>> {
            set.results().iter().map(|r| r.measure(d).rank).collect()
        };
        assert_eq!(
            ranks(Dimension::Singularite),
            vec![Some(1), Some(2), Some(2), Some(3)]
        );
        assert_eq!(
            ranks(Dimension::Conformite),
            vec![Some(2), Some(2), Some(1), Some(3)]
        );
        assert_eq!(ranks(Dimension::Coherence), vec![Some(1); 4]);
    }

    #[test]
    fn test_compute_ranks_general() {
        let mut set = sample_set();
        set.compute_ranks();

        // General values: 0.15, 0.183333, 0.25, 0.25
        let general: Vec<Option<u32>> = set.results().iter().map(|r| r.general.rank).collect();
        assert_eq!(general, vec![Some(1), Some(2), Some(3), Some(3)]);
        // Ranking leaves values untouched
        assert_eq!(set.results()[0].general.value, 0.15);
    }

    // ==================== lookup tests ====================

    #[test]
    fn test_lookup_first_match() {
        let mut set = sample_set();
        set.add(result("aife", [1.0; 6]));

        assert_eq!(set.len(), 5);
        assert_eq!(set.lookup("aife").unwrap().general.value, 0.15);
        assert!(matches!(
            set.lookup("inconnue"),
            Err(AuditError::NotFound(name)) if name == "inconnue"
        ));
    }

    // ==================== persistence tests ====================

    #[test]
    fn test_serialized_round_trip() {
        let mut set = sample_set();
        set.compute_ranks();

        let restored = AuditResultSet::from_serialized(set.to_serialized()).unwrap();
        assert_eq!(restored, set);

        let restored = AuditResultSet::from_json_str(&set.to_json_string().unwrap()).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = std::env::temp_dir().join(format!("decp-quality-set-{}", std::process::id()));
        let path = dir.join("nested").join("audit.json");

        let mut set = sample_set();
        set.compute_ranks();
        set.save_json(&path).unwrap();

        let restored = AuditResultSet::load_json(&path).unwrap();
        assert_eq!(restored, set);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_from_json_str_rejects_other_shapes() {
        let result = AuditResultSet::from_json_str(r#"{"source": "aife"}"#);
        assert!(matches!(result, Err(AuditError::InvalidArtifact(_))));
    }
}
