//! Collection statistics document, the aggregator's output.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};

use super::Version;
use crate::error::Error;

/// Per-collection trustworthiness statistics.
///
/// `lid_distributions[lid][lang]` is the relative frequency of `lang` as the
/// top prediction of `lid` over admitted items; `lg_support[lid][lang]` the
/// fraction of those predictions that the ensemble confirmed. Both include
/// the synthetic columns `orig_lg` and (distributions only) `ensemble`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: Option<String>,
    #[serde(default)]
    pub lids: Vec<String>,
    #[serde(default)]
    pub boosted_lids: Vec<String>,
    #[serde(default)]
    pub boost_factor: f64,
    #[serde(default)]
    pub admissible_languages: Option<Vec<String>>,
    pub dominant_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_language_ratio: Option<f64>,
    pub overall_orig_lg_support: Option<f64>,
    pub n: u64,
    #[serde(default)]
    pub lid_distributions: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub lg_support: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub contentitem_type_distribution: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator_version: Option<Version>,
}

impl CollectionStats {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }

    /// Ensemble-confirmed support of `lid` predicting `lang`, 0.0 when the
    /// pair was never confirmed.
    pub fn support(&self, lid: &str, lang: &str) -> f64 {
        self.lg_support
            .get(lid)
            .and_then(|langs| langs.get(lang))
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether `lang` ever won an ensemble decision in this collection.
    pub fn in_ensemble_distribution(&self, lang: &str) -> bool {
        self.lid_distributions
            .get("ensemble")
            .map_or(false, |langs| langs.contains_key(lang))
    }

    pub fn dominant_ratio(&self) -> f64 {
        self.dominant_language_ratio.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerates_degenerate_document() {
        // what the aggregator emits for a collection with zero admitted items
        let doc = r#"{
            "collection": "gazette",
            "dominant_language": null,
            "overall_orig_lg_support": null,
            "n": 0
        }"#;
        let stats: CollectionStats = serde_json::from_str(doc).unwrap();
        assert_eq!(stats.dominant_language, None);
        assert_eq!(stats.dominant_ratio(), 0.0);
        assert_eq!(stats.support("langid", "de"), 0.0);
        assert!(!stats.in_ensemble_distribution("de"));
    }
}
