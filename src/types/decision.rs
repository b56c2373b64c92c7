//! Final per-item decision records.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Record, Version};
use crate::identifiers::Identification;

/// Which cascade rule produced the final language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LgDecision {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "all-but-impresso_ft")]
    AllButImpressoFt,
    #[serde(rename = "dominant-by-len")]
    DominantByLen,
    #[serde(rename = "dominant-by-lowvote")]
    DominantByLowvote,
    #[serde(rename = "voting")]
    Voting,
}

impl LgDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            LgDecision::All => "all",
            LgDecision::AllButImpressoFt => "all-but-impresso_ft",
            LgDecision::DominantByLen => "dominant-by-len",
            LgDecision::DominantByLowvote => "dominant-by-lowvote",
            LgDecision::Voting => "voting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub lang: String,
    pub vote: f64,
}

/// One output line of the decider.
///
/// Field order mirrors the stage-1 record head, followed by the collection
/// coordinates, the copied-through classifier columns and the votes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub lg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg_decision: Option<LgDecision>,
    pub tp: String,
    pub len: usize,
    pub orig_lg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphabetical_ratio: Option<f64>,
    pub impresso_language_identifier_version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_identifier_version: Option<Version>,
    pub year: String,
    pub collection: String,
    #[serde(flatten)]
    pub predictions: BTreeMap<String, Vec<Identification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<Vote>>,
}

impl Decision {
    /// Head-only record: copies the stage-1 attributes, leaves the decision
    /// fields empty.
    pub fn from_record(
        record: &Record,
        collection: &str,
        year: &str,
        version: &Version,
    ) -> Self {
        Self {
            id: record.id.clone(),
            lg: None,
            lg_decision: None,
            tp: record.tp.clone(),
            len: record.len,
            orig_lg: record.orig_lg.clone(),
            alphabetical_ratio: record.alphabetical_ratio,
            impresso_language_identifier_version: version.clone(),
            language_identifier_version: record.language_identifier_version.clone(),
            year: year.to_string(),
            collection: collection.to_string(),
            predictions: BTreeMap::new(),
            votes: None,
        }
    }
}

/// Decision-level frequency counts, written as the diagnostics document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub lg: BTreeMap<String, u64>,
    pub orig_lg: BTreeMap<String, u64>,
    pub tp: BTreeMap<String, u64>,
    pub lg_decision: BTreeMap<String, u64>,
    #[serde(rename = "N")]
    pub n: BTreeMap<String, u64>,
}

impl Diagnostics {
    pub fn observe(&mut self, decision: &Decision) {
        fn bump(map: &mut BTreeMap<String, u64>, key: Option<String>) {
            *map.entry(key.unwrap_or_else(|| "null".to_string()))
                .or_insert(0) += 1;
        }
        bump(&mut self.lg, decision.lg.clone());
        bump(&mut self.orig_lg, decision.orig_lg.clone());
        bump(&mut self.tp, Some(decision.tp.clone()));
        bump(
            &mut self.lg_decision,
            decision.lg_decision.map(|d| d.as_str().to_string()),
        );
        *self
            .n
            .entry(format!("{}-{}", decision.collection, decision.year))
            .or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: Diagnostics) {
        for (dst, src) in [
            (&mut self.lg, other.lg),
            (&mut self.orig_lg, other.orig_lg),
            (&mut self.tp, other.tp),
            (&mut self.lg_decision, other.lg_decision),
            (&mut self.n, other.n),
        ] {
            for (k, v) in src {
                *dst.entry(k).or_insert(0) += v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_serialization_shape() {
        let version = Version::with_ts("2024-01-01T00:00:00Z".into());
        let decision = Decision {
            id: "gazette-1900-01-02-a-i0017".to_string(),
            lg: Some("de".to_string()),
            lg_decision: Some(LgDecision::Voting),
            tp: "ar".to_string(),
            len: 512,
            orig_lg: None,
            alphabetical_ratio: Some(0.8),
            impresso_language_identifier_version: version,
            language_identifier_version: None,
            year: "1900".to_string(),
            collection: "gazette".to_string(),
            predictions: BTreeMap::new(),
            votes: Some(vec![Vote {
                lang: "de".to_string(),
                vote: 0.855,
            }]),
        };
        let line = serde_json::to_string(&decision).unwrap();
        assert!(line.contains(r#""lg_decision":"voting""#));
        assert!(line.contains(r#""orig_lg":null"#));
        assert!(line.contains(r#""votes":[{"lang":"de","vote":0.855}]"#));
    }

    #[test]
    fn test_image_has_no_decision_field() {
        let version = Version::with_ts("2024-01-01T00:00:00Z".into());
        let record = Record {
            id: "gazette-1900-01-02-a-i0018".to_string(),
            tp: "img".to_string(),
            len: 0,
            orig_lg: None,
            alphabetical_ratio: None,
            predictions: BTreeMap::new(),
            language_identifier_version: None,
        };
        let decision = Decision::from_record(&record, "gazette", "1900", &version);
        let line = serde_json::to_string(&decision).unwrap();
        assert!(line.contains(r#""lg":null"#));
        assert!(!line.contains("lg_decision"));
    }
}
