//! Stage-1 records: one line per content item, carrying every classifier's
//! predictions.
use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::Identification;

/// Version stamp attached to every emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub ts: String,
}

impl Version {
    /// Crate version with the current UTC time. Fixed once per run so that
    /// all records of one pass carry the same stamp.
    pub fn current() -> Self {
        Self::with_ts(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn with_ts(ts: String) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            ts,
        }
    }
}

/// Output of the classifier driver, input of the aggregator and the decider.
///
/// The per-classifier fields are kept in an ordered map so that records
/// serialize with the classifier columns sorted by name, between the fixed
/// head and the version stamp. An absent entry means the classifier did not
/// run on this item, `None` means it ran and failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub tp: String,
    pub len: usize,
    pub orig_lg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphabetical_ratio: Option<f64>,
    #[serde(flatten)]
    pub predictions: BTreeMap<String, Option<Vec<Identification>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_identifier_version: Option<Version>,
}

impl Record {
    /// Top prediction of one classifier, if it ran and returned anything.
    pub fn top(&self, lid: &str) -> Option<&Identification> {
        self.predictions
            .get(lid)
            .and_then(|preds| preds.as_deref())
            .and_then(|preds| preds.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "langid".to_string(),
            Some(vec![Identification::new("de".to_string(), 1.0)]),
        );
        predictions.insert("langdetect".to_string(), None);
        Record {
            id: "arbeitgeber-1909-01-02-a-i0017".to_string(),
            tp: "page".to_string(),
            len: 5636,
            orig_lg: None,
            alphabetical_ratio: Some(0.79),
            predictions,
            language_identifier_version: Some(Version::with_ts("2020-01-01T00:00:00Z".into())),
        }
    }

    #[test]
    fn test_top() {
        let r = sample();
        assert_eq!(r.top("langid").unwrap().lang(), "de");
        assert!(r.top("langdetect").is_none());
        assert!(r.top("impresso_ft").is_none());
    }

    #[test]
    fn test_roundtrip_keeps_failed_classifiers() {
        let r = sample();
        let line = serde_json::to_string(&r).unwrap();
        // a failed classifier serializes as null, an absent one disappears
        assert!(line.contains(r#""langdetect":null"#));
        assert!(!line.contains("impresso_ft"));

        let back: Record = serde_json::from_str(&line).unwrap();
        assert_eq!(back.predictions.len(), 2);
        assert!(back.predictions["langdetect"].is_none());
    }

    #[test]
    fn test_classifier_columns_sorted() {
        let line = serde_json::to_string(&sample()).unwrap();
        let langdetect = line.find("langdetect").unwrap();
        let langid = line.find("langid").unwrap();
        assert!(langdetect < langid);
    }
}
