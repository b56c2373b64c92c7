/*! Classifier driver: stage 0 to stage 1.

Applies every configured classifier to every content item and emits one
record per item, in input order. Items without usable text still produce a
record, just without classifier columns.
!*/
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::error::Error;
use crate::identifiers::{ClassifierSet, ProviderConfig};
use crate::io::{JsonlReader, JsonlWriter};
use crate::pipelines::pipeline::Pipeline;
use crate::types::{round_to, ContentItem, Record, Version};

/// Share of alphabetic chars in a text, 0.0 for empty text.
///
/// Digits, whitespace, underscores and punctuation all count against the
/// ratio; only letters count for it.
pub fn alphabetical_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alphabetic = text.chars().filter(|c| c.is_alphabetic()).count();
    alphabetic as f64 / total as f64
}

#[derive(Debug, Clone)]
pub struct IdentifyConfig {
    /// Minimal trimmed text length for prediction to run at all.
    pub minimal_text_length: usize,
    /// Minimal alphabetic ratio for prediction to run at all.
    pub alphabetical_ratio_threshold: f64,
    /// Decimal places of every emitted float.
    pub round_ndigits: i32,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            minimal_text_length: 20,
            alphabetical_ratio_threshold: 0.0,
            round_ndigits: 2,
        }
    }
}

/// Skip and disagreement diagnostics of one driver run.
#[derive(Debug, Clone, Default)]
pub struct DriverCounters {
    /// Reason -> number of items not fed to the classifiers.
    pub skipped: BTreeMap<String, u64>,
    /// Sorted list of disagreeing top languages -> item count.
    pub disagreements: BTreeMap<String, u64>,
}

impl DriverCounters {
    fn skip(&mut self, reason: &str) {
        *self.skipped.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: DriverCounters) {
        for (k, v) in other.skipped {
            *self.skipped.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.disagreements {
            *self.disagreements.entry(k).or_insert(0) += v;
        }
    }

    pub fn log_summary(&self) {
        for (reason, count) in &self.skipped {
            info!("skipped {} items: {}", count, reason);
        }
        for (langs, count) in &self.disagreements {
            info!("classifiers disagreed on {{{}}} for {} items", langs, count);
        }
    }
}

/// Per-item classification driver.
///
/// Stateless apart from its diagnostic counters; the classifier set is
/// shared read-only between drivers.
pub struct Driver<'a> {
    classifiers: &'a ClassifierSet,
    cfg: &'a IdentifyConfig,
    version: Version,
    counters: DriverCounters,
}

impl<'a> Driver<'a> {
    pub fn new(classifiers: &'a ClassifierSet, cfg: &'a IdentifyConfig, version: Version) -> Self {
        Self {
            classifiers,
            cfg,
            version,
            counters: DriverCounters::default(),
        }
    }

    pub fn record_for(&mut self, item: &ContentItem) -> Record {
        debug!("working on {}", item.id);

        let len = item.ft.as_deref().map_or(0, |ft| ft.chars().count());
        let mut record = Record {
            id: item.id.clone(),
            tp: item.tp.clone(),
            len,
            orig_lg: item.lg.clone(),
            alphabetical_ratio: None,
            predictions: BTreeMap::new(),
            language_identifier_version: Some(self.version.clone()),
        };

        let ft = match item.ft.as_deref() {
            Some(ft) => ft,
            None => {
                self.counters.skip("no_text");
                return record;
            }
        };
        if ft.trim().chars().count() < self.cfg.minimal_text_length {
            self.counters.skip("too_short");
            return record;
        }

        let ratio = alphabetical_ratio(ft);
        record.alphabetical_ratio = Some(round_to(ratio, self.cfg.round_ndigits));
        if ratio < self.cfg.alphabetical_ratio_threshold {
            self.counters.skip("low_alpha");
            return record;
        }

        for (name, classifier) in self.classifiers.iter() {
            match classifier.predict(ft) {
                Ok(predictions) => {
                    let rounded = predictions
                        .iter()
                        .map(|p| p.rounded(self.cfg.round_ndigits))
                        .collect();
                    record.predictions.insert(name.to_string(), Some(rounded));
                }
                Err(e) => {
                    error!("{}: classifier {} failed: {:?}", item.id, name, e);
                    record.predictions.insert(name.to_string(), None);
                }
            }
        }

        self.note_disagreement(&record);
        record
    }

    fn note_disagreement(&mut self, record: &Record) {
        let top_langs: BTreeSet<&str> = self
            .classifiers
            .names()
            .filter_map(|name| record.top(name))
            .map(|p| p.lang())
            .collect();
        if top_langs.len() > 1 {
            let key = top_langs.iter().join(",");
            *self.counters.disagreements.entry(key).or_insert(0) += 1;
        }
    }

    pub fn into_counters(self) -> DriverCounters {
        self.counters
    }
}

/// The stage-1 pipeline: one output file per input file, written into `dst`.
pub struct Identify {
    src: Vec<PathBuf>,
    dst: PathBuf,
    lids: Vec<String>,
    providers: ProviderConfig,
    cfg: IdentifyConfig,
}

impl Identify {
    pub fn new(
        src: Vec<PathBuf>,
        dst: PathBuf,
        lids: Vec<String>,
        providers: ProviderConfig,
        cfg: IdentifyConfig,
    ) -> Self {
        Self {
            src,
            dst,
            lids,
            providers,
            cfg,
        }
    }

    fn process_file(
        &self,
        path: &Path,
        classifiers: &ClassifierSet,
        version: &Version,
    ) -> Result<DriverCounters, Error> {
        info!("working on {:?}", path);

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Custom(format!("not a file: {:?}", path)))?;
        let reader = JsonlReader::<ContentItem>::from_path(path)?;
        let mut writer = JsonlWriter::to_path(&self.dst.join(file_name))?;

        let mut driver = Driver::new(classifiers, &self.cfg, version.clone());
        for item in reader {
            let record = driver.record_for(&item?);
            writer.write(&record)?;
        }
        writer.finish()?;

        Ok(driver.into_counters())
    }
}

impl Pipeline<()> for Identify {
    fn run(&self) -> Result<(), Error> {
        let classifiers = ClassifierSet::build(&self.lids, &self.providers)?;
        let version = Version::current();

        if !self.dst.exists() {
            warn!("destination directory does not exist, creating");
            std::fs::create_dir_all(&self.dst)?;
        }

        // one partition per input file, no shared mutable state
        let counters: Result<Vec<DriverCounters>, Error> = self
            .src
            .par_iter()
            .map(|path| self.process_file(path, &classifiers, &version))
            .collect();

        let mut total = DriverCounters::default();
        for c in counters? {
            total.merge(c);
        }
        total.log_summary();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{Identification, Predict};

    struct Fixed(&'static str, f32);
    impl Predict for Fixed {
        fn predict(&self, _text: &str) -> Result<Vec<Identification>, Error> {
            Ok(vec![Identification::new(self.0.to_string(), self.1)])
        }
    }

    struct Failing;
    impl Predict for Failing {
        fn predict(&self, _text: &str) -> Result<Vec<Identification>, Error> {
            Err(Error::Custom("model exploded".to_string()))
        }
    }

    fn set(parts: Vec<(&str, Box<dyn Predict + Send + Sync>)>) -> ClassifierSet {
        ClassifierSet::from_parts(
            parts
                .into_iter()
                .map(|(n, c)| (n.to_string(), c))
                .collect(),
        )
    }

    fn item(id: &str, tp: &str, ft: Option<&str>) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            tp: tp.to_string(),
            ft: ft.map(str::to_string),
            lg: None,
        }
    }

    fn version() -> Version {
        Version::with_ts("2024-01-01T00:00:00Z".into())
    }

    #[test]
    fn test_alphabetical_ratio() {
        assert_eq!(alphabetical_ratio(""), 0.0);
        assert_eq!(alphabetical_ratio("abcd"), 1.0);
        // 4 letters out of 8 chars
        assert_eq!(alphabetical_ratio("ab_12 cd"), 0.5);
    }

    #[test]
    fn test_skip_without_text() {
        let classifiers = set(vec![("langid", Box::new(Fixed("de", 1.0)))]);
        let cfg = IdentifyConfig::default();
        let mut driver = Driver::new(&classifiers, &cfg, version());

        let record = driver.record_for(&item("gazette-1900-01-02-a-i0001", "img", None));
        assert_eq!(record.len, 0);
        assert!(record.predictions.is_empty());
        assert!(record.alphabetical_ratio.is_none());
        assert_eq!(driver.counters.skipped["no_text"], 1);
    }

    #[test]
    fn test_skip_too_short() {
        let classifiers = set(vec![("langid", Box::new(Fixed("de", 1.0)))]);
        let cfg = IdentifyConfig::default();
        let mut driver = Driver::new(&classifiers, &cfg, version());

        let record = driver.record_for(&item("gazette-1900-01-02-a-i0001", "ar", Some("  kurz  ")));
        assert!(record.predictions.is_empty());
        assert_eq!(driver.counters.skipped["too_short"], 1);
    }

    #[test]
    fn test_skip_low_alpha_keeps_ratio() {
        let classifiers = set(vec![("langid", Box::new(Fixed("de", 1.0)))]);
        let cfg = IdentifyConfig {
            alphabetical_ratio_threshold: 0.5,
            ..Default::default()
        };
        let mut driver = Driver::new(&classifiers, &cfg, version());

        let record = driver.record_for(&item(
            "gazette-1900-01-02-a-i0001",
            "ar",
            Some("1234567890 1234567890 abc"),
        ));
        assert!(record.predictions.is_empty());
        assert!(record.alphabetical_ratio.unwrap() < 0.5);
        assert_eq!(driver.counters.skipped["low_alpha"], 1);
    }

    #[test]
    fn test_failed_classifier_recorded_as_null() {
        let classifiers = set(vec![
            ("langdetect", Box::new(Failing)),
            ("langid", Box::new(Fixed("de", 0.987654))),
        ]);
        let cfg = IdentifyConfig::default();
        let mut driver = Driver::new(&classifiers, &cfg, version());

        let record = driver.record_for(&item(
            "gazette-1900-01-02-a-i0001",
            "ar",
            Some("Ein hinreichend langer deutscher Beispieltext."),
        ));
        assert!(record.predictions["langdetect"].is_none());
        let top = record.top("langid").unwrap();
        assert_eq!(top.lang(), "de");
        // rounded to the configured two decimals
        assert_eq!(top.prob(), 0.99);
    }

    #[test]
    fn test_disagreement_counter_key_is_sorted() {
        let classifiers = set(vec![
            ("langid", Box::new(Fixed("fr", 0.9))),
            ("langdetect", Box::new(Fixed("de", 0.9))),
        ]);
        let cfg = IdentifyConfig::default();
        let mut driver = Driver::new(&classifiers, &cfg, version());

        driver.record_for(&item(
            "gazette-1900-01-02-a-i0001",
            "ar",
            Some("Ein hinreichend langer deutscher Beispieltext."),
        ));
        assert_eq!(driver.counters.disagreements["de,fr"], 1);
    }
}
