/*! Collection aggregator: stage 1 to the statistics document.

Reduces every stage-1 record of one collection into a single document
measuring how trustworthy each classifier is on that collection: per-lid
language distributions, ensemble-confirmed support rates, the dominant
language and the confidence in the publisher-supplied `orig_lg`.
!*/
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::error::Error;
use crate::io::JsonlReader;
use crate::pipelines::pipeline::Pipeline;
use crate::types::{
    collection_of, round_to, CollectionStats, LangTally, Record, Version,
};

#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Collection name; inferred from the first record id when absent.
    pub collection: Option<String>,
    /// Classifier columns to read. `orig_lg` is implicit, never listed.
    pub lids: Vec<String>,
    /// Systems whose agreement with another system counts extra.
    pub boosted_lids: Vec<String>,
    pub boost_factor: f64,
    /// Minimal per-language total for an ensemble decision.
    pub minimal_vote_score: f64,
    /// Minimal top probability for a classifier to vote.
    pub minimal_lid_probability: f64,
    /// Minimal effective length (len x alphabetic ratio) for admission.
    pub minimal_text_length: usize,
    pub round_ndigits: i32,
    pub admissible_languages: Option<Vec<String>>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            collection: None,
            lids: vec![],
            boosted_lids: vec![],
            boost_factor: 1.5,
            minimal_vote_score: 1.5,
            minimal_lid_probability: 0.25,
            minimal_text_length: 200,
            round_ndigits: 9,
            admissible_languages: None,
        }
    }
}

/// Streaming reduce over one collection's records.
///
/// Counts are kept raw during the stream; [Aggregator::finish] converts them
/// in the documented order: support ratios against the raw per-lid counts
/// first, distributions to relative frequencies second.
pub struct Aggregator {
    cfg: AggregateConfig,
    lids: Vec<String>,
    boosted_lids: Vec<String>,
    collection: Option<String>,
    n: u64,
    lid_distributions: BTreeMap<String, LangTally>,
    lg_support: BTreeMap<String, LangTally>,
    contentitem_type_distribution: BTreeMap<String, u64>,
}

impl Aggregator {
    pub fn new(cfg: AggregateConfig) -> Result<Self, Error> {
        let mut lids: Vec<String> = cfg
            .lids
            .iter()
            .filter(|lid| lid.as_str() != "orig_lg")
            .cloned()
            .collect();
        lids.sort();
        lids.dedup();
        if lids.is_empty() {
            return Err(Error::Custom(
                "no classifiers configured, at least one needed".to_string(),
            ));
        }

        let boosted_lids: Vec<String> = cfg
            .boosted_lids
            .iter()
            .filter(|lid| lid.as_str() == "orig_lg" || lids.contains(*lid))
            .cloned()
            .collect();
        if boosted_lids.len() != cfg.boosted_lids.len() {
            warn!(
                "ignoring boosted classifiers that are not configured: {:?}",
                cfg.boosted_lids
                    .iter()
                    .filter(|lid| !boosted_lids.contains(*lid))
                    .collect::<Vec<_>>()
            );
        }

        let mut lid_distributions = BTreeMap::new();
        let mut lg_support = BTreeMap::new();
        for lid in lids.iter().map(String::as_str).chain(["orig_lg"]) {
            lid_distributions.insert(lid.to_string(), LangTally::new());
            lg_support.insert(lid.to_string(), LangTally::new());
        }
        lid_distributions.insert("ensemble".to_string(), LangTally::new());

        Ok(Self {
            collection: cfg.collection.clone(),
            cfg,
            lids,
            boosted_lids,
            n: 0,
            lid_distributions,
            lg_support,
            contentitem_type_distribution: BTreeMap::new(),
        })
    }

    fn boost(&self, lid: &str) -> f64 {
        if self.boosted_lids.iter().any(|b| b == lid) {
            self.cfg.boost_factor
        } else {
            1.0
        }
    }

    fn admissible(&self, lang: &str) -> bool {
        self.cfg
            .admissible_languages
            .as_ref()
            .map_or(true, |langs| langs.iter().any(|l| l == lang))
    }

    /// Boosted ensemble vote for one record, `None` when no language clears
    /// the score threshold or the top two tie.
    fn ensemble_decision(&self, record: &Record) -> Option<String> {
        // per language, the boost each supporting system would contribute
        let mut votes: Vec<(String, Vec<f64>)> = Vec::new();
        let mut push = |lang: &str, boost: f64| {
            match votes.iter_mut().find(|(l, _)| l == lang) {
                Some((_, boosts)) => boosts.push(boost),
                None => votes.push((lang.to_string(), vec![boost])),
            }
        };

        if let Some(orig) = record.orig_lg.as_deref() {
            push(orig, self.boost("orig_lg"));
        }
        for lid in &self.lids {
            if let Some(top) = record.top(lid) {
                if self.admissible(top.lang())
                    && f64::from(top.prob()) >= self.cfg.minimal_lid_probability
                {
                    push(top.lang(), self.boost(lid));
                }
            }
        }

        // a boost only materializes when another system supports the language
        let mut decision = LangTally::new();
        for (lang, boosts) in &votes {
            let score = if boosts.len() > 1 {
                boosts.iter().sum()
            } else {
                1.0
            };
            if score >= self.cfg.minimal_vote_score {
                decision.add(lang, score);
            }
        }

        if decision.is_empty() {
            debug!("{}: no ensemble decision", record.id);
            return None;
        }
        if decision.top_is_tied() {
            warn!(
                "ignore decision for {} as there is a tie between the two top predicted languages",
                record.id
            );
            return None;
        }
        decision.top().map(|(lang, _)| lang.to_string())
    }

    pub fn add(&mut self, record: &Record) {
        if self.collection.is_none() {
            let inferred = collection_of(&record.id)
                .unwrap_or(record.id.as_str())
                .to_string();
            warn!(
                "inferred collection name from first content item as '{}'",
                inferred
            );
            self.collection = Some(inferred);
        }

        *self
            .contentitem_type_distribution
            .entry(record.tp.clone())
            .or_insert(0) += 1;

        if record.tp == "img" {
            return;
        }

        let a_ratio = record.alphabetical_ratio.unwrap_or(0.0);
        if a_ratio < 0.5 || (record.len as f64) * a_ratio < self.cfg.minimal_text_length as f64 {
            debug!("ignore short content item: {} (length: {})", record.id, record.len);
            return;
        }

        self.n += 1;

        for lid in &self.lids {
            if let Some(top) = record.top(lid) {
                self.lid_distributions
                    .get_mut(lid.as_str())
                    .expect("distribution initialized at startup")
                    .add(top.lang(), 1.0);
            }
        }
        if let Some(orig) = record.orig_lg.as_deref() {
            self.lid_distributions
                .get_mut("orig_lg")
                .expect("distribution initialized at startup")
                .add(orig, 1.0);
        }

        let decision = match self.ensemble_decision(record) {
            Some(lang) => lang,
            None => return,
        };

        self.lid_distributions
            .get_mut("ensemble")
            .expect("distribution initialized at startup")
            .add(&decision, 1.0);

        for lid in &self.lids {
            if let Some(top) = record.top(lid) {
                if top.lang() == decision {
                    self.lg_support
                        .get_mut(lid.as_str())
                        .expect("support initialized at startup")
                        .add(&decision, 1.0);
                }
            }
        }
        if record.orig_lg.as_deref() == Some(decision.as_str()) {
            self.lg_support
                .get_mut("orig_lg")
                .expect("support initialized at startup")
                .add(&decision, 1.0);
        }
    }

    /// Close the stream and emit the statistics document.
    pub fn finish(mut self) -> CollectionStats {
        let nd = self.cfg.round_ndigits;

        // overall orig_lg support, from raw counts
        let orig_n = self.lid_distributions["orig_lg"].total();
        let overall_orig_lg_support = if orig_n > 0.0 {
            Some(round_to(self.lg_support["orig_lg"].total() / orig_n, nd))
        } else {
            None
        };

        // support counts become conditional frequencies against the raw
        // per-lid distribution counts; this must happen before the
        // distributions themselves are normalized
        for (lid, support) in self.lg_support.iter_mut() {
            let distribution = &self.lid_distributions[lid.as_str()];
            let confirmed: Vec<(String, f64)> = support
                .iter()
                .map(|(lang, count)| (lang.to_string(), count))
                .collect();
            for (lang, count) in confirmed {
                let predicted = distribution
                    .get(&lang)
                    .expect("support implies at least one prediction");
                support.set(&lang, round_to(count / predicted, nd));
            }
        }

        if self.n > 0 {
            let n = self.n as f64;
            for distribution in self.lid_distributions.values_mut() {
                distribution.map_values(|count| round_to(count / n, nd));
            }
        }

        let (dominant_language, dominant_language_ratio) =
            match self.lid_distributions["ensemble"].top() {
                Some((lang, ratio)) => (Some(lang.to_string()), Some(ratio)),
                None => (None, None),
            };

        let to_map = |tally: &LangTally| -> BTreeMap<String, f64> {
            tally.iter().map(|(l, v)| (l.to_string(), v)).collect()
        };

        CollectionStats {
            collection: self.collection,
            lids: self.lids,
            boosted_lids: self.boosted_lids,
            boost_factor: self.cfg.boost_factor,
            admissible_languages: self.cfg.admissible_languages,
            dominant_language,
            dominant_language_ratio,
            overall_orig_lg_support,
            n: self.n,
            lid_distributions: self
                .lid_distributions
                .iter()
                .map(|(lid, tally)| (lid.clone(), to_map(tally)))
                .collect(),
            lg_support: self
                .lg_support
                .iter()
                .map(|(lid, tally)| (lid.clone(), to_map(tally)))
                .collect(),
            contentitem_type_distribution: self.contentitem_type_distribution,
            aggregator_version: Some(Version::current()),
        }
    }
}

/// The stage-2 pipeline: all of one collection's stage-1 files in, one
/// statistics document out (stdout when no destination is given).
pub struct Aggregate {
    src: Vec<PathBuf>,
    dst: Option<PathBuf>,
    cfg: AggregateConfig,
}

impl Aggregate {
    pub fn new(src: Vec<PathBuf>, dst: Option<PathBuf>, cfg: AggregateConfig) -> Self {
        Self { src, dst, cfg }
    }
}

impl Pipeline<()> for Aggregate {
    fn run(&self) -> Result<(), Error> {
        let mut aggregator = Aggregator::new(self.cfg.clone())?;

        for path in &self.src {
            info!("working on {:?}", path);
            for record in JsonlReader::<Record>::from_path(path)? {
                aggregator.add(&record?);
            }
        }

        let stats = aggregator.finish();
        match &self.dst {
            Some(path) => {
                let mut writer = crate::io::JsonlWriter::to_path(path)?;
                writer.write(&stats)?;
                writer.finish()?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                serde_json::to_writer(&mut stdout, &stats)?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}
