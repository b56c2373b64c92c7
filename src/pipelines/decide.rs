/*! Ensemble decider: stage 1 plus statistics to final labels.

A deterministic rule cascade per content item; the first matching rule wins:
images get no label, unanimous classifiers are followed directly, very short
items fall back to the collection's dominant language, everything else goes
through support-weighted voting.
!*/
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;

use crate::error::Error;
use crate::identifiers::Identification;
use crate::io::{JsonlReader, JsonlWriter};
use crate::pipelines::pipeline::Pipeline;
use crate::types::{
    collection_of, round_to, year_of, CollectionStats, Decision, Diagnostics, LangTally,
    LgDecision, Record, Version, Vote,
};

/// Stand-in support for a trusted `orig_lg` the aggregator never confirmed.
const ORIG_LG_EPSILON: f64 = 0.00001;

#[derive(Debug, Clone)]
pub struct DecideConfig {
    /// Classifier columns to read. `orig_lg` is implicit, never listed.
    pub lids: Vec<String>,
    /// Voting weight multiplier for `impresso_ft` predicting Luxembourgish.
    pub weight_lb_impresso_ft: f64,
    /// Minimal top probability for a classifier to vote.
    pub minimal_lid_probability: f64,
    /// Below this text length the dominant language wins outright.
    pub minimal_text_length: usize,
    /// Minimal winning score for a voting decision to be accepted.
    pub minimal_voting_score: f64,
    /// Ignore `orig_lg` when its overall support is at or below this.
    pub threshold_confidence_orig_lg: f64,
    pub admissible_languages: Option<Vec<String>>,
    /// Below this alphabetic ratio the vote collapses to the dominant
    /// language.
    pub alphabetical_ratio_threshold: f64,
    /// Dominance ratio from which non-dominant votes get penalized.
    pub dominant_language_threshold: f64,
    /// Collections where Luxembourgish predictions are ignored.
    pub exclude_lb: Vec<String>,
}

impl Default for DecideConfig {
    fn default() -> Self {
        Self {
            lids: vec![],
            weight_lb_impresso_ft: 3.0,
            minimal_lid_probability: 0.5,
            minimal_text_length: 20,
            minimal_voting_score: 0.5,
            threshold_confidence_orig_lg: 0.75,
            admissible_languages: None,
            alphabetical_ratio_threshold: 0.5,
            dominant_language_threshold: 0.90,
            exclude_lb: vec![],
        }
    }
}

/// Per-collection decision engine.
///
/// Holds the statistics document read-only; deciding one record never
/// touches shared state, so records can be processed in any partitioning.
pub struct Decider {
    cfg: DecideConfig,
    stats: CollectionStats,
    lids: Vec<String>,
    trust_orig_lg: bool,
    version: Version,
}

impl Decider {
    pub fn new(cfg: DecideConfig, stats: CollectionStats) -> Result<Self, Error> {
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

        let trust_orig_lg = stats
            .overall_orig_lg_support
            .map_or(false, |support| support > cfg.threshold_confidence_orig_lg);
        debug!(
            "orig_lg trust: {} (overall support {:?})",
            trust_orig_lg, stats.overall_orig_lg_support
        );

        Ok(Self {
            cfg,
            stats,
            lids,
            trust_orig_lg,
            version: Version::current(),
        })
    }

    #[cfg(test)]
    fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    fn admissible(&self, lang: &str) -> bool {
        self.cfg
            .admissible_languages
            .as_ref()
            .map_or(true, |langs| langs.iter().any(|l| l == lang))
    }

    /// Top predictions feeding the cascade: the trusted `orig_lg` as a
    /// pseudo-classifier first, then each configured classifier.
    fn top_predictions(&self, record: &Record) -> Vec<(String, Identification)> {
        let mut tops = Vec::new();
        if self.trust_orig_lg {
            if let Some(orig) = record.orig_lg.as_deref() {
                // orig_lg carries no probability of its own; stand in the
                // measured support of the metadata column
                let support = match self.stats.support("orig_lg", orig) {
                    s if s > 0.0 => s,
                    _ => ORIG_LG_EPSILON,
                };
                tops.push((
                    "orig_lg".to_string(),
                    Identification::new(orig.to_string(), support as f32),
                ));
            }
        }
        for lid in &self.lids {
            if let Some(top) = record.top(lid) {
                tops.push((lid.clone(), top.clone()));
            }
        }
        tops
    }

    /// Support-weighted votes per language.
    fn weighted_votes(
        &self,
        record: &Record,
        tops: &[(String, Identification)],
        collection: &str,
    ) -> LangTally {
        let mut votes = LangTally::new();

        if record.alphabetical_ratio.unwrap_or(1.0) < self.cfg.alphabetical_ratio_threshold {
            debug!(
                "{}: alphabetic ratio below {}, voting dominant language",
                record.id, self.cfg.alphabetical_ratio_threshold
            );
            if let Some(dominant) = self.stats.dominant_language.as_deref() {
                votes.add(dominant, 1.0);
            }
            return votes;
        }

        for (lid, top) in tops {
            let lang = top.lang();
            if !self.admissible(lang) {
                continue;
            }
            if lang == "lb" && self.cfg.exclude_lb.iter().any(|c| c == collection) {
                debug!("{}: lb prediction of {} excluded for this collection", record.id, lid);
                continue;
            }
            if f64::from(top.prob()) < self.cfg.minimal_lid_probability {
                continue;
            }
            let support = self.stats.support(lid, lang);
            if support == 0.0 {
                continue;
            }

            let mut score = f64::from(top.prob()) * support;

            let dominant_ratio = self.stats.dominant_ratio();
            if dominant_ratio >= self.cfg.dominant_language_threshold
                && self.stats.dominant_language.as_deref() != Some(lang)
            {
                // fades linearly from 1 at the threshold to 0 at full dominance
                score *= 1.0
                    - (dominant_ratio - self.cfg.dominant_language_threshold)
                        / (1.0 - self.cfg.dominant_language_threshold);
            }

            if lid.as_str() == "impresso_ft" && lang == "lb" {
                score *= self.cfg.weight_lb_impresso_ft;
            }

            votes.add(lang, score);
        }
        votes
    }

    /// Run the cascade on one record.
    pub fn decide(&self, record: &Record) -> Result<Decision, Error> {
        let collection = collection_of(&record.id)?.to_string();
        let year = year_of(&record.id)?.to_string();

        let mut decision = Decision::from_record(record, &collection, &year, &self.version);
        for lid in &self.lids {
            if let Some(Some(preds)) = record.predictions.get(lid) {
                decision.predictions.insert(lid.clone(), preds.clone());
            }
        }

        // images carry no language
        if record.tp == "img" {
            return Ok(decision);
        }

        let tops = self.top_predictions(record);

        // follow unequivocal predictions
        let languages: BTreeSet<&str> = tops.iter().map(|(_, p)| p.lang()).collect();
        if languages.len() == 1 {
            decision.lg = languages.iter().next().map(|l| l.to_string());
            decision.lg_decision = Some(LgDecision::All);
            return Ok(decision);
        }

        // off-the-shelf classifiers agreeing on a minor language
        let non_ft: BTreeSet<&str> = tops
            .iter()
            .filter(|(lid, _)| lid.as_str() != "impresso_ft")
            .map(|(_, p)| p.lang())
            .collect();
        if non_ft.len() == 1 {
            let other = *non_ft.iter().next().expect("just checked length");
            let non_major = !matches!(other, "de" | "fr" | "en" | "it");
            let in_ensemble = self.stats.in_ensemble_distribution(other);
            let long_enough = record.alphabetical_ratio.map_or(false, |ratio| {
                record.len as f64 * ratio >= self.cfg.minimal_text_length as f64
            });
            if non_major && in_ensemble && long_enough {
                decision.lg = Some(other.to_string());
                decision.lg_decision = Some(LgDecision::AllButImpressoFt);
                return Ok(decision);
            }
        }

        // very short items get the collection's dominant language
        if record.len < self.cfg.minimal_text_length {
            decision.lg = self.stats.dominant_language.clone();
            decision.lg_decision = Some(LgDecision::DominantByLen);
            return Ok(decision);
        }

        // weighted voting for everything else
        let votes = self.weighted_votes(record, &tops, &collection);
        match votes.top() {
            Some((lang, score)) if score >= self.cfg.minimal_voting_score => {
                decision.lg = Some(lang.to_string());
                decision.lg_decision = Some(LgDecision::Voting);
                decision.votes = Some(
                    votes
                        .sorted()
                        .into_iter()
                        .map(|(lang, vote)| Vote {
                            lang: lang.to_string(),
                            vote: round_to(vote, 3),
                        })
                        .collect(),
                );
            }
            _ => {
                debug!("{}: no usable vote, using dominant language", record.id);
                decision.lg = self.stats.dominant_language.clone();
                decision.lg_decision = Some(LgDecision::DominantByLowvote);
            }
        }
        Ok(decision)
    }
}

/// The stage-3 pipeline: one output file per input file, plus an optional
/// diagnostics document over the whole run.
pub struct Decide {
    src: Vec<PathBuf>,
    dst: PathBuf,
    stats: PathBuf,
    diagnostics: Option<PathBuf>,
    cfg: DecideConfig,
}

impl Decide {
    pub fn new(
        src: Vec<PathBuf>,
        dst: PathBuf,
        stats: PathBuf,
        diagnostics: Option<PathBuf>,
        cfg: DecideConfig,
    ) -> Self {
        Self {
            src,
            dst,
            stats,
            diagnostics,
            cfg,
        }
    }

    fn process_file(&self, path: &Path, decider: &Decider) -> Result<Diagnostics, Error> {
        info!("working on {:?}", path);

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Custom(format!("not a file: {:?}", path)))?;
        let reader = JsonlReader::<Record>::from_path(path)?;
        let mut writer = JsonlWriter::to_path(&self.dst.join(file_name))?;

        let mut diagnostics = Diagnostics::default();
        for record in reader {
            let decision = decider.decide(&record?)?;
            diagnostics.observe(&decision);
            writer.write(&decision)?;
        }
        writer.finish()?;
        Ok(diagnostics)
    }
}

impl Pipeline<()> for Decide {
    fn run(&self) -> Result<(), Error> {
        let stats = CollectionStats::from_path(&self.stats)?;
        let decider = Decider::new(self.cfg.clone(), stats)?;

        if !self.dst.exists() {
            std::fs::create_dir_all(&self.dst)?;
        }

        // one partition per input file, the decider itself is read-only
        let results: Result<Vec<Diagnostics>, Error> = self
            .src
            .par_iter()
            .map(|path| self.process_file(path, &decider))
            .collect();

        let mut diagnostics = Diagnostics::default();
        for d in results? {
            diagnostics.merge(d);
        }
        for (decision, count) in &diagnostics.lg_decision {
            info!("decision {}: {} items", decision, count);
        }

        if let Some(path) = &self.diagnostics {
            let mut writer = JsonlWriter::to_path(path)?;
            writer.write(&diagnostics)?;
            writer.finish()?;
        }
        Ok(())
    }
}
