//! Lingua provider.
use lazy_static::lazy_static;
use lingua::{LanguageDetector, LanguageDetectorBuilder};

use super::{Identification, Predict};
use crate::error::Error;

lazy_static! {
    // built once per process, models load lazily per language
    static ref DETECTOR: LanguageDetector =
        LanguageDetectorBuilder::from_all_languages().build();
}

/// How many confidence values to keep per item.
const TOP_K: usize = 3;

/// Minimal confidence for a prediction to be reported at all.
const MIN_CONFIDENCE: f64 = 0.005;

/// Statistical detector over lingua's confidence values.
pub struct Lingua;

impl Lingua {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Lingua {
    fn default() -> Self {
        Self::new()
    }
}

impl Predict for Lingua {
    fn predict(&self, text: &str) -> Result<Vec<Identification>, Error> {
        let confidences = DETECTOR.compute_language_confidence_values(text);
        Ok(confidences
            .into_iter()
            .take(TOP_K)
            .filter(|(_, confidence)| *confidence >= MIN_CONFIDENCE)
            .map(|(language, confidence)| {
                Identification::new(
                    language.iso_code_639_1().to_string(),
                    confidence as f32,
                )
            })
            .collect())
    }
}
