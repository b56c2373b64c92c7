//! Single classifier prediction.
use serde::{Deserialize, Serialize};

use crate::types::round_to;

/// A language code with the probability a classifier assigned to it.
///
/// Language codes are bare ISO 639-1 (two letter) codes wherever the
/// underlying model provides them; a few models fall back to ISO 639-3 for
/// languages without a two letter code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identification {
    lang: String,
    prob: f32,
}

impl Identification {
    pub fn new(lang: String, prob: f32) -> Self {
        Self { lang, prob }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn prob(&self) -> f32 {
        self.prob
    }

    /// Copy with the probability rounded to `ndigits` decimals.
    pub fn rounded(&self, ndigits: i32) -> Self {
        Self {
            lang: self.lang.clone(),
            prob: round_to(f64::from(self.prob), ndigits) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Identification;

    #[test]
    fn test_rounded() {
        let id = Identification::new("fr".to_string(), 0.96456933);
        let rounded = id.rounded(2);
        assert_eq!(rounded.lang(), "fr");
        assert_eq!(rounded.prob(), 0.96);
    }

    #[test]
    fn test_wire_format() {
        let id = Identification::new("de".to_string(), 1.0);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            r#"{"lang":"de","prob":1.0}"#
        );
    }
}
