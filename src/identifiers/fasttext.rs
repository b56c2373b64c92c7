//! Fasttext providers (`impresso_ft`, `wp_ft`).
use std::path::Path;

use fasttext::{FastText as FastTextLib, Prediction};

use super::{Identification, Predict};
use crate::error::Error;

/// Clean the prediction label field from `__label__xx` into `xx`.
///
/// Be aware that the function only skips 9 chars without doing any parsing,
/// so it may silently fail if `prediction.label.chars().count() > 9`
/// but not of a `__label__xx` form.
///
/// # Errors
/// Returns an error if provided prediction is too short to be cleaned.
fn clean_prediction(prediction: &Prediction) -> Result<Prediction, String> {
    if prediction.label.chars().count() < 9 {
        return Err(format!(
            "Label is too short to be cleaned: {}",
            prediction.label
        ));
    }
    Ok(Prediction {
        prob: prediction.prob,
        label: prediction.label.chars().skip(9).collect(),
    })
}

/// Strip digits and flatten newlines before prediction.
///
/// Digit runs carry no language signal in OCR text and confuse the
/// subword models; fasttext itself only reads the first line of its input.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_numeric())
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

/// Holds a [fasttext::FastText] instance and its parameters:
/// - [FastText::k], number of predicted languages per item
/// - [FastText::threshold], minimal probability for a prediction to be kept
pub struct FastText {
    predictor: FastTextLib,
    pub k: i32,
    pub threshold: f32,
}

impl FastText {
    fn load(filename: &Path, k: i32, threshold: f32) -> Result<Self, Error> {
        let mut predictor = FastTextLib::new();
        let filename_str = filename.to_str();
        match filename_str {
            None => Err(Error::Custom(format!(
                "invalid filepath for lid: {:?}",
                filename
            ))),
            Some(filename) => {
                predictor.load_model(filename)?;
                Ok(Self {
                    predictor,
                    k,
                    threshold,
                })
            }
        }
    }
}

impl Predict for FastText {
    fn predict(&self, text: &str) -> Result<Vec<Identification>, Error> {
        let cleaned = normalize(text);
        let predictions = self.predictor.predict(&cleaned, self.k, self.threshold)?;

        predictions
            .into_iter()
            .map(|p| {
                let p = clean_prediction(&p)?;
                // the C++ side occasionally reports probabilities above 1
                Ok(Identification::new(p.label, p.prob.min(1.0)))
            })
            .collect()
    }
}

/// Fasttext builder.
pub struct FastTextBuilder<'a> {
    path: Option<&'a Path>,
    k: i32,
    threshold: f32,
}

impl<'a> FastTextBuilder<'a> {
    pub fn path<'b>(&'b mut self, path: &'a Path) -> &'b mut FastTextBuilder<'a> {
        self.path = Some(path);
        self
    }

    pub fn k<'b>(&'b mut self, k: i32) -> &'b mut FastTextBuilder<'a> {
        self.k = k;
        self
    }

    pub fn threshold<'b>(&'b mut self, threshold: f32) -> &'b mut FastTextBuilder<'a> {
        self.threshold = threshold;
        self
    }

    pub fn build(&self) -> Result<FastText, Error> {
        let path = self
            .path
            .ok_or_else(|| Error::Custom("no model path provided".to_string()))?;
        FastText::load(path, self.k, self.threshold)
    }
}

impl<'a> Default for FastTextBuilder<'a> {
    /// Top 3 predictions, keeping everything above 0.005.
    fn default() -> Self {
        Self {
            path: None,
            k: 3,
            threshold: 0.005,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_prediction() {
        let p = Prediction {
            prob: 1.0,
            label: "__label__fr".to_string(),
        };
        assert_eq!(clean_prediction(&p).unwrap().label, "fr");
    }

    #[test]
    fn test_clean_prediction_too_short() {
        let p = Prediction {
            prob: 1.0,
            label: "fr".to_string(),
        };
        assert!(clean_prediction(&p).is_err());
    }

    #[test]
    fn test_normalize_strips_digits_and_newlines() {
        assert_eq!(
            normalize("le 24 juin\n1859, Solférino"),
            "le  juin , Solférino"
        );
    }

    #[test]
    fn test_builder_without_path() {
        assert!(FastTextBuilder::default().build().is_err());
    }
}
