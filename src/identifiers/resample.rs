//! Resampled statistical provider (`langdetect`).
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Identification, Predict};
use crate::error::Error;
use crate::types::LangTally;

/// Maximal number of draws per item.
const DRAWS: u64 = 3;

/// Stop drawing once the running top language reaches this probability,
/// provided it belongs to the configured default set.
const EARLY_STOP_PROB: f32 = 0.95;

/// Window size of one draw, in chars.
const WINDOW: usize = 500;

/// Averages an inner detector over up to three seeded text windows.
///
/// Long OCR items are noisy and uneven; predicting on a few windows and
/// averaging the per-language probabilities is markedly more stable than one
/// pass over the whole text. Draw `d` uses seed `seed + d`, so the output is
/// a pure function of the input bytes and the configuration.
pub struct Resampled<P> {
    inner: P,
    seed: u64,
    default_languages: Vec<String>,
}

impl<P> Resampled<P> {
    pub fn new(inner: P, seed: u64, default_languages: Vec<String>) -> Self {
        Self {
            inner,
            seed,
            default_languages,
        }
    }

    /// One seeded window of `text`, or the whole text when it fits.
    fn sample(&self, text: &str, draw: u64) -> Option<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= WINDOW {
            // nothing to sample, every draw would be identical
            return if draw == 0 {
                Some(text.to_string())
            } else {
                None
            };
        }
        let mut rng = StdRng::seed_from_u64(self.seed + draw);
        let start = rng.gen_range(0..=chars.len() - WINDOW);
        Some(chars[start..start + WINDOW].iter().collect())
    }
}

impl<P: Predict> Predict for Resampled<P> {
    fn predict(&self, text: &str) -> Result<Vec<Identification>, Error> {
        let mut sums = LangTally::new();
        let mut draws_done = 0u64;

        for draw in 0..DRAWS {
            let sample = match self.sample(text, draw) {
                Some(s) => s,
                None => break,
            };
            let predictions = self.inner.predict(&sample)?;
            draws_done += 1;
            for p in &predictions {
                sums.add(p.lang(), f64::from(p.prob()));
            }
            if let Some(top) = predictions.first() {
                if top.prob() > EARLY_STOP_PROB
                    && self.default_languages.iter().any(|l| l == top.lang())
                {
                    break;
                }
            }
        }

        if draws_done == 0 {
            return Ok(vec![]);
        }

        Ok(sums
            .sorted()
            .into_iter()
            .map(|(lang, sum)| {
                Identification::new(lang.to_string(), (sum / draws_done as f64) as f32)
            })
            .collect())
    }
}
