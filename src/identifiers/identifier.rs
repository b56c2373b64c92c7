/*! Predict trait and the configured classifier set.

All providers implement [Predict] to be usable in the classifier driver.
!*/
use std::path::PathBuf;

use log::info;

use super::{FastTextBuilder, Identification, Lingua, Ngram, Resampled};
use crate::error::Error;

/// A language identification classifier provider.
///
/// Returns predictions in descending probability order. An empty result
/// means the classifier could not identify anything; an `Err` is a
/// classifier failure that the driver records as null.
pub trait Predict {
    fn predict(&self, text: &str) -> Result<Vec<Identification>, Error>;
}

/// Everything needed to instantiate the built-in providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Path to the in-domain fasttext model (`impresso_ft`).
    pub impresso_ft: Option<PathBuf>,
    /// Path to the Wikipedia fasttext model (`wp_ft`).
    pub wp_ft: Option<PathBuf>,
    /// Base seed for the resampled statistical detector.
    pub seed: u64,
    /// Languages allowed to trigger the resampler's early stop.
    pub default_languages: Vec<String>,
}

/// The classifiers configured for one driver run, in configuration order.
///
/// Provider names are fixed: `langdetect`, `langid`, `lingua`,
/// `impresso_ft`, `wp_ft`. Models are loaded once at startup and shared
/// read-only afterwards.
pub struct ClassifierSet {
    classifiers: Vec<(String, Box<dyn Predict + Send + Sync>)>,
}

impl ClassifierSet {
    pub fn build(lids: &[String], cfg: &ProviderConfig) -> Result<Self, Error> {
        if lids.is_empty() {
            return Err(Error::Custom(
                "no classifiers configured, at least one needed".to_string(),
            ));
        }

        let mut classifiers: Vec<(String, Box<dyn Predict + Send + Sync>)> = Vec::new();
        for name in lids {
            let provider: Box<dyn Predict + Send + Sync> = match name.as_str() {
                "langdetect" => Box::new(Resampled::new(
                    Lingua::new(),
                    cfg.seed,
                    cfg.default_languages.clone(),
                )),
                "langid" => Box::new(Ngram),
                "lingua" => Box::new(Lingua::new()),
                "impresso_ft" => Box::new(Self::fasttext(name, cfg.impresso_ft.as_deref())?),
                "wp_ft" => Box::new(Self::fasttext(name, cfg.wp_ft.as_deref())?),
                other => return Err(Error::UnknownClassifier(other.to_string())),
            };
            info!("loaded classifier {}", name);
            classifiers.push((name.clone(), provider));
        }
        Ok(Self { classifiers })
    }

    fn fasttext(
        name: &str,
        path: Option<&std::path::Path>,
    ) -> Result<super::FastText, Error> {
        let path = path.ok_or_else(|| {
            Error::Custom(format!("classifier {name} requested but no model path given"))
        })?;
        FastTextBuilder::default().path(path).build()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &(dyn Predict + Send + Sync))> {
        self.classifiers
            .iter()
            .map(|(name, clf)| (name.as_str(), clf.as_ref()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classifiers.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Set assembled from already-built providers, used by tests and by
    /// callers that bring their own classifiers.
    pub fn from_parts(classifiers: Vec<(String, Box<dyn Predict + Send + Sync>)>) -> Self {
        Self { classifiers }
    }
}
