/*! Language identification classifier providers.

Holds a [Predict] trait that every provider implements, and a
[ClassifierSet] bundling the providers configured for one run. Providers are
opaque to the rest of the pipeline: text in, an ordered list of
[Identification]s out.
!*/
mod fasttext;
mod identification;
mod identifier;
mod lingua;
mod ngram;
mod resample;

pub use self::fasttext::{FastText, FastTextBuilder};
pub use self::lingua::Lingua;
pub use identification::Identification;
pub use identifier::{ClassifierSet, Predict, ProviderConfig};
pub use ngram::Ngram;
pub use resample::Resampled;
