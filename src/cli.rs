//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "gazetta",
    about = "Ensemble language identification for historical newspaper corpora"
)]
/// Holds every command that is callable by the `gazetta` command.
pub enum Gazetta {
    #[structopt(about = "Apply every configured classifier to content items")]
    Identify(Identify),
    #[structopt(about = "Aggregate one collection's classifier statistics")]
    Aggregate(Aggregate),
    #[structopt(about = "Decide final languages with the rule cascade")]
    Decide(Decide),
}

#[derive(Debug, StructOpt)]
/// Classifier driver command and parameters.
///
/// Reads rebuilt content items (one JSON object per line), writes one
/// stage-1 prediction file per input file into the destination directory.
pub struct Identify {
    #[structopt(
        parse(from_os_str),
        required = true,
        help = "stage-0 input files (jsonl or jsonl.gz)"
    )]
    pub src: Vec<PathBuf>,
    #[structopt(
        short = "o",
        long = "dst",
        parse(from_os_str),
        help = "destination directory for stage-1 files"
    )]
    pub dst: PathBuf,
    #[structopt(
        long,
        use_delimiter = true,
        default_value = "langdetect,langid",
        help = "classifiers to run (langdetect, langid, lingua, impresso_ft, wp_ft)"
    )]
    pub lids: Vec<String>,
    #[structopt(
        long = "impresso-ft",
        parse(from_os_str),
        help = "binary fasttext model for the impresso_ft classifier"
    )]
    pub impresso_ft: Option<PathBuf>,
    #[structopt(
        long = "wp-ft",
        parse(from_os_str),
        help = "binary fasttext model for the wp_ft classifier"
    )]
    pub wp_ft: Option<PathBuf>,
    #[structopt(
        short = "m",
        long = "minimal-text-length",
        default_value = "20",
        help = "minimal trimmed text length for classification to run"
    )]
    pub minimal_text_length: usize,
    #[structopt(
        long = "alphabetical-ratio-threshold",
        default_value = "0",
        help = "minimal alphabetic ratio for classification to run"
    )]
    pub alphabetical_ratio_threshold: f64,
    #[structopt(
        long = "round-ndigits",
        default_value = "2",
        help = "round emitted floats to n digits"
    )]
    pub round_ndigits: i32,
    #[structopt(
        long,
        default_value = "42",
        help = "base seed of the resampled statistical detector"
    )]
    pub seed: u64,
    #[structopt(
        long = "default-languages",
        use_delimiter = true,
        default_value = "de,fr,lb,en,it",
        help = "languages allowed to early-stop the resampled detector"
    )]
    pub default_languages: Vec<String>,
}

#[derive(Debug, StructOpt)]
/// Aggregation command and parameters.
///
/// Reduces all stage-1 files of one collection into a single statistics
/// document (stdout unless a destination is given).
pub struct Aggregate {
    #[structopt(
        parse(from_os_str),
        required = true,
        help = "stage-1 input files of one collection"
    )]
    pub src: Vec<PathBuf>,
    #[structopt(
        short = "o",
        long = "dst",
        parse(from_os_str),
        help = "statistics output file, stdout when absent"
    )]
    pub dst: Option<PathBuf>,
    #[structopt(long, help = "collection name, inferred from ids when absent")]
    pub collection: Option<String>,
    #[structopt(
        long,
        use_delimiter = true,
        default_value = "langdetect,langid",
        help = "classifier columns to aggregate; never list orig_lg here"
    )]
    pub lids: Vec<String>,
    #[structopt(
        long = "boosted-lids",
        use_delimiter = true,
        help = "systems (or orig_lg) boosted when another system agrees"
    )]
    pub boosted_lids: Vec<String>,
    #[structopt(
        long = "boost-factor",
        default_value = "1.5",
        help = "boost factor for boosted systems"
    )]
    pub boost_factor: f64,
    #[structopt(
        long = "minimal-vote-score",
        default_value = "1.5",
        help = "minimal vote score for an ensemble decision"
    )]
    pub minimal_vote_score: f64,
    #[structopt(
        long = "minimal-lid-probability",
        default_value = "0.25",
        help = "minimal probability for a prediction to count as a vote"
    )]
    pub minimal_lid_probability: f64,
    #[structopt(
        short = "m",
        long = "minimal-text-length",
        default_value = "200",
        help = "minimal effective length (len x alphabetic ratio) for admission"
    )]
    pub minimal_text_length: usize,
    #[structopt(
        long = "round-ndigits",
        default_value = "9",
        help = "round emitted floats to n digits"
    )]
    pub round_ndigits: i32,
    #[structopt(
        long = "admissible-languages",
        use_delimiter = true,
        help = "restrict ensemble votes to these languages"
    )]
    pub admissible_languages: Option<Vec<String>>,
}

#[derive(Debug, StructOpt)]
/// Decision command and parameters.
///
/// Combines stage-1 files with the collection statistics document and
/// writes one final label file per input file.
pub struct Decide {
    #[structopt(
        parse(from_os_str),
        required = true,
        help = "stage-1 input files of one collection"
    )]
    pub src: Vec<PathBuf>,
    #[structopt(
        short = "o",
        long = "dst",
        parse(from_os_str),
        help = "destination directory for final label files"
    )]
    pub dst: PathBuf,
    #[structopt(
        short = "C",
        long = "collection-stats",
        parse(from_os_str),
        help = "collection statistics JSON file"
    )]
    pub collection_stats: PathBuf,
    #[structopt(
        long = "diagnostics-json",
        parse(from_os_str),
        help = "write decision distribution diagnostics to this file"
    )]
    pub diagnostics_json: Option<PathBuf>,
    #[structopt(
        long,
        use_delimiter = true,
        default_value = "langdetect,langid",
        help = "classifier columns to read; never list orig_lg here"
    )]
    pub lids: Vec<String>,
    #[structopt(
        long = "weight-lb-impresso-ft",
        default_value = "3",
        help = "voting weight for impresso_ft predicting Luxembourgish"
    )]
    pub weight_lb_impresso_ft: f64,
    #[structopt(
        long = "minimal-lid-probability",
        default_value = "0.5",
        help = "minimal probability for a prediction to count as a vote"
    )]
    pub minimal_lid_probability: f64,
    #[structopt(
        short = "m",
        long = "minimal-text-length",
        default_value = "20",
        help = "below this text length the dominant language wins"
    )]
    pub minimal_text_length: usize,
    #[structopt(
        long = "minimal-voting-score",
        default_value = "0.5",
        help = "minimal winning score for a voting decision"
    )]
    pub minimal_voting_score: f64,
    #[structopt(
        long = "threshold-confidence-orig-lg",
        default_value = "0.75",
        help = "ignore orig_lg when its overall support is at or below this"
    )]
    pub threshold_confidence_orig_lg: f64,
    #[structopt(
        long = "admissible-languages",
        use_delimiter = true,
        help = "restrict voting to these languages"
    )]
    pub admissible_languages: Option<Vec<String>>,
    #[structopt(
        long = "alphabetical-ratio-threshold",
        default_value = "0.5",
        help = "below this alphabetic ratio the dominant language is voted"
    )]
    pub alphabetical_ratio_threshold: f64,
    #[structopt(
        long = "dominant-language-threshold",
        default_value = "0.9",
        help = "dominance ratio from which non-dominant votes are penalized"
    )]
    pub dominant_language_threshold: f64,
    #[structopt(
        long = "exclude-lb",
        use_delimiter = true,
        help = "collections whose Luxembourgish predictions are ignored"
    )]
    pub exclude_lb: Vec<String>,
}
