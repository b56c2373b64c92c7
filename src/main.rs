use log::{debug, LevelFilter};
use structopt::StructOpt;

use gazetta::cli;
use gazetta::error::Error;
use gazetta::identifiers::ProviderConfig;
use gazetta::pipelines::{
    Aggregate, AggregateConfig, Decide, DecideConfig, Identify, IdentifyConfig, Pipeline,
};

fn main() -> Result<(), Error> {
    // set default log level to info
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    builder.init();

    let opt = cli::Gazetta::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Gazetta::Identify(i) => {
            let providers = ProviderConfig {
                impresso_ft: i.impresso_ft,
                wp_ft: i.wp_ft,
                seed: i.seed,
                default_languages: i.default_languages,
            };
            let cfg = IdentifyConfig {
                minimal_text_length: i.minimal_text_length,
                alphabetical_ratio_threshold: i.alphabetical_ratio_threshold,
                round_ndigits: i.round_ndigits,
            };
            Identify::new(i.src, i.dst, i.lids, providers, cfg).run()?;
        }
        cli::Gazetta::Aggregate(a) => {
            let cfg = AggregateConfig {
                collection: a.collection,
                lids: a.lids,
                boosted_lids: a.boosted_lids,
                boost_factor: a.boost_factor,
                minimal_vote_score: a.minimal_vote_score,
                minimal_lid_probability: a.minimal_lid_probability,
                minimal_text_length: a.minimal_text_length,
                round_ndigits: a.round_ndigits,
                admissible_languages: a.admissible_languages,
            };
            Aggregate::new(a.src, a.dst, cfg).run()?;
        }
        cli::Gazetta::Decide(d) => {
            let cfg = DecideConfig {
                lids: d.lids,
                weight_lb_impresso_ft: d.weight_lb_impresso_ft,
                minimal_lid_probability: d.minimal_lid_probability,
                minimal_text_length: d.minimal_text_length,
                minimal_voting_score: d.minimal_voting_score,
                threshold_confidence_orig_lg: d.threshold_confidence_orig_lg,
                admissible_languages: d.admissible_languages,
                alphabetical_ratio_threshold: d.alphabetical_ratio_threshold,
                dominant_language_threshold: d.dominant_language_threshold,
                exclude_lb: d.exclude_lb,
            };
            Decide::new(d.src, d.dst, d.collection_stats, d.diagnostics_json, cfg).run()?;
        }
    };
    Ok(())
}
