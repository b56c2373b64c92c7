/*! Pipelines of the three passes.

[Identify] fans the classifiers out over content items, [Aggregate] reduces
one collection's records into a statistics document, [Decide] combines
records and statistics into final labels.
!*/
mod aggregate;
mod decide;
mod identify;
mod pipeline;

pub use aggregate::{Aggregate, AggregateConfig, Aggregator};
pub use decide::{Decide, DecideConfig, Decider};
pub use identify::{alphabetical_ratio, Driver, DriverCounters, Identify, IdentifyConfig};
pub use pipeline::Pipeline;
