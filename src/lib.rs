#![doc = include_str!("../README.md")]
pub mod cli;
pub mod error;
pub mod identifiers;
pub mod io;
pub mod pipelines;
pub mod types;
