//! Scripts for deploying the `Receiver` and `Factory` contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod constants;
pub mod deployer;
pub mod deployments;
pub mod errors;
pub mod sequencer;
pub mod utils;

pub use commands::run_migration;
