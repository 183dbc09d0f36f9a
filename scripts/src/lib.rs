//! Scripts for deploying the prize pool contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod backend;
pub mod cli;
mod commands;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod executor;
pub mod orchestrator;
pub mod registry;
mod solidity;
pub mod types;
pub mod utils;
