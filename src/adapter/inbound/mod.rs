//! Inbound adapters: command line parsing and the metrics HTTP endpoint.

pub mod cli;
pub mod http;
