//! Outbound ports (driven side): interfaces implemented by outbound adapters.

pub mod sink;
pub mod source;
