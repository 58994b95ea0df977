//! Poll lane scheduling.

mod poller;

pub use poller::{PollState, Poller, TickOutcome};
