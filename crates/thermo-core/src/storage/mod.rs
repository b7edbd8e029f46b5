//! In-memory state owned by the pipeline: the aggregation window shared
//! between the sampling and reporting tasks, and the bounded ledger of
//! payloads that failed delivery.

pub mod accumulator;
pub mod ledger;

pub use accumulator::{AggregationWindow, Accumulator};
pub use ledger::{FailureLedger, InsertionOutcome, LEDGER_CAPACITY};
