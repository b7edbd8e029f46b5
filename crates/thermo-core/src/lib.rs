//! Hardware-independent core library for thermo-rs
//!
//! This crate contains all platform-agnostic logic for the simulated
//! temperature sampling device: the cyclic sample feed, the statistics
//! accumulator shared between the sampling and reporting tasks, the bounded
//! failure ledger, report rendering, the delivery seam and the reporter state
//! machine that ties them together.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod config;
pub mod delivery;
pub mod report;
pub mod reporter;
pub mod sensors;
pub mod storage;
pub mod tasks;
pub mod time;
