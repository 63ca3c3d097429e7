//! Background workers that execute offloaded operations.
//!
//! A pipeline spawns a fixed number of [`worker::Worker`] tasks into a [`pool::WorkerPool`].
//! Each worker repeatedly pops one work item, runs it through the pipeline's
//! [`base::WorkHandler`] and pushes exactly one result.

pub mod activity;
pub mod base;
pub mod pool;
pub mod worker;
