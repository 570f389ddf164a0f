//! Coordinator of a distributed word count.
//!
//! Workers register themselves over HTTP. Each `/mapreduce` request takes a
//! snapshot of the registered workers, splits the input across the mappers,
//! groups their partial counts by word and fans the words out to the
//! reducers.

pub mod args;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod jobs;
pub mod partition;
pub mod shuffle;
pub mod worker_client;
pub mod worker_info;
pub mod worker_registry;

pub use crate::core::{serve, MRCoordinator};
pub use crate::errors::CoordinatorError;
pub use crate::worker_registry::Requirements;
