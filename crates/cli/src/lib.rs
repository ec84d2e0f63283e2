//! Library interface for the fakeforge CLI
//!
//! Batch file parsing and report building live here so they can be tested
//! without running the binary.

pub mod batch_file;
pub mod report;

pub use batch_file::{BatchFile, BatchTarget};
pub use report::{BatchReport, Status, TargetReport};
