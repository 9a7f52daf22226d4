//! Deterministic, pure logic for the send workflow.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod period;
pub mod settings;
pub mod subject;
pub mod types;
