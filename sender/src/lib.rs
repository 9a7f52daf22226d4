//! Monthly SAT fiscal-archive sender.
//!
//! Once per calendar month, packages the previous month's sales and
//! cancellation folders into zip archives and emails them to the accounting
//! office. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (settings validation, target
//!   period, subject line). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (run state, archives, SMTP, config).
//!   Behind traits where the workflow needs to swap them in tests.
//!
//! Orchestration modules ([`automation`], [`collect`], [`status`]) combine
//! the two to implement CLI commands.

pub mod automation;
pub mod collect;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
