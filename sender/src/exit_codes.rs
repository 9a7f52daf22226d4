//! Stable exit codes for sender CLI commands.

/// Command succeeded; for `run`, the message was accepted by the relay.
pub const OK: i32 = 0;
/// Invalid settings/config, unreadable state, or any other error.
pub const INVALID: i32 = 1;
/// `run` found the current calendar month already consumed.
pub const ALREADY_RUN: i32 = 2;
/// `run` found neither folder to archive.
pub const NOTHING_TO_SEND: i32 = 3;
/// `run` packaged the archives but the relay refused or timed out.
pub const SEND_FAILED: i32 = 4;
