//! Side-effecting adapters: filesystem state, archives and mail transport.

pub mod archiver;
pub mod atomic;
pub mod config;
pub mod mailer;
pub mod paths;
pub mod run_state;
pub mod settings_store;
