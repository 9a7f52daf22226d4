//! Read-only view of the monthly gate for `sat-sender status`.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::core::period::TargetPeriod;
use crate::io::run_state::RunStateStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOutcome {
    /// Month stored in the run-state record, `None` if never run.
    pub last_month: Option<u32>,
    /// Whether a run today would be refused.
    pub month_consumed: bool,
    /// Period a run today would send.
    pub period: TargetPeriod,
}

pub fn status_for<S: RunStateStore>(store: &S, today: NaiveDate) -> Result<StatusOutcome> {
    let last_month = store.load()?.map(|state| state.month);
    Ok(StatusOutcome {
        last_month,
        month_consumed: last_month == Some(today.month()),
        period: TargetPeriod::preceding(today),
    })
}
