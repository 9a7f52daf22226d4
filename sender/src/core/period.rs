//! Target period arithmetic: a run always packages the month before the
//! current calendar month.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

/// Month/year whose documents a run sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPeriod {
    /// 1-12.
    pub month: u32,
    pub year: i32,
}

impl TargetPeriod {
    /// Period preceding the calendar month of `today`. January wraps to
    /// December of the previous year.
    pub fn preceding(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self {
                month: 12,
                year: today.year() - 1,
            }
        } else {
            Self {
                month: today.month() - 1,
                year: today.year(),
            }
        }
    }

    /// Folder holding this period's documents under `base` (`<base>/<year>/<MM>`).
    pub fn source_dir(&self, base: &Path) -> PathBuf {
        base.join(self.year.to_string()).join(format!("{:02}", self.month))
    }
}

/// Renders as `month/year` without padding, e.g. `2/2024`.
impl fmt::Display for TargetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}
