// src/publish/state.rs
//! Per-day publication counter backing the daily cap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{read_json, write_json_atomic};
use crate::error::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyState {
    pub date: NaiveDate,
    #[serde(default)]
    pub published_today: usize,
}

impl DailyState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            published_today: 0,
        }
    }

    /// Load the counter for `today`. A missing file or a stale date starts from zero.
    pub fn load(path: &Path, today: NaiveDate) -> Result<Self, PersistenceError> {
        match read_json::<DailyState>(path)? {
            Some(s) if s.date == today => Ok(s),
            Some(s) => {
                info!(target: "curator::publish", previous = %s.date, %today, "daily counter reset");
                Ok(Self::new(today))
            }
            None => Ok(Self::new(today)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json_atomic(path, self, "daily state")
    }

    /// Allowance left under `daily_cap`; `None` when there is no cap.
    pub fn remaining(&self, daily_cap: Option<usize>) -> Option<usize> {
        daily_cap.map(|cap| cap.saturating_sub(self.published_today))
    }

    pub fn record(&mut self, published: usize) {
        self.published_today += published;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn counter_accumulates_and_resets_on_new_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut s = DailyState::load(&path, day(1)).unwrap();
        assert_eq!(s.remaining(Some(10)), Some(10));
        s.record(4);
        s.save(&path).unwrap();

        let mut s = DailyState::load(&path, day(1)).unwrap();
        s.record(8);
        assert_eq!(s.remaining(Some(10)), Some(0));
        assert_eq!(s.remaining(None), None);
        s.save(&path).unwrap();

        let s = DailyState::load(&path, day(2)).unwrap();
        assert_eq!(s.published_today, 0);
    }
}
