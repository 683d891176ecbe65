// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Daily background jobs (lot sync, backups) at a fixed local time.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fires once a day at `hour:minute` local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| anyhow!("invalid time of day {hour:02}:{minute:02}"))?;
        Ok(Self { time })
    }

    /// First fire time strictly after `now`. Days where the time does not
    /// exist (DST gap) are skipped.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut day = now.date_naive();
        loop {
            let candidate = day
                .and_time(self.time)
                .and_local_timezone(tz.clone())
                .earliest();
            if let Some(candidate) = candidate.filter(|c| c > now) {
                return candidate;
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return now.clone(),
            };
        }
    }
}

impl std::fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.time.format("%H:%M"))
    }
}

/// Run `job` every day at `schedule`, forever.
pub fn spawn_daily<F, Fut>(name: &'static str, schedule: DailySchedule, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!(job = name, at = %schedule, "Scheduled daily job");
        loop {
            let now = Local::now();
            let next = schedule.next_after(&now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            tracing::info!(job = name, "Running scheduled job");
            job().await;
        }
    })
}
