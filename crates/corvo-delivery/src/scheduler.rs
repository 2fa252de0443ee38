// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily trigger scheduler.
//!
//! Triggers are wall-clock rules in a fixed business timezone, not in
//! whatever timezone the process happens to run. A trigger fires when its
//! `HH:MM` equals the current minute in that timezone and it has not
//! already fired on the current calendar date there; the once-per-day guard
//! is calendar-date equality, not a 24h cooldown, so firing stays reliable
//! across polling jitter and restarts.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use corvo_config::model::SchedulerConfig;
use corvo_core::types::to_rfc3339;
use corvo_core::CorvoError;
use corvo_storage::{queries, Database};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Polls active triggers and enqueues broadcast jobs when they fire.
pub struct TriggerScheduler {
    db: Database,
    config: SchedulerConfig,
    timezone: Tz,
}

impl TriggerScheduler {
    /// Creates the scheduler, parsing the configured timezone.
    pub fn new(db: Database, config: SchedulerConfig) -> Result<Self, CorvoError> {
        let timezone = Tz::from_str(&config.timezone).map_err(|_| {
            CorvoError::Config(format!(
                "scheduler.timezone `{}` is not a valid IANA timezone name",
                config.timezone
            ))
        })?;
        Ok(Self {
            db,
            config,
            timezone,
        })
    }

    /// Runs the poll loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(Utc::now()).await {
                        warn!(error = %e, "trigger scheduler poll failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("trigger scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// One poll pass at the given instant. Returns the number of triggers
    /// fired. Exposed for deterministic tests.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<usize, CorvoError> {
        let local = now.with_timezone(&self.timezone);
        let current_minute = local.format("%H:%M").to_string();
        let today = local.date_naive();

        let triggers = queries::triggers::list_active(&self.db).await?;
        let mut fired = 0;

        for trigger in triggers {
            if trigger.time_of_day != current_minute {
                continue;
            }

            if let Some(last_run_at) = &trigger.last_run_at {
                match DateTime::parse_from_rfc3339(last_run_at) {
                    Ok(last) => {
                        if last.with_timezone(&self.timezone).date_naive() == today {
                            continue;
                        }
                    }
                    Err(e) => {
                        // Fire anyway; the rewrite below restores a valid value.
                        warn!(
                            trigger_id = trigger.id,
                            error = %e,
                            "trigger has malformed last_run_at"
                        );
                    }
                }
            }

            let job_id = queries::broadcasts::create(&self.db, &trigger.message).await?;
            queries::triggers::mark_fired(&self.db, trigger.id, &to_rfc3339(now)).await?;
            info!(
                trigger_id = trigger.id,
                job_id,
                time_of_day = trigger.time_of_day.as_str(),
                "trigger fired, broadcast job enqueued"
            );
            fired += 1;
        }

        Ok(fired)
    }
}
