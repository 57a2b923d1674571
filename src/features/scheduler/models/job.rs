use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::core::config::{check_reminder_window, SchedulerConfig};
use crate::features::users::Role;

/// The scheduler's jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobName {
    NotificationDrain,
    OverdueDocumentScan,
    RetentionCleanup,
}

impl JobName {
    pub const ALL: [JobName; 3] = [
        JobName::NotificationDrain,
        JobName::OverdueDocumentScan,
        JobName::RetentionCleanup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::NotificationDrain => "notification_drain",
            JobName::OverdueDocumentScan => "overdue_document_scan",
            JobName::RetentionCleanup => "retention_cleanup",
        }
    }
}

impl std::fmt::Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobName::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| format!("Unknown job '{}'", s))
    }
}

/// When a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// Fixed interval, first run one interval after start
    Every(Duration),
    /// Once a day at a UTC wall-clock time
    DailyAt(NaiveTime),
}

impl JobSchedule {
    /// Next firing strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            JobSchedule::Every(interval) => {
                let step = chrono::Duration::from_std(*interval)
                    .unwrap_or_else(|_| chrono::Duration::days(1));
                now + step
            }
            JobSchedule::DailyAt(time) => {
                let today = now.date_naive().and_time(*time).and_utc();
                if today > now {
                    today
                } else {
                    today + chrono::Duration::days(1)
                }
            }
        }
    }

    /// How long to sleep from `now` until the next firing
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_fire_after(now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn describe(&self) -> String {
        match self {
            JobSchedule::Every(interval) => format!("every {}s", interval.as_secs()),
            JobSchedule::DailyAt(time) => format!("daily at {} UTC", time.format("%H:%M")),
        }
    }
}

/// Outcome of one job run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobRunReport {
    pub job: JobName,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobRunReport {
    pub fn begin(job: JobName) -> Self {
        let now = Utc::now();
        Self {
            job,
            processed: 0,
            succeeded: 0,
            failed: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record(&mut self, ok: bool) {
        self.processed += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// Reminder settings that can change while the scheduler runs
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    /// Whether the overdue-document scan runs on its timer
    pub enabled: bool,
    pub overdue_scan_time: NaiveTime,
    pub reminder_window_days: i64,
    pub notify_roles: Vec<Role>,
}

impl ScheduleSettings {
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, String> {
        let notify_roles = config
            .notify_roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;

        let settings = Self {
            enabled: config.reminders_enabled,
            overdue_scan_time: config.overdue_scan_time,
            reminder_window_days: config.reminder_window_days,
            notify_roles,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        check_reminder_window(self.reminder_window_days)?;
        if self.notify_roles.is_empty() {
            return Err("notify_roles must name at least one role".to_string());
        }
        if self.notify_roles.iter().any(|r| !r.is_staff()) {
            return Err("notify_roles may only contain staff roles".to_string());
        }
        Ok(())
    }

    pub fn into_shared(self) -> SharedScheduleSettings {
        Arc::new(RwLock::new(self))
    }
}

/// Settings handle read by the scheduler and by services that notify staff
pub type SharedScheduleSettings = Arc<RwLock<ScheduleSettings>>;

/// Snapshot of one job for the operations endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobStatus {
    pub name: JobName,
    pub enabled: bool,
    /// Whether the job's timer is active
    pub running: bool,
    pub schedule: String,
    pub last_run: Option<JobRunReport>,
}
