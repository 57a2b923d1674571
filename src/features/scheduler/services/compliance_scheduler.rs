use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::core::config::SchedulerConfig;
use crate::core::error::{AppError, Result};
use crate::features::scheduler::models::{
    JobName, JobRunReport, JobSchedule, JobStatus, ScheduleSettings, SharedScheduleSettings,
};
use crate::features::scheduler::workers::ComplianceJobs;

struct JobHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    schedule: JobSchedule,
    generation: u64,
}

/// Everything a job timer needs to run a job
#[derive(Clone)]
struct JobRunner {
    jobs: Arc<ComplianceJobs>,
    settings: SharedScheduleSettings,
    retention_days: u32,
    last_runs: Arc<Mutex<HashMap<JobName, JobRunReport>>>,
}

impl JobRunner {
    async fn run(&self, job: JobName) -> Result<JobRunReport> {
        tracing::info!("Running job {}", job);

        let result = match job {
            JobName::NotificationDrain => self.jobs.drain_notifications().await,
            JobName::OverdueDocumentScan => {
                let settings = self.settings.read().await.clone();
                self.jobs.scan_overdue_documents(&settings).await
            }
            JobName::RetentionCleanup => self.jobs.cleanup_notifications(self.retention_days).await,
        };

        match &result {
            Ok(report) => {
                tracing::info!(
                    "Job {} finished: processed={}, succeeded={}, failed={}",
                    job,
                    report.processed,
                    report.succeeded,
                    report.failed
                );
                self.last_runs.lock().await.insert(job, report.clone());
            }
            Err(e) => tracing::error!("Job {} failed: {}", job, e),
        }

        result
    }
}

/// Owns the job timers.
///
/// Each job runs on its own task with its own stop signal, so jobs can be
/// started, stopped and rescheduled independently. Stopping a job prevents
/// future runs but lets an in-flight run finish.
pub struct ComplianceScheduler {
    runner: JobRunner,
    drain_interval: Duration,
    cleanup_time: NaiveTime,
    handles: Mutex<HashMap<JobName, JobHandle>>,
    started: AtomicBool,
    generation: AtomicU64,
}

impl ComplianceScheduler {
    pub fn new(
        jobs: Arc<ComplianceJobs>,
        config: &SchedulerConfig,
        settings: SharedScheduleSettings,
    ) -> Self {
        Self {
            runner: JobRunner {
                jobs,
                settings,
                retention_days: config.retention_days,
                last_runs: Arc::new(Mutex::new(HashMap::new())),
            },
            drain_interval: config.notification_drain_interval,
            cleanup_time: config.retention_cleanup_time,
            handles: Mutex::new(HashMap::new()),
            started: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    fn schedule_for(&self, job: JobName, settings: &ScheduleSettings) -> JobSchedule {
        match job {
            JobName::NotificationDrain => JobSchedule::Every(self.drain_interval),
            JobName::OverdueDocumentScan => JobSchedule::DailyAt(settings.overdue_scan_time),
            JobName::RetentionCleanup => JobSchedule::DailyAt(self.cleanup_time),
        }
    }

    fn spawn_timer(&self, job: JobName, schedule: JobSchedule) -> JobHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let runner = self.runner.clone();

        let task = tokio::spawn(async move {
            tracing::info!("Job {} scheduled {}", job, schedule.describe());

            loop {
                let delay = schedule.delay_from(Utc::now());
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        // Errors are logged by the runner; the timer keeps going
                        let _ = runner.run(job).await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Job {} timer stopped", job);
        });

        JobHandle {
            stop_tx,
            task,
            schedule,
            generation: self.generation.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    /// Start every job timer. The overdue scan only starts when reminders are enabled.
    pub async fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
        let settings = self.runner.settings.read().await.clone();

        for job in JobName::ALL {
            if job == JobName::OverdueDocumentScan && !settings.enabled {
                tracing::info!("Overdue reminders disabled; {} not started", job);
                continue;
            }
            self.start_timer(job, &settings).await;
        }

        tracing::info!("Compliance scheduler started");
    }

    /// Stop every timer and wait for in-flight runs to finish
    pub async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        let handles: Vec<(JobName, JobHandle)> = self.handles.lock().await.drain().collect();

        for (job, handle) in handles {
            let _ = handle.stop_tx.send(true);
            if let Err(e) = handle.task.await {
                tracing::warn!("Job {} task ended abnormally: {}", job, e);
            }
        }

        tracing::info!("Compliance scheduler stopped");
    }

    async fn start_timer(&self, job: JobName, settings: &ScheduleSettings) {
        let mut handles = self.handles.lock().await;
        if handles.get(&job).is_some_and(|h| !h.task.is_finished()) {
            return;
        }
        let handle = self.spawn_timer(job, self.schedule_for(job, settings));
        handles.insert(job, handle);
    }

    /// Start one job's timer; a no-op when it is already running.
    ///
    /// The overdue scan cannot be started while reminders are disabled.
    pub async fn start_job(&self, job: JobName) -> Result<()> {
        let settings = self.runner.settings.read().await.clone();
        if job == JobName::OverdueDocumentScan && !settings.enabled {
            return Err(AppError::Conflict(
                "Overdue reminders are disabled; enable them in the schedule settings".to_string(),
            ));
        }
        self.start_timer(job, &settings).await;
        Ok(())
    }

    /// Stop one job's timer. Returns whether a timer was running.
    pub async fn stop_job(&self, job: JobName) -> bool {
        match self.handles.lock().await.remove(&job) {
            Some(handle) => {
                let _ = handle.stop_tx.send(true);
                tracing::info!("Job {} stop requested", job);
                true
            }
            None => false,
        }
    }

    /// Run a job now, outside its timer, and wait for the result
    pub async fn trigger_job(&self, job: JobName) -> Result<JobRunReport> {
        self.runner.run(job).await
    }

    pub async fn settings(&self) -> ScheduleSettings {
        self.runner.settings.read().await.clone()
    }

    /// Replace the reminder settings.
    ///
    /// Only the overdue scan's timer is replaced; other jobs keep running
    /// undisturbed.
    pub async fn update_schedule_settings(&self, settings: ScheduleSettings) -> Result<()> {
        settings.validate().map_err(AppError::Validation)?;

        *self.runner.settings.write().await = settings.clone();
        tracing::info!(
            "Schedule settings updated: enabled={}, overdue_scan_time={}, window={}d",
            settings.enabled,
            settings.overdue_scan_time.format("%H:%M"),
            settings.reminder_window_days
        );

        let job = JobName::OverdueDocumentScan;
        let was_running = self.stop_job(job).await;
        if settings.enabled && (was_running || self.started.load(Ordering::SeqCst)) {
            self.start_timer(job, &settings).await;
        }

        Ok(())
    }

    pub async fn get_job_status(&self) -> Vec<JobStatus> {
        let settings = self.runner.settings.read().await.clone();
        let handles = self.handles.lock().await;
        let last_runs = self.runner.last_runs.lock().await;

        JobName::ALL
            .into_iter()
            .map(|job| {
                let handle = handles.get(&job);
                let schedule = handle
                    .map(|h| h.schedule)
                    .unwrap_or_else(|| self.schedule_for(job, &settings));

                JobStatus {
                    name: job,
                    enabled: job != JobName::OverdueDocumentScan || settings.enabled,
                    running: handle.is_some_and(|h| !h.task.is_finished()),
                    schedule: schedule.describe(),
                    last_run: last_runs.get(&job).cloned(),
                }
            })
            .collect()
    }
}
