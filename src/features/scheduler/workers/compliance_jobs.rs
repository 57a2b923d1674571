use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use minijinja::context;
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::completion::CompletionService;
use crate::features::document_types::models::DocumentType;
use crate::features::notifications::models::{NewNotification, NotificationStatus};
use crate::features::notifications::NotificationCenter;
use crate::features::scheduler::models::{JobName, JobRunReport, ScheduleSettings};
use crate::features::users::{DirectoryUser, UserDirectory};
use crate::shared::templates::{render_message, MessageTemplate};

/// Bodies of the scheduled jobs. Timers live in the scheduler service.
pub struct ComplianceJobs {
    notifications: Arc<NotificationCenter>,
    completion: Arc<CompletionService>,
    directory: Arc<dyn UserDirectory>,
}

impl ComplianceJobs {
    pub fn new(
        notifications: Arc<NotificationCenter>,
        completion: Arc<CompletionService>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            notifications,
            completion,
            directory,
        }
    }

    /// Deliver every pending notification whose scheduled time has passed.
    ///
    /// One failing item never stops the batch.
    pub async fn drain_notifications(&self) -> Result<JobRunReport> {
        let mut report = JobRunReport::begin(JobName::NotificationDrain);
        let due = self.notifications.find_pending_scheduled().await?;

        if !due.is_empty() {
            tracing::info!("Delivering {} scheduled notifications", due.len());
        }

        for notification in due {
            match self.notifications.deliver(&notification).await {
                Ok(delivered) => match delivered.status {
                    NotificationStatus::Sent => report.record(true),
                    NotificationStatus::Failed => report.record(false),
                    // read or otherwise settled since the batch was loaded
                    _ => tracing::debug!("Notification {} no longer pending", delivered.id),
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to record delivery of notification {}: {}",
                        notification.id,
                        e
                    );
                    report.record(false);
                }
            }
        }

        Ok(report.finish())
    }

    /// Remind unit staff about required documents students have not supplied.
    ///
    /// Creates one system notification per (staff member, missing type).
    /// Nothing is deduplicated against earlier runs, so an open gap is
    /// reported again on every run.
    pub async fn scan_overdue_documents(
        &self,
        settings: &ScheduleSettings,
    ) -> Result<JobRunReport> {
        let mut report = JobRunReport::begin(JobName::OverdueDocumentScan);

        let required = self.completion.required_types().await?;
        if required.is_empty() {
            tracing::info!("No required document types; overdue scan skipped");
            return Ok(report.finish());
        }

        let students = self.directory.list_active_students().await?;
        let registered_before = Duration::try_days(settings.reminder_window_days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "reminder_window_days {} is out of range",
                    settings.reminder_window_days
                ))
            })?;
        let mut staff_by_unit: HashMap<Uuid, Vec<DirectoryUser>> = HashMap::new();
        let mut created = 0u64;

        for student in students
            .iter()
            .filter(|s| s.created_at <= registered_before)
        {
            match self
                .remind_for_student(student, &required, settings, &mut staff_by_unit)
                .await
            {
                Ok(count) => {
                    created += count;
                    report.record(true);
                }
                Err(e) => {
                    tracing::error!("Overdue scan failed for student {}: {}", student.id, e);
                    report.record(false);
                }
            }
        }

        tracing::info!(
            "Overdue scan checked {} students and created {} reminders",
            report.processed,
            created
        );
        Ok(report.finish())
    }

    async fn remind_for_student(
        &self,
        student: &DirectoryUser,
        required: &[DocumentType],
        settings: &ScheduleSettings,
        staff_by_unit: &mut HashMap<Uuid, Vec<DirectoryUser>>,
    ) -> Result<u64> {
        let completion = self
            .completion
            .report_with_catalog(student.id, required)
            .await?;
        let mut created = 0;

        for missing in &completion.missing_types {
            if !staff_by_unit.contains_key(&missing.owning_unit_id) {
                let staff = self
                    .directory
                    .list_active_staff(missing.owning_unit_id, &settings.notify_roles)
                    .await?;
                staff_by_unit.insert(missing.owning_unit_id, staff);
            }
            let staff = staff_by_unit
                .get(&missing.owning_unit_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for member in staff {
                let message = render_message(
                    MessageTemplate::OverdueReminder,
                    &context! {
                        recipient_name => &member.full_name,
                        student_name => &student.full_name,
                        type_name => &missing.name,
                        completion_rate => completion.completion_rate,
                    },
                )
                .map_err(|e| AppError::Internal(e.to_string()))?;

                let notification = NewNotification::system(member.id, message.title, message.body)
                    .with_metadata(json!({
                        "reminder": "overdue_document",
                        "student_id": student.id,
                        "type_id": missing.type_id,
                        "completion_rate": completion.completion_rate,
                    }));
                self.notifications.create(notification).await?;
                created += 1;
            }
        }

        Ok(created)
    }

    /// Delete read notifications older than `retention_days`
    pub async fn cleanup_notifications(&self, retention_days: u32) -> Result<JobRunReport> {
        let mut report = JobRunReport::begin(JobName::RetentionCleanup);
        let deleted = self.notifications.cleanup(retention_days).await?;
        report.processed = deleted;
        report.succeeded = deleted;
        Ok(report.finish())
    }
}
