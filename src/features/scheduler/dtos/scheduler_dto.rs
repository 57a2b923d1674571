use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::config::parse_time;
use crate::core::error::AppError;
use crate::features::scheduler::models::ScheduleSettings;
use crate::features::users::Role;

/// Reminder settings as exchanged over HTTP
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ScheduleSettingsDto {
    pub enabled: bool,
    /// Daily UTC time of the overdue scan, "HH:MM"
    #[schema(example = "09:00")]
    pub overdue_scan_time: String,
    #[validate(range(min = 0, max = 365, message = "reminder_window_days must be 0-365"))]
    pub reminder_window_days: i64,
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub notify_roles: Vec<Role>,
}

impl TryFrom<ScheduleSettingsDto> for ScheduleSettings {
    type Error = AppError;

    fn try_from(dto: ScheduleSettingsDto) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: dto.enabled,
            overdue_scan_time: parse_time("overdue_scan_time", &dto.overdue_scan_time)
                .map_err(AppError::Validation)?,
            reminder_window_days: dto.reminder_window_days,
            notify_roles: dto.notify_roles,
        })
    }
}

impl From<ScheduleSettings> for ScheduleSettingsDto {
    fn from(settings: ScheduleSettings) -> Self {
        Self {
            enabled: settings.enabled,
            overdue_scan_time: settings.overdue_scan_time.format("%H:%M").to_string(),
            reminder_window_days: settings.reminder_window_days,
            notify_roles: settings.notify_roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_dto_converts_time() {
        let dto = ScheduleSettingsDto {
            enabled: true,
            overdue_scan_time: "07:45".to_string(),
            reminder_window_days: 3,
            notify_roles: vec![Role::Reviewer],
        };
        let settings = ScheduleSettings::try_from(dto).unwrap();
        assert_eq!(
            settings.overdue_scan_time,
            NaiveTime::from_hms_opt(7, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_dto_rejects_bad_time() {
        let dto = ScheduleSettingsDto {
            enabled: true,
            overdue_scan_time: "7pm".to_string(),
            reminder_window_days: 3,
            notify_roles: vec![Role::Reviewer],
        };
        assert!(matches!(
            ScheduleSettings::try_from(dto),
            Err(AppError::Validation(_))
        ));
    }
}
