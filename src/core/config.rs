use chrono::NaiveTime;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub minio: MinIOConfig,
    pub mail: MailConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for uploaded document files
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix under which every document file is stored
    pub document_prefix: String,
}

/// Outbound mail relay configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP endpoint of the mail relay; mail is disabled when unset
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
    pub timeout: Duration,
}

/// Settings for the compliance scheduler jobs
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Master switch: when false no job timers are started
    pub enabled: bool,
    /// Whether the overdue-document scan runs on its timer
    pub reminders_enabled: bool,
    pub notification_drain_interval: Duration,
    /// Daily UTC time of the overdue-document scan
    pub overdue_scan_time: NaiveTime,
    /// Daily UTC time of the retention cleanup
    pub retention_cleanup_time: NaiveTime,
    pub retention_days: u32,
    /// Students registered more recently than this are not reminded about yet
    pub reminder_window_days: i64,
    /// Staff roles that receive overdue-document reminders
    pub notify_roles: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            mail: MailConfig::from_env()?,
            scheduler: SchedulerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = parse_list(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("AUTH_ISSUER")
            .map_err(|_| "AUTH_ISSUER environment variable is required".to_string())?;

        let audience = env::var("AUTH_AUDIENCE")
            .map_err(|_| "AUTH_AUDIENCE environment variable is required".to_string())?;

        let jwks_cache_ttl_secs = parse_or("JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?;
        let jwt_leeway_secs = parse_or("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            issuer,
            audience,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Compliance Documents API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Student compliance document tracking and reminders".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            endpoint: env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            access_key: env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: env::var("MINIO_BUCKET")
                .unwrap_or_else(|_| "compliance-documents".to_string()),
            region: env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            document_prefix: env::var("MINIO_DOCUMENT_PREFIX")
                .unwrap_or_else(|_| "documents".to_string()),
        })
    }
}

impl MailConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let api_url = env::var("MAIL_API_URL").ok().filter(|s| !s.is_empty());
        let api_key = env::var("MAIL_API_KEY").ok().filter(|s| !s.is_empty());
        let from_address = env::var("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|_| "no-reply@international.example.edu".to_string());
        let timeout_secs = parse_or("MAIL_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            api_key,
            from_address,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl SchedulerConfig {
    const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 300; // 5 minutes
    const DEFAULT_OVERDUE_SCAN_TIME: &'static str = "09:00";
    const DEFAULT_RETENTION_CLEANUP_TIME: &'static str = "02:00";
    const DEFAULT_RETENTION_DAYS: u32 = 90;
    const DEFAULT_REMINDER_WINDOW_DAYS: i64 = 7;
    pub const MAX_REMINDER_WINDOW_DAYS: i64 = 365;
    const DEFAULT_NOTIFY_ROLES: &'static str = "unit_admin,reviewer";

    pub fn from_env() -> Result<Self, String> {
        let enabled = parse_flag("SCHEDULER_ENABLED", true);
        let reminders_enabled = parse_flag("REMINDERS_ENABLED", true);

        let drain_secs = parse_or(
            "NOTIFICATION_DRAIN_INTERVAL_SECS",
            Self::DEFAULT_DRAIN_INTERVAL_SECS,
        )?;
        if drain_secs == 0 {
            return Err("NOTIFICATION_DRAIN_INTERVAL_SECS must be greater than 0".to_string());
        }

        let overdue_scan_time = parse_time(
            "OVERDUE_SCAN_TIME",
            &env::var("OVERDUE_SCAN_TIME")
                .unwrap_or_else(|_| Self::DEFAULT_OVERDUE_SCAN_TIME.to_string()),
        )?;
        let retention_cleanup_time = parse_time(
            "RETENTION_CLEANUP_TIME",
            &env::var("RETENTION_CLEANUP_TIME")
                .unwrap_or_else(|_| Self::DEFAULT_RETENTION_CLEANUP_TIME.to_string()),
        )?;

        let notify_roles = parse_list(
            &env::var("REMINDER_NOTIFY_ROLES")
                .unwrap_or_else(|_| Self::DEFAULT_NOTIFY_ROLES.to_string()),
        );

        Ok(Self {
            enabled,
            reminders_enabled,
            notification_drain_interval: Duration::from_secs(drain_secs),
            overdue_scan_time,
            retention_cleanup_time,
            retention_days: parse_or("NOTIFICATION_RETENTION_DAYS", Self::DEFAULT_RETENTION_DAYS)?,
            reminder_window_days: check_reminder_window(parse_or(
                "REMINDER_WINDOW_DAYS",
                Self::DEFAULT_REMINDER_WINDOW_DAYS,
            )?)?,
            notify_roles,
        })
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminders_enabled: true,
            notification_drain_interval: Duration::from_secs(Self::DEFAULT_DRAIN_INTERVAL_SECS),
            overdue_scan_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            retention_cleanup_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
            retention_days: Self::DEFAULT_RETENTION_DAYS,
            reminder_window_days: Self::DEFAULT_REMINDER_WINDOW_DAYS,
            notify_roles: parse_list(Self::DEFAULT_NOTIFY_ROLES),
        }
    }
}

/// Reminder grace window in days, limited to `0..=MAX_REMINDER_WINDOW_DAYS`
pub fn check_reminder_window(days: i64) -> Result<i64, String> {
    if (0..=SchedulerConfig::MAX_REMINDER_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(format!(
            "REMINDER_WINDOW_DAYS must be between 0 and {}",
            SchedulerConfig::MAX_REMINDER_WINDOW_DAYS
        ))
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", key))
}

fn parse_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(default)
}

/// Parse a comma-separated list, dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse an "HH:MM" time of day
pub fn parse_time(key: &str, raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| format!("{} must be a time in HH:MM format", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_list(" unit_admin, reviewer ,,"),
            vec!["unit_admin".to_string(), "reviewer".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("T", "09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_time("T", "25:00").is_err());
        assert!(parse_time("T", "nine").is_err());
    }

    #[test]
    fn test_reminder_window_bounds() {
        assert_eq!(check_reminder_window(0), Ok(0));
        assert_eq!(check_reminder_window(365), Ok(365));
        assert!(check_reminder_window(-1).is_err());
        assert!(check_reminder_window(i64::MAX).is_err());
    }
}
