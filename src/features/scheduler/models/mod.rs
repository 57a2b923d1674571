mod job;

pub use job::{
    JobName, JobRunReport, JobSchedule, JobStatus, ScheduleSettings, SharedScheduleSettings,
};
