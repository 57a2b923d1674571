mod compliance_scheduler;

pub use compliance_scheduler::ComplianceScheduler;
