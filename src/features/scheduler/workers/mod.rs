mod compliance_jobs;

pub use compliance_jobs::ComplianceJobs;
