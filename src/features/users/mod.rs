//! User directory.
//!
//! Identity and account management live outside this service; the engine
//! only reads who a user is (email, role, unit, active flag) through the
//! [`UserDirectory`] port.

pub mod models;
pub mod repositories;

pub use models::{DirectoryUser, Role};
pub use repositories::{PgUserDirectory, UserDirectory};
