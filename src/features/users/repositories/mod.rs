mod pg_user_directory;
mod user_directory;

pub use pg_user_directory::PgUserDirectory;
pub use user_directory::UserDirectory;
