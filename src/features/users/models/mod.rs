mod user;

pub use user::{DirectoryUser, Role};
