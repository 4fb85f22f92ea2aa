mod core;
mod groups;
mod projects;
mod users;

pub use self::core::GitLabClient;
