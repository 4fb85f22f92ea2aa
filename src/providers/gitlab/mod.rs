pub mod client;
pub mod resolver;
pub mod types;
