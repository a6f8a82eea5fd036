pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::{ImportRecord, TaskService};
