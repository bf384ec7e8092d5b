pub mod config;
pub mod logging;

pub mod error;
pub mod execution;
pub mod jobspec;
pub mod runlog;
pub mod scheduler;
pub mod staging;
