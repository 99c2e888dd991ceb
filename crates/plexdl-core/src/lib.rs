pub mod config;
pub mod logging;

pub mod coordinator;
pub mod error;
pub mod library;
pub mod naming;
pub mod run_log;
pub mod scheduler;
pub mod worker;
