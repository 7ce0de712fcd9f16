//! Client core of the ForgeIQ monitoring dashboard: fetch, cache, invalidate, act.

pub mod actions;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod models;
pub mod overview;
pub mod scheduler;
pub mod tasks;
pub mod transport;

pub use dashboard::Dashboard;
pub use error::ClientError;
