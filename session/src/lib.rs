//! Session collaborator for the analysis client: auth-refresh trigger,
//! session probe, and refresh throttling.

pub mod config;
pub mod store;
pub mod throttle;
