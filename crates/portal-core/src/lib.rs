//! Shared service plumbing for portal services.
//!
//! Nothing in here knows about OTPs or sessions; it is the HTTP and observability
//! scaffolding every service binary starts from.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
