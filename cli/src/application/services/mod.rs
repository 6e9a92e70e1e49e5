//! Application services: use-case orchestration over port traits.

pub mod provision;

pub use provision::{CANCELLED_WARNING, ProvisionOutcome, provision};
