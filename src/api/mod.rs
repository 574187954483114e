// Remote API facade

pub mod client;

pub use client::{ApiClient, LoginOutcome};
