//! CRPT client - Rate-Limited Document Submission
//!
//! This crate implements a thread-safe client for the Chestny ZNAK (CRPT)
//! goods marking registry. Document submissions from any number of tasks
//! share a fixed-window rate limit: calls over the limit wait for the next
//! window instead of failing, so the registry never sees more than the
//! configured number of requests per window.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod ratelimit;
