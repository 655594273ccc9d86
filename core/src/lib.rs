//! Pipeline for turning untrusted LLM scan replies into validated
//! vulnerability findings.
//!
//! One [`Driver`] owns one file at a time: it posts the numbered source
//! to the gateway, salvages a findings array out of whatever text comes
//! back, runs a single repair round-trip when nothing validates, and
//! walks a bounded payload-shrink ladder when the gateway itself fails.
//! Parallelism is the caller's business — run several drivers over
//! disjoint file subsets; they share nothing.

mod client;
mod config;
mod driver;
mod error;
mod extract;
mod findings;
mod prompt;
mod shrink;
mod validate;

pub use client::ChatMessage;
pub use client::ChatRequest;
pub use client::GatewayClient;
pub use client::GatewayResponse;
pub use client::is_retryable_status;
pub use config::ConfigOverrides;
pub use config::ScanConfig;
pub use driver::Driver;
pub use driver::FileOutcome;
pub use error::Error;
pub use error::Result;
pub use extract::ExtractionAttempt;
pub use extract::Strategy;
pub use extract::extract;
pub use findings::Finding;
pub use findings::REQUIRED_KEYS;
pub use findings::SEVERITY_LABELS;
pub use findings::SNIPPET_CHAR_CAP;
pub use shrink::AttemptSpec;
pub use shrink::AttemptTier;
pub use shrink::plan_attempts;
pub use shrink::slice_ranges;
pub use validate::is_valid_finding;
pub use validate::promote;
pub use validate::valid_object_count;
