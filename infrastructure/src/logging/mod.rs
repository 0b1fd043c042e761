//! Logging infrastructure: provider usage accounting.
//!
//! Provides [`JsonlUsageLog`], a JSONL file writer, and [`UsageLedger`], an
//! in-memory per-model summary. Both implement the
//! [`UsageSink`](appforge_application::UsageSink) port.

mod jsonl_usage_log;
mod usage_ledger;

pub use jsonl_usage_log::JsonlUsageLog;
pub use usage_ledger::{FanOutUsageSink, ModelUsage, UsageLedger};
