//! Console event formatter
//!
//! One `Runtime.consoleAPICalled` event becomes one `LogEntry`. Formatting
//! never fails; every missing field has a fixed fallback.

use super::value::serialize;
use super::Limits;
use crate::constants::ANONYMOUS_FUNCTION;
use crate::logging::{LogEntry, LogLevel};
use crate::protocol::{ConsoleApiCalled, ProtocolValue, StackTrace};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Format raw event parameters captured at `timestamp`
pub fn format_params(params: &Value, limits: &Limits, timestamp: DateTime<Utc>) -> LogEntry {
    format_event(&ConsoleApiCalled::from_params(params), limits, timestamp)
}

/// Format a decoded console event captured at `timestamp`
pub fn format_event(
    event: &ConsoleApiCalled,
    limits: &Limits,
    timestamp: DateTime<Utc>,
) -> LogEntry {
    let level = event
        .kind
        .as_deref()
        .map(LogLevel::parse)
        .unwrap_or(LogLevel::Log);

    let mut text = event
        .args
        .iter()
        .map(|arg| {
            let value = arg.clone().map(ProtocolValue::from);
            serialize(value.as_ref(), 0, limits)
        })
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(call_site) = format_call_site(event.stack_trace.as_ref()) {
        text.push_str(&call_site);
    }

    LogEntry::new(timestamp, level, text)
}

/// `\n    at fn (url:line:col)` for the innermost frame, 1-based
fn format_call_site(trace: Option<&StackTrace>) -> Option<String> {
    let frame = trace?.call_frames.first()?;

    let function = if frame.function_name.is_empty() {
        ANONYMOUS_FUNCTION
    } else {
        frame.function_name.as_str()
    };

    Some(format!(
        "\n    at {} ({}:{}:{})",
        function,
        frame.url,
        frame.line_number.saturating_add(1),
        frame.column_number.saturating_add(1)
    ))
}
