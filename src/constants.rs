//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Value serialization
// =============================================================================

/// Maximum nesting depth followed when rendering previews
pub const MAX_DEPTH: usize = 10;

/// Maximum characters kept from a string value
pub const MAX_STRING_LEN: usize = 10_000;

/// Maximum elements rendered for an array-like preview
pub const MAX_ARRAY_ITEMS: usize = 100;

/// Rendered in place of anything nested deeper than `MAX_DEPTH`
pub const DEPTH_SENTINEL: &str = "[Max depth exceeded]";

/// Appended to strings cut at `MAX_STRING_LEN`
pub const TRUNCATION_SUFFIX: &str = "...[truncated]";

/// Appended inside a container when more elements exist than were rendered
pub const OVERFLOW_MARKER: &str = ", ...";

/// Rendered for a symbol without description
pub const SYMBOL_PLACEHOLDER: &str = "Symbol()";

/// Rendered for a function without description
pub const FUNCTION_PLACEHOLDER: &str = "[Function]";

/// Rendered for a call frame without function name
pub const ANONYMOUS_FUNCTION: &str = "(anonymous)";

// =============================================================================
// Log buffer
// =============================================================================

/// Maximum log entries kept in the buffer
pub const MAX_LOG_ENTRIES: usize = 10_000;

// =============================================================================
// Timing - Auto-save
// =============================================================================

/// Default interval between auto-save ticks (seconds)
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

/// Minimum interval between auto-save ticks (seconds)
pub const MIN_FLUSH_INTERVAL_SECS: u64 = 5;

/// Interval between persistence passes of a dirty buffer (milliseconds)
pub const PERSIST_INTERVAL_MS: u64 = 1000;

/// Shutdown flag polling period of the runner loop (milliseconds)
pub const SHUTDOWN_POLL_MS: u64 = 100;

/// How often the binary checks whether the capture ended on its own (milliseconds)
pub const CAPTURE_POLL_MS: u64 = 500;

// =============================================================================
// Output
// =============================================================================

/// Default export file name
pub const DEFAULT_FILENAME: &str = "console-logs.txt";

/// Default path of the persistent key-value store
pub const DEFAULT_STORE_PATH: &str = "console-capture.json";

// =============================================================================
// Remote debugging
// =============================================================================

/// Default host of the remote-debugging endpoint
pub const DEFAULT_DEBUG_HOST: &str = "127.0.0.1";

/// Default port of the remote-debugging endpoint
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Protocol event carrying console API calls
pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";

// =============================================================================
// Buffers
// =============================================================================

/// Channel capacity for async message passing
pub const CHANNEL_CAPACITY: usize = 256;
