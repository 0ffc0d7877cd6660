//! Utility modules for fault tolerance and resilience

pub mod env;
pub mod logging;
pub mod retry;
pub mod time;
pub mod timeout;

// Re-export commonly used items
pub use env::{env_int, env_opt};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
pub use retry::{retry_if_retryable, IsRetryable, RetryConfig};
pub use time::current_timestamp;
pub use timeout::{with_custom_timeout, DEFAULT_NETWORK_TIMEOUT};
