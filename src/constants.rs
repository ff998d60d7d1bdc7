// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 23399;
pub const WS_PATH: &str = "ws";
pub const HEALTH_PATH: &str = "health";

// Connection limits
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10_000;
pub const DEFAULT_OUTBOUND_QUEUE: usize = 64;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 2_000;

// Overlay display defaults
pub const DEFAULT_ENVELOPE_DURATION_MS: i32 = 3_000;
pub const DEFAULT_MESSAGE_DURATION_MS: i32 = 5_000;
pub const DEFAULT_NOTIFICATION_DURATION_MS: i32 = 9_000;
pub const DEFAULT_USER_COLOR: &str = "#a970ff";
