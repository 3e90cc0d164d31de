//! Application-wide constants

/// Sliding TTL applied on every record write
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Cap on cached record count per partition
pub const DEFAULT_MAX_ITEMS: usize = 50_000;

/// Cap on total serialized span bytes per partition (32 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 32 * 1024 * 1024;

/// Partition actor mailbox depth
pub const PARTITION_MAILBOX_SIZE: usize = 64;

// Environment variable overrides
pub const ENV_TTL_SECS: &str = "HOTSPAN_TTL_SECS";
pub const ENV_MAX_ITEMS: &str = "HOTSPAN_MAX_ITEMS";
pub const ENV_MAX_BYTES: &str = "HOTSPAN_MAX_BYTES";
