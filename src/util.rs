/// Utility helpers used across the collector.
///
/// This module contains:
/// - Record id generation
/// - Small format conversion utilities for logging
///
/// IMPORTANT:
/// - No fetch or storage business logic should live here.
/// - This module must remain lightweight and dependency-free apart
///   from the id source.
///

const MIB: u64 = 1024 * 1024;

/// Returns a fresh random record identifier.
///
/// Format:
///     128 random bits, lowercase hex, fixed 32 characters
///
/// Collisions are not checked anywhere; at 128 bits they are not a
/// practical concern for an append-only snapshot archive.
pub fn entry_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Converts a byte count into whole mebibytes, rounding down.
///
/// Used for free-space log lines, where operators think in MiB but
/// the probe reports bytes.
pub fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / MIB
}
