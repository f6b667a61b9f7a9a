pub mod config_loader;
pub mod constants;

pub use config_loader::*;
pub use constants::*;

/// Milliseconds since the unix epoch, the timestamp unit used by every
/// persisted record.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
