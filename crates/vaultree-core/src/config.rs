use serde::{Deserialize, Serialize};

/// Per-database behavior settings carried in the container header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Soft-delete into a recycle-bin group instead of destroying nodes
    /// (default: true)
    pub recycle_bin_enabled: bool,
    /// Maximum prior versions kept per entry; negative means unlimited
    /// (default: 10)
    pub history_max_items: i32,
    /// Maximum total bytes of history per entry; negative means unlimited
    /// (default: 6 MiB)
    pub history_max_size: i64,
    pub memory_protection: MemoryProtection,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            recycle_bin_enabled: true,
            history_max_items: 10,
            history_max_size: 6 * 1024 * 1024,
            memory_protection: MemoryProtection::default(),
        }
    }
}

/// Which standard entry fields get in-memory protection by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryProtection {
    pub protect_title: bool,
    pub protect_username: bool,
    pub protect_password: bool,
    pub protect_url: bool,
    pub protect_notes: bool,
}

impl Default for MemoryProtection {
    fn default() -> Self {
        MemoryProtection {
            protect_title: false,
            protect_username: false,
            protect_password: true,
            protect_url: false,
            protect_notes: false,
        }
    }
}
