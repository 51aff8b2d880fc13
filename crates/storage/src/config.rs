use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Connection settings applied when a store is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub journal_mode: JournalMode,
    pub busy_timeout_ms: u32,
    pub cache_size_kib: u32,
    /// Reference columns rely on this to reject dangling ids at write time.
    pub foreign_keys: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            cache_size_kib: 32000,
            foreign_keys: true,
        }
    }
}

impl StoreConfig {
    pub(crate) fn pragmas(&self) -> String {
        format!(
            "
            PRAGMA journal_mode = {};
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = {};
            PRAGMA cache_size = -{};
            PRAGMA busy_timeout = {};
            ",
            self.journal_mode.as_str(),
            if self.foreign_keys { "ON" } else { "OFF" },
            self.cache_size_kib,
            self.busy_timeout_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() -> Result<(), serde_json::Error> {
        let config: StoreConfig = serde_json::from_str(r#"{"journal_mode": "delete", "busy_timeout_ms": 250}"#)?;
        assert_eq!(config.journal_mode, JournalMode::Delete);
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.cache_size_kib, 32000);
        assert!(config.foreign_keys);
        Ok(())
    }

    #[test]
    fn pragmas_reflect_settings() {
        let config = StoreConfig {
            foreign_keys: false,
            ..StoreConfig::default()
        };
        let sql = config.pragmas();
        assert!(sql.contains("journal_mode = WAL"));
        assert!(sql.contains("foreign_keys = OFF"));
        assert!(sql.contains("cache_size = -32000"));
    }
}
