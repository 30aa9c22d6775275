use crate::core::{Result, StateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which storage engine backs player rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineKind {
    /// Process memory only
    Memory,
    /// One file per row under `path`
    File { path: PathBuf },
}

/// Store configuration
///
/// Mirrors the `Database` block of the server config:
///
/// ```json
/// { "type": "file", "path": "players/" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub engine: EngineKind,
}

impl StoreConfig {
    /// Create an in-memory store configuration
    pub fn memory() -> Self {
        Self {
            engine: EngineKind::Memory,
        }
    }

    /// Create a file store configuration rooted at `path`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            engine: EngineKind::File {
                path: path.as_ref().to_path_buf(),
            },
        }
    }

    /// Set the engine
    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Parse from store URL
    ///
    /// Format: `memory://` or `file://<path>`
    ///
    /// # Examples
    ///
    /// ```
    /// # use perworld::StoreConfig;
    /// let config = StoreConfig::from_url("file://data/players").unwrap();
    /// assert_eq!(config, StoreConfig::file("data/players"));
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| StateError::Config(format!("'{}' is not a store URL", url)))?;

        let config = match scheme {
            "memory" if rest.is_empty() => Self::memory(),
            "memory" => {
                return Err(StateError::Config(
                    "memory:// takes no path".to_string(),
                ));
            }
            "file" => Self::file(rest),
            other => {
                return Err(StateError::Config(format!(
                    "Unknown store engine '{}'",
                    other
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Convert to store URL
    pub fn to_url(&self) -> String {
        match &self.engine {
            EngineKind::Memory => "memory://".to_string(),
            EngineKind::File { path } => format!("file://{}", path.display()),
        }
    }

    /// Parse from the JSON `Database` config block
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let EngineKind::File { path } = &self.engine {
            if path.as_os_str().is_empty() {
                return Err(StateError::Config(
                    "File store path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(StoreConfig::from_url("memory://").unwrap(), StoreConfig::memory());
        assert_eq!(
            StoreConfig::from_url("file:///var/lib/players").unwrap(),
            StoreConfig::file("/var/lib/players")
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(StoreConfig::from_url("players").is_err());
        assert!(StoreConfig::from_url("mysql://localhost").is_err());
        assert!(StoreConfig::from_url("file://").is_err());
        assert!(StoreConfig::from_url("memory://somewhere").is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let config = StoreConfig::file("data/players");
        assert_eq!(StoreConfig::from_url(&config.to_url()).unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let file = StoreConfig::from_json(r#"{"type": "file", "path": "players"}"#).unwrap();
        assert_eq!(file, StoreConfig::file("players"));

        let memory = StoreConfig::from_json(r#"{"type": "memory"}"#).unwrap();
        assert_eq!(memory, StoreConfig::memory());

        assert!(StoreConfig::from_json(r#"{"type": "sqlite"}"#).is_err());
        assert!(StoreConfig::from_json(r#"{"type": "file", "path": ""}"#).is_err());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::default().engine(EngineKind::File {
            path: PathBuf::from("x"),
        });
        assert_eq!(config, StoreConfig::file("x"));
    }
}
