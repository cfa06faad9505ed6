use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML overrides for [`super::CacheSettings`].
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub project_id: Option<i64>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cache_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "https://catmaid.example.org"
project_id = 4
api_token = "abc123"
cache_timeout_secs = 120
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(
            config.base_url,
            Some("https://catmaid.example.org".to_string())
        );
        assert_eq!(config.project_id, Some(4));
        assert_eq!(config.api_token, Some("abc123".to_string()));
        assert_eq!(config.cache_timeout_secs, Some(120));
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_load_empty_config() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.base_url.is_none());
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_load_missing_file_error() {
        let result = FileConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_load_invalid_toml_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = [not toml").unwrap();

        let result = FileConfig::load(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }
}
