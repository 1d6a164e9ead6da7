use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en-US";

pub const ENV_BASE_URL: &str = "TMDB_BASE_URL";
pub const ENV_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_IMAGE_BASE_URL: &str = "TMDB_IMAGE_BASE_URL";
pub const ENV_LANGUAGE: &str = "TMDB_LANGUAGE";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting `{key}`")]
    Missing { key: &'static str },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub api_base_url: String,
    pub api_key: String,
    pub image_base_url: String,
    pub language: String,
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("movix")
                .join("config.json")
        })
    }

    /// Reads the settings file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Option<Self>, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = read(ENV_BASE_URL) {
            self.api_base_url = v;
        }
        if let Some(v) = read(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Some(v) = read(ENV_IMAGE_BASE_URL) {
            self.image_base_url = v;
        }
        if let Some(v) = read(ENV_LANGUAGE) {
            self.language = v;
        }
        self
    }

    pub fn validated(self) -> Result<Self, SettingsError> {
        let required = |value: String, key: &'static str| {
            let value = value.trim().trim_end_matches('/').to_string();
            if value.is_empty() {
                Err(SettingsError::Missing { key })
            } else {
                Ok(value)
            }
        };
        let language = if self.language.trim().is_empty() {
            String::from(DEFAULT_LANGUAGE)
        } else {
            self.language.trim().to_string()
        };
        Ok(Self {
            api_base_url: required(self.api_base_url, ENV_BASE_URL)?,
            api_key: required(self.api_key, ENV_API_KEY)?,
            image_base_url: required(self.image_base_url, ENV_IMAGE_BASE_URL)?,
            language,
        })
    }

    pub fn resolve() -> Result<Self, SettingsError> {
        let from_file = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => None,
        };
        from_file
            .unwrap_or_default()
            .apply_env_with(|key| std::env::var(key).ok())
            .validated()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_values_fill_empty_settings() {
        let settings = AppSettings::default()
            .apply_env_with(env(&[
                (ENV_BASE_URL, "https://api.themoviedb.org/3/"),
                (ENV_API_KEY, "secret"),
                (ENV_IMAGE_BASE_URL, "https://image.tmdb.org/t/p"),
            ]))
            .validated()
            .unwrap();

        assert_eq!(settings.api_base_url, "https://api.themoviedb.org/3");
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.image_base_url, "https://image.tmdb.org/t/p");
        assert_eq!(settings.language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let file = AppSettings {
            api_base_url: String::from("https://file.example/3"),
            api_key: String::from("from-file"),
            image_base_url: String::from("https://file.example/img"),
            language: String::from("es-ES"),
        };

        let settings = file
            .apply_env_with(env(&[(ENV_API_KEY, "from-env"), (ENV_LANGUAGE, "  ")]))
            .validated()
            .unwrap();

        assert_eq!(settings.api_key, "from-env");
        assert_eq!(settings.api_base_url, "https://file.example/3");
        assert_eq!(settings.language, "es-ES");
    }

    #[test]
    fn test_missing_credential_is_startup_failure() {
        let result = AppSettings::default()
            .apply_env_with(env(&[
                (ENV_BASE_URL, "https://api.themoviedb.org/3"),
                (ENV_IMAGE_BASE_URL, "https://image.tmdb.org/t/p"),
            ]))
            .validated();

        assert!(matches!(
            result,
            Err(SettingsError::Missing { key: ENV_API_KEY })
        ));
    }

    #[test]
    fn test_partial_settings_file_parses() {
        let dir = std::env::temp_dir().join(format!("movix-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"api_key":"abc"}"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap().unwrap();

        assert_eq!(settings.api_key, "abc");
        assert!(settings.api_base_url.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_absent_settings_file_is_none() {
        let path = std::env::temp_dir().join("movix-settings-does-not-exist.json");

        assert!(AppSettings::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn test_invalid_settings_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("movix-settings-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let result = AppSettings::load_from(&path);

        assert!(matches!(result, Err(SettingsError::Parse { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
