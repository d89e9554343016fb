// Handles interactions with the config file

use std::{fs, path::PathBuf};

use serde_json::Value;
use storyline_logger::Logger;

pub const CONFIG_FILE_NAME: &str = "storyline.json";

#[derive(Debug, Default, PartialEq)]
pub struct ConfigValues {
    pub exclude: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    /// Directory, relative to a component's own directory, that fixtures are written to.
    pub stories_dir: Option<String>,
    pub runtime_module: Option<String>,
    pub adapter_name: Option<String>,
}

pub struct Config;

impl Config {
    /// Reads the config file and returns values
    pub fn read(path: PathBuf) -> Option<ConfigValues> {
        if !path.exists() {
            Logger::debug(&format!("No config file at {}", path.display()), 2);
            return None;
        }

        let config = match fs::read_to_string(&path) {
            Ok(config) => config,
            Err(err) => {
                Logger::error("Failed to read config file");
                Logger::error(&err.to_string());
                return None;
            }
        };

        match serde_json::from_str::<Value>(&config) {
            Ok(value) => Some(ConfigValues {
                exclude: value.get("exclude").map(Self::get_array_of_strings),
                include: value.get("include").map(Self::get_array_of_strings),
                stories_dir: Self::get_string(&value, "storiesDir"),
                runtime_module: Self::get_string(&value, "runtimeModule"),
                adapter_name: Self::get_string(&value, "adapterName"),
            }),
            Err(err) => {
                Logger::error("Failed to parse config file");
                Logger::error(&err.to_string());
                None
            }
        }
    }

    /// Maps a Value to an array of strings
    fn get_array_of_strings(value: &Value) -> Vec<String> {
        value
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Non-empty string value of `key`
    fn get_string(value: &Value, key: &str) -> Option<String> {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::create_mock_project;

    use super::*;

    #[test]
    fn test_config_read() {
        let temp_dir = create_mock_project(&vec![(
            "storyline.json",
            r#"{"exclude": ["test.tsx"], "include": ["test.tsx"], "storiesDir": "__stories__", "runtimeModule": "@acme/runtime", "adapterName": "track"}"#,
        )]);
        let config = Config::read(temp_dir.path().join(CONFIG_FILE_NAME));

        assert_eq!(
            config,
            Some(ConfigValues {
                exclude: Some(vec!["test.tsx".to_string()]),
                include: Some(vec!["test.tsx".to_string()]),
                stories_dir: Some("__stories__".to_string()),
                runtime_module: Some("@acme/runtime".to_string()),
                adapter_name: Some("track".to_string()),
            })
        );
    }

    #[test]
    fn test_config_read_no_config() {
        let temp_dir = create_mock_project(&vec![]);
        let config = Config::read(temp_dir.path().join(CONFIG_FILE_NAME));

        assert_eq!(config, None);
    }

    #[test]
    fn test_config_read_invalid_config() {
        let temp_dir = create_mock_project(&vec![("storyline.json", r#"{"]ht["te)}"#)]);
        let config = Config::read(temp_dir.path().join(CONFIG_FILE_NAME));

        assert_eq!(config, None);
    }

    #[test]
    fn test_config_partial() {
        let temp_dir = create_mock_project(&vec![(
            "storyline.json",
            r#"{"exclude": ["**/*.test.tsx", 3], "storiesDir": "  "}"#,
        )]);
        let config = Config::read(temp_dir.path().join(CONFIG_FILE_NAME));

        assert_eq!(
            config,
            Some(ConfigValues {
                exclude: Some(vec!["**/*.test.tsx".to_string()]),
                ..ConfigValues::default()
            })
        );
    }
}
