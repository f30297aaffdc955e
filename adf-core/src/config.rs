//! Configuration file management for adf-decode.
//!
//! Reads/writes `~/.adf-decode/config.yaml` with replay pacing and live
//! decoder settings. Command-line flags override whatever is loaded here.

use std::path::PathBuf;
use std::str::FromStr;

use crate::types::AdfError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stream: StreamConfig,
    pub decode: DecodeConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Seconds between replayed messages.
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Skip to the first ETX before decoding.
    pub sync: bool,
    pub format: OutputFormat,
}

/// How decoded records are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = AdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(AdfError::Config(format!("unknown output format: {other}"))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stream: StreamConfig { delay: 1.0 },
            decode: DecodeConfig {
                sync: true,
                format: OutputFormat::Text,
            },
        }
    }
}

/// Get the config directory path (`~/.adf-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".adf-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.adf-decode/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), "unreadable config, using defaults: {e}");
            return Config::default();
        }
    };

    parse_config(&text)
}

/// Save config to `~/.adf-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, AdfError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| AdfError::Config(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config);
    std::fs::write(&path, text).map_err(|e| AdfError::Config(e.to_string()))?;

    Ok(path)
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep
/// their defaults.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<&str> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = strip_quotes(val.trim());

        if !is_indented {
            current_section = if val.is_empty() { Some(key) } else { None };
            continue;
        }

        match (current_section, key) {
            (Some("stream"), "delay") => match val.parse::<f64>() {
                Ok(v) if v >= 0.0 => config.stream.delay = v,
                _ => tracing::warn!("ignoring stream.delay: {val:?}"),
            },
            (Some("decode"), "sync") => {
                if let Some(v) = parse_bool_value(val) {
                    config.decode.sync = v;
                }
            }
            (Some("decode"), "format") => {
                if let Ok(v) = val.parse() {
                    config.decode.format = v;
                }
            }
            _ => {}
        }
    }

    config
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool_value(val: &str) -> Option<bool> {
    match val {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let lines = vec![
        "# adf-decode configuration".to_string(),
        String::new(),
        "stream:".into(),
        format!("  delay: {}", config.stream.delay),
        String::new(),
        "decode:".into(),
        format!("  sync: {}", config.decode.sync),
        format!("  format: \"{}\"", config.decode.format),
    ];

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stream.delay, 1.0);
        assert!(config.decode.sync);
        assert_eq!(config.decode.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
# comment
stream:
  delay: 0.25

decode:
  sync: false
  format: "json"
"#;
        let config = parse_config(text);
        assert_eq!(config.stream.delay, 0.25);
        assert!(!config.decode.sync);
        assert_eq!(config.decode.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_config_rejects_negative_delay() {
        let config = parse_config("stream:\n  delay: -2\n");
        assert_eq!(config.stream.delay, 1.0);
    }

    #[test]
    fn test_parse_config_ignores_unknown() {
        let text = "receiver:\n  name: x\ndecode:\n  format: xml\n  sync: maybe\n";
        assert_eq!(parse_config(text), Config::default());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            stream: StreamConfig { delay: 2.5 },
            decode: DecodeConfig {
                sync: false,
                format: OutputFormat::Json,
            },
        };
        let text = serialize_config(&config);
        assert_eq!(parse_config(&text), config);
    }
}
