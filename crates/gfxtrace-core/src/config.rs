// SPDX-License-Identifier: CEPL-1.0
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "gfxtrace.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CaptureCfg {
    /// File name stem of the trace log; `.bin` is appended.
    #[serde(default = "default_log_stem")]
    pub log_stem: String,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReplayCfg {
    #[serde(default = "default_trace")]
    pub default_trace: PathBuf,
    #[serde(default = "default_vsync")]
    pub vsync: bool,
    /// Panic when a native create or map call fails instead of skipping it.
    #[serde(default = "default_strict")]
    pub strict: bool,
    #[serde(default = "default_back_buffers")]
    pub headless_back_buffers: u32,
    #[serde(default = "default_title")]
    pub window_title: String,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct GfxtraceCfg {
    #[serde(default)]
    pub capture: CaptureCfg,
    #[serde(default)]
    pub replay: ReplayCfg,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        CaptureCfg {
            log_stem: default_log_stem(),
            directory: default_directory(),
        }
    }
}

impl Default for ReplayCfg {
    fn default() -> Self {
        ReplayCfg {
            default_trace: default_trace(),
            vsync: default_vsync(),
            strict: default_strict(),
            headless_back_buffers: default_back_buffers(),
            window_title: default_title(),
        }
    }
}

fn default_log_stem() -> String {
    "api_trace_log".to_owned()
}
fn default_directory() -> PathBuf {
    PathBuf::from(".")
}
fn default_trace() -> PathBuf {
    PathBuf::from("api_trace_log.bin")
}
fn default_vsync() -> bool {
    true
}
fn default_strict() -> bool {
    false
}
fn default_back_buffers() -> u32 {
    2
}
fn default_title() -> String {
    "gfxtrace".to_owned()
}

impl GfxtraceCfg {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

pub fn load_cfg(path: &Path) -> GfxtraceCfg {
    GfxtraceCfg::read(path).unwrap_or_else(|e| {
        warn!("{e}; using defaults");
        GfxtraceCfg::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GfxtraceCfg::from_toml_str("").unwrap();
        assert_eq!(cfg, GfxtraceCfg::default());
        assert_eq!(cfg.capture.log_stem, "api_trace_log");
        assert_eq!(cfg.replay.default_trace, PathBuf::from("api_trace_log.bin"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GfxtraceCfg::from_toml_str(
            r#"
            [capture]
            log_stem = "frame_dump"

            [replay]
            strict = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.capture.log_stem, "frame_dump");
        assert_eq!(cfg.capture.directory, PathBuf::from("."));
        assert!(cfg.replay.strict);
        assert!(cfg.replay.vsync);
        assert_eq!(cfg.replay.headless_back_buffers, 2);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GfxtraceCfg::read(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, GfxtraceCfg::default());
    }

    #[test]
    fn malformed_file_falls_back_in_load_cfg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gfxtrace.toml");
        fs::write(&path, "[replay]\nvsync = \"maybe\"\n").unwrap();
        assert!(matches!(
            GfxtraceCfg::read(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(load_cfg(&path), GfxtraceCfg::default());
    }
}
