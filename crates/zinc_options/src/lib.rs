//! zinc_options: zinc.json parsing and compiler options.
//!
//! Every option is optional in the file; the accessors on
//! `CompilerOptions` supply the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_POINTER_WIDTH: u16 = 64;
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;
pub const DEFAULT_ENTRY_NAME: &str = "__entry";

/// Compiler options, matching the `compilerOptions` object of zinc.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CompilerOptions {
    pub target: TargetOptions,
    /// Deepest allowed scope nesting before binding of a branch stops.
    pub max_nesting_depth: Option<usize>,
    /// Name of the function each module's top-level statements bind into.
    pub entry_name: Option<String>,
    /// Worker count for post-binding stages.
    pub threads: Option<usize>,
    /// Stop storing errors after this many.
    pub max_errors: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TargetOptions {
    pub pointer_width: Option<u16>,
}

impl CompilerOptions {
    pub fn pointer_width(&self) -> u16 {
        self.target.pointer_width.unwrap_or(DEFAULT_POINTER_WIDTH)
    }

    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth.unwrap_or(DEFAULT_MAX_NESTING_DEPTH)
    }

    pub fn entry_name(&self) -> &str {
        self.entry_name.as_deref().unwrap_or(DEFAULT_ENTRY_NAME)
    }

    /// Overlay every option `other` sets on top of these.
    pub fn merge(&mut self, other: &CompilerOptions) {
        if other.target.pointer_width.is_some() {
            self.target.pointer_width = other.target.pointer_width;
        }
        if other.max_nesting_depth.is_some() {
            self.max_nesting_depth = other.max_nesting_depth;
        }
        if other.entry_name.is_some() {
            self.entry_name = other.entry_name.clone();
        }
        if other.threads.is_some() {
            self.threads = other.threads;
        }
        if other.max_errors.is_some() {
            self.max_errors = other.max_errors;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.target.pointer_width {
            None | Some(32) | Some(64) => {}
            Some(width) => return Err(ConfigError::PointerWidth(width)),
        }
        if self.max_nesting_depth == Some(0) {
            return Err(ConfigError::NestingDepth);
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Threads);
        }
        match self.entry_name.as_deref() {
            Some(name) if !is_identifier(name) => Err(ConfigError::EntryName(name.to_string())),
            _ => Ok(()),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// The zinc.json file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZincConfig {
    pub compiler_options: CompilerOptions,
    /// Syntax dumps to bind, relative to the config file.
    pub modules: Vec<String>,
}

impl ZincConfig {
    /// Module paths resolved against the directory holding `config_path`.
    pub fn module_paths(&self, config_path: &Path) -> Vec<PathBuf> {
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));
        self.modules.iter().map(|module| root.join(module)).collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid zinc.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("target.pointerWidth must be 32 or 64, found {0}")]
    PointerWidth(u16),
    #[error("maxNestingDepth must be at least 1")]
    NestingDepth,
    #[error("threads must be at least 1")]
    Threads,
    #[error("entryName `{0}` is not an identifier")]
    EntryName(String),
}

/// Parse and validate a zinc.json document.
pub fn parse_config(content: &str) -> Result<ZincConfig, ConfigError> {
    let config: ZincConfig = serde_json::from_str(content)?;
    config.compiler_options.validate()?;
    Ok(config)
}

/// Parse a zinc.json file from a path.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ZincConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("{}").unwrap();
        let options = &config.compiler_options;
        assert_eq!(options.pointer_width(), 64);
        assert_eq!(options.max_nesting_depth(), 256);
        assert_eq!(options.entry_name(), "__entry");
        assert_eq!(options.threads, None);
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_camel_case_fields() {
        let config = parse_config(
            r#"{
                "compilerOptions": {
                    "target": { "pointerWidth": 32 },
                    "maxNestingDepth": 64,
                    "entryName": "main",
                    "maxErrors": 10
                },
                "modules": ["a.json", "lib/b.json"]
            }"#,
        )
        .unwrap();
        let options = &config.compiler_options;
        assert_eq!(options.pointer_width(), 32);
        assert_eq!(options.max_nesting_depth(), 64);
        assert_eq!(options.entry_name(), "main");
        assert_eq!(options.max_errors, Some(10));
        assert_eq!(
            config.module_paths(Path::new("project/zinc.json")),
            vec![PathBuf::from("project/a.json"), PathBuf::from("project/lib/b.json")]
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config(r#"{"compilerOptions": {"target": {"pointerWidth": 16}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::PointerWidth(16)));
        let err = parse_config(r#"{"compilerOptions": {"threads": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Threads));
        let err = parse_config(r#"{"compilerOptions": {"entryName": "9lives"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EntryName(_)));
        let err = parse_config(r#"{"compilerOptions": {"strict": true}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut options = parse_config(r#"{"compilerOptions": {"maxErrors": 5, "threads": 2}}"#)
            .unwrap()
            .compiler_options;
        options.merge(&CompilerOptions {
            threads: Some(8),
            ..CompilerOptions::default()
        });
        assert_eq!(options.threads, Some(8));
        assert_eq!(options.max_errors, Some(5));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_config_file("does/not/exist/zinc.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
