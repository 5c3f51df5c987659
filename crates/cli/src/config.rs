//! `policydoc.toml` configuration.
//!
//! ```toml
//! log_level = "info"
//!
//! [templates]
//! default = "templates/policy.json"
//! custom = "templates/overrides.json"
//! ```
//!
//! Template paths are relative to the directory holding the config file.
//! Command-line arguments take precedence over everything here.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Log filter used when neither `RUST_LOG` nor `--log-level` is set.
    pub log_level: Option<String>,
    #[serde(default)]
    pub templates: TemplatePaths,
}

/// `[templates]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TemplatePaths {
    pub default: Option<PathBuf>,
    pub custom: Option<PathBuf>,
}

/// Read and parse a config file, resolving template paths against its
/// directory.
///
/// Returns a human-readable error string on failure.
pub(crate) fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let mut config: Config = toml::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.templates.default = config.templates.default.map(|p| base.join(p));
    config.templates.custom = config.templates.custom.map(|p| base.join(p));
    Ok(config)
}
