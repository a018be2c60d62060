//! User settings and the packaged color scheme.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The color scheme shipped with the package; SGR color scopes
/// (`quillterm.{bg}_{fg}`) resolve against it.
pub const PACKAGED_COLOR_SCHEME: &str = "themes/quill/QuillTerm.theme.toml";
/// A user copy at this path takes precedence over the packaged one.
pub const USER_COLOR_SCHEME: &str = "themes/user/QuillTerm.theme.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Render SGR colors as view regions.
    pub show_colors: bool,
    /// Scrollback lines.
    pub scroll_history: usize,
    /// Fraction of a page moved per page-up/down.
    pub scroll_ratio: f32,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            show_colors: false,
            scroll_history: 1000,
            scroll_ratio: 0.5,
        }
    }
}

impl TerminalSettings {
    /// Load settings from a TOML file; a missing file yields defaults,
    /// anything else is a real error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TerminalSettings::default());
            }
            Err(err) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    source: err,
                });
            }
        };
        Ok(toml::from_str(&raw)?)
    }
}

/// The color scheme resource to force onto the view: the user override
/// when present, the packaged theme otherwise.
pub fn color_scheme_resource(package_root: &Path) -> PathBuf {
    let user = package_root.join(USER_COLOR_SCHEME);
    if user.exists() {
        user
    } else {
        package_root.join(PACKAGED_COLOR_SCHEME)
    }
}
