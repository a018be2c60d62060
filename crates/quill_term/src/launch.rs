//! The "open terminal" command surface.
//!
//! A [`LaunchConfig`] describes what to run and where; it round-trips
//! through serde so a host can persist it in the view's private settings
//! and restart the session after an editor restart. Working directories
//! may embed host variables (`${file_path}`, `${folder}`,
//! `${project_path}`); spawning falls back from the requested directory
//! to `$HOME` and finally `/` before giving up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Pty, PtyError};

pub const DEFAULT_SHELL_CMD: &str = "/bin/bash -l";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("unable to start `{command}`: {reason}")]
    Failed { command: String, reason: String },
}

/// Arguments of one terminal view, persisted per view by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Shell invocation, split on whitespace.
    pub cmd: String,
    pub title: String,
    /// Working directory; may contain `${...}` host variables.
    pub cwd: Option<String>,
    /// Syntax definition the host should apply to the view.
    pub syntax: Option<String>,
    /// Keep the view open after the child exits.
    pub keep_open: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        LaunchConfig {
            cmd: DEFAULT_SHELL_CMD.to_string(),
            title: "Terminal".to_string(),
            cwd: None,
            syntax: None,
            keep_open: false,
        }
    }
}

impl LaunchConfig {
    pub fn argv(&self) -> Vec<String> {
        let cmd = if self.cmd.trim().is_empty() {
            DEFAULT_SHELL_CMD
        } else {
            &self.cmd
        };
        cmd.split_whitespace().map(str::to_string).collect()
    }
}

/// Substitute `${name}` occurrences from the host-provided variable map;
/// unknown variables expand to nothing.
pub fn expand_variables(input: &str, variables: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(close) => {
                let name = &rest[start + 2..start + close];
                if let Some(value) = variables.get(name) {
                    result.push_str(value);
                }
                rest = &rest[start + close + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Working-directory candidates in the order they are tried: the
/// expanded request (when any), `$HOME`, then the filesystem root.
fn cwd_candidates(requested: Option<&str>, variables: &HashMap<String, String>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(requested) = requested {
        let expanded = expand_variables(requested, variables);
        if !expanded.is_empty() {
            candidates.push(PathBuf::from(expanded));
        }
    }
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home));
    }
    candidates.push(PathBuf::from("/"));

    candidates
}

/// Launch the configured command, walking the cwd fallback chain. Only
/// when every candidate fails does the error surface to the caller.
pub fn open_terminal(config: &LaunchConfig, variables: &HashMap<String, String>) -> Result<Pty, LaunchError> {
    let argv = config.argv();
    let mut last_error: Option<PtyError> = None;

    for cwd in cwd_candidates(config.cwd.as_deref(), variables) {
        match Pty::spawn(&argv, &cwd) {
            Ok(pty) => return Ok(pty),
            Err(err) => {
                log::warn!("launch in {} failed: {err}", cwd.display());
                last_error = Some(err);
            }
        }
    }

    Err(LaunchError::Failed {
        command: argv.join(" "),
        reason: last_error.map(|err| err.to_string()).unwrap_or_else(|| "no working directory".to_string()),
    })
}

lazy_static! {
    // Last free-form arguments used per invocation, so the exec prompt
    // can offer them again.
    static ref CACHED_EXEC_ARGS: Mutex<HashMap<String, String>> = Mutex::new(HashMap::new());
}

/// The arguments last used with `invocation`, for pre-filling the prompt.
pub fn cached_exec_args(invocation: &str) -> Option<String> {
    CACHED_EXEC_ARGS.lock().get(invocation).cloned()
}

/// Build the launch configuration for the auxiliary "exec" command: a
/// command vector plus optional free-form arguments (remembered per
/// invocation), always with `keep_open` so the output survives the
/// process.
pub fn exec_launch_config(cmd: &[String], args: Option<&str>, title: &str, cwd: Option<&str>) -> LaunchConfig {
    let invocation = cmd.join(" ");

    let full_cmd = match args {
        Some(args) if !args.is_empty() => {
            CACHED_EXEC_ARGS.lock().insert(invocation.clone(), args.to_string());
            format!("{invocation} {args}")
        }
        _ => invocation,
    };

    LaunchConfig {
        cmd: full_cmd,
        title: title.to_string(),
        cwd: cwd.map(str::to_string),
        syntax: None,
        keep_open: true,
    }
}

/// Directory of a file path, for `${file_path}`-style fallback logic at
/// the host boundary.
pub fn parent_dir(path: &str) -> Option<String> {
    Path::new(path).parent().map(|parent| parent.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn variables() -> HashMap<String, String> {
        HashMap::from([
            ("file_path".to_string(), "/tmp/project/main.rs".to_string()),
            ("folder".to_string(), "/tmp/project".to_string()),
        ])
    }

    #[test]
    fn variables_expand() {
        assert_eq!(expand_variables("${folder}/sub", &variables()), "/tmp/project/sub");
        assert_eq!(expand_variables("no variables", &variables()), "no variables");
        // Unknown variables vanish, malformed ones pass through.
        assert_eq!(expand_variables("${nope}/x", &variables()), "/x");
        assert_eq!(expand_variables("${unclosed", &variables()), "${unclosed");
    }

    #[test]
    fn default_command_is_a_login_shell() {
        let config = LaunchConfig::default();
        assert_eq!(config.argv(), vec!["/bin/bash", "-l"]);

        let blank = LaunchConfig {
            cmd: "  ".to_string(),
            ..LaunchConfig::default()
        };
        assert_eq!(blank.argv(), vec!["/bin/bash", "-l"]);
    }

    #[test]
    fn cwd_candidates_fall_back_to_home_and_root() {
        let candidates = cwd_candidates(Some("${folder}"), &variables());
        assert_eq!(candidates[0], PathBuf::from("/tmp/project"));
        assert_eq!(candidates.last(), Some(&PathBuf::from("/")));
        assert!(candidates.len() >= 2);
    }

    #[test]
    fn exec_remembers_arguments_per_invocation() {
        let cmd = vec!["cargo".to_string(), "run".to_string()];
        let config = exec_launch_config(&cmd, Some("--release"), "Executable", None);

        assert_eq!(config.cmd, "cargo run --release");
        assert!(config.keep_open);
        assert_eq!(cached_exec_args("cargo run"), Some("--release".to_string()));

        let again = exec_launch_config(&cmd, None, "Executable", None);
        assert_eq!(again.cmd, "cargo run");
    }

    #[test]
    fn launch_config_round_trips_through_toml() {
        let config = LaunchConfig {
            cmd: "/bin/sh -c top".to_string(),
            title: "top".to_string(),
            cwd: Some("${folder}".to_string()),
            syntax: Some("terminal-output".to_string()),
            keep_open: true,
        };

        let serialized = toml::to_string(&config).unwrap();
        let restored: LaunchConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(restored, config);
    }

    #[cfg(unix)]
    #[test]
    fn launch_falls_back_when_cwd_is_invalid() {
        let config = LaunchConfig {
            cmd: "/bin/sh -c pwd".to_string(),
            cwd: Some("/definitely/not/a/directory".to_string()),
            ..LaunchConfig::default()
        };

        // The bad cwd is skipped and a later candidate succeeds.
        let pty = open_terminal(&config, &HashMap::new());
        assert!(pty.is_ok());
    }

    #[test]
    fn parent_dir_of_a_file() {
        assert_eq!(parent_dir("/tmp/project/main.rs"), Some("/tmp/project".to_string()));
    }
}
