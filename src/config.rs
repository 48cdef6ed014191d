//! Saved command-line defaults.
//!
//! Flag files hold the same flags the command line accepts, whitespace
//! separated, with `#` comment lines. A global file is merged with a local
//! `.pexgalrc` and then with the actual command line; later sources win.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_DIR: &str = "pexgal";
const LOCAL_FILE: &str = ".pexgalrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_images: bool,
    pub force_half_cell: bool,
    pub perf: bool,
    pub render_debug_log: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl ConfigFlags {
    /// Merge two flag sets; switches add up and `other` wins for values.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_images: self.no_images || other.no_images,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            perf: self.perf || other.perf,
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
            api_base: other.api_base.clone().or_else(|| self.api_base.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join(APP_DIR)
                .join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Read a flag file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_line)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as a flag file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# pexgal defaults (saved with --save)".to_string()];
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if flags.force_half_cell {
        lines.push("--force-half-cell".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(valued_line("--render-debug-log", &path.display().to_string())?);
    }
    if let Some(path) = &flags.log_file {
        lines.push(valued_line("--log-file", &path.display().to_string())?);
    }
    if let Some(base) = &flags.api_base {
        lines.push(valued_line("--api-base", base)?);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Shell-style words of one config line. Unbalanced quotes fall back to
/// plain whitespace splitting.
fn split_line(line: &str) -> Vec<String> {
    shlex::split(line)
        .unwrap_or_else(|| line.split_whitespace().map(ToOwned::to_owned).collect())
}

fn valued_line(flag: &str, value: &str) -> Result<String> {
    let quoted = shlex::try_quote(value)
        .with_context(|| format!("Cannot save {flag} value {value:?}"))?;
    Ok(format!("{flag} {quoted}"))
}

/// Remove a flag file if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of raw tokens; anything else is ignored.
///
/// Valued flags accept both `--flag value` and `--flag=value`.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--no-images" => flags.no_images = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--perf" => flags.perf = true,
            "--render-debug-log" | "--log-file" | "--api-base" => {
                if let Some(value) = tokens.get(i + 1) {
                    set_value(&mut flags, token, value);
                    i += 1;
                }
            }
            _ => {
                if let Some((name, value)) = token.split_once('=') {
                    set_value(&mut flags, name, value);
                }
            }
        }
        i += 1;
    }
    flags
}

fn set_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        "--api-base" => flags.api_base = Some(value.to_string()),
        _ => {}
    }
}
