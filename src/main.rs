//! Pexgal - browse Pexels curated photos in the terminal.
//!
//! # Usage
//!
//! ```bash
//! PEXELS_ACCESS_KEY=... pexgal
//! pexgal --force-half-cell
//! pexgal --no-images --log-file pexgal.log
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pexgal::app::App;
use pexgal::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use pexgal::perf;
use pexgal::source::{DEFAULT_API_BASE, PexelsClient};

const ACCESS_KEY_VARS: [&str; 2] = ["PEXELS_ACCESS_KEY", "VITE_PEXELS_ACCESS_KEY"];

/// Browse Pexels curated photos in the terminal
#[derive(Parser, Debug)]
#[command(name = "pexgal", version, about, long_about = None)]
struct Cli {
    /// Disable photo rendering (show placeholders only)
    #[arg(long)]
    no_images: bool,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// API root to fetch curated photos from
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Write tracing output to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Enable performance timing
    #[arg(long)]
    perf: bool,

    /// Write detailed render/image debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    /// The flags that can be saved as defaults.
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            no_images: self.no_images,
            force_half_cell: self.force_half_cell,
            perf: self.perf,
            render_debug_log: self.render_debug_log.clone(),
            log_file: self.log_file.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

/// First non-blank value, trimmed.
fn pick_access_key(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

fn access_key() -> Result<String> {
    pick_access_key(ACCESS_KEY_VARS.iter().map(|name| std::env::var(name).ok())).with_context(
        || {
            format!(
                "No Pexels API key: set {} (or {})",
                ACCESS_KEY_VARS[0], ACCESS_KEY_VARS[1]
            )
        },
    )
}

/// Filter from `RUST_LOG`-style directives, `warn` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Route tracing to `log_file`, or drop it; the terminal belongs to the UI.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let directives = std::env::var("RUST_LOG").ok();
    let builder = tracing_subscriber::fmt().with_env_filter(log_filter(directives.as_deref()));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::sink).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_tracing(effective.log_file.as_ref())?;

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("PEXGAL_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let api_base = effective
        .api_base
        .clone()
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let client =
        PexelsClient::new(access_key()?, api_base).context("Failed to build HTTP client")?;
    let http = client.http().clone();
    tracing::info!(api_base = ?effective.api_base, "starting");

    // Run the application
    let mut app = App::new(Arc::new(client), http)
        .with_force_half_cell(effective.force_half_cell)
        .with_images_enabled(!effective.no_images)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::{log_filter, pick_access_key};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logged_with(directives: Option<&str>) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(directives))
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("page merged");
            tracing::warn!("error fetching images");
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_log_filter_defaults_to_warn() {
        let out = logged_with(None);
        assert!(out.contains("error fetching images"));
        assert!(!out.contains("page merged"));
    }

    #[test]
    fn test_rust_log_debug_raises_verbosity() {
        let out = logged_with(Some("debug"));
        assert!(out.contains("page merged"), "output: {out}");
        assert!(out.contains("error fetching images"));
    }

    #[test]
    fn test_invalid_directives_fall_back_to_warn() {
        let out = logged_with(Some("pexgal=loud"));
        assert!(!out.contains("page merged"));
        assert!(out.contains("error fetching images"));
    }

    #[test]
    fn test_primary_key_wins() {
        let key = pick_access_key([Some("abc".to_string()), Some("def".to_string())]);
        assert_eq!(key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_blank_primary_falls_back() {
        let key = pick_access_key([Some("  ".to_string()), Some(" def\n".to_string())]);
        assert_eq!(key.as_deref(), Some("def"));
    }

    #[test]
    fn test_missing_keys_yield_none() {
        assert_eq!(pick_access_key([None, Some(String::new())]), None);
    }
}
