//! Load `.imgbatch.toml` from the source directory (CLI only). The lib takes [`RunOpts`] directly.

use image::ImageFormat;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::RunOpts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ImgbatchToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    recurse: Option<bool>,
    workers: Option<usize>,
    /// Seconds.
    timeout: Option<u64>,
    default_format: Option<String>,
    follow_links: Option<bool>,
    skip_unreadable: Option<bool>,
    atomic: Option<bool>,
    verbose: Option<bool>,
}

impl ImgbatchToml {
    pub fn recurse(&self) -> Option<bool> {
        self.settings.recurse
    }

    pub fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }
}

/// Load the settings file from `dir`. `Ok(None)` when there is no file; `Err` carries a
/// message for a file that exists but does not parse (caller logs it once logging is up).
pub fn load_imgbatch_toml(dir: &Path) -> Result<Option<ImgbatchToml>, String> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    parse_imgbatch_toml(&s)
        .map(Some)
        .map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse_imgbatch_toml(s: &str) -> Result<ImgbatchToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI.
/// The operation itself is never read from the file.
pub fn apply_file_to_opts(file: &ImgbatchToml, opts: &mut RunOpts) {
    let s = &file.settings;
    if let Some(n) = s.workers {
        opts.workers = Some(n);
    }
    if let Some(secs) = s.timeout {
        opts.shutdown_timeout = Duration::from_secs(secs);
    }
    if let Some(ref ext) = s.default_format {
        match ImageFormat::from_extension(ext) {
            Some(fmt) => opts.default_format = fmt,
            None => log::warn!("unknown default_format {:?} in settings file, ignoring", ext),
        }
    }
    apply_file_opt!(s, opts, follow_links => follow_links);
    apply_file_opt!(s, opts, skip_unreadable => skip_unreadable);
    apply_file_opt!(s, opts, atomic => atomic_write);
    apply_file_opt!(s, opts, verbose => verbose);
}
