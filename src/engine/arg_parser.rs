use clap::{ArgGroup, Parser};
use image::ImageFormat;
use std::path::PathBuf;

use crate::Operation;

/// Parse `--default-format` (an extension such as `jpg` or `png`).
fn parse_image_format(s: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_extension(s.trim_start_matches('.'))
        .ok_or_else(|| format!("unknown image format: {s}"))
}

/// Apply one transform to every image in a directory, in parallel. Ctrl+C cancels.
#[derive(Clone, Parser)]
#[command(name = "imgbatch")]
#[command(about = "Scale, negate, remove or copy every image (.jpg .jpeg .png .bmp .gif) in a directory.")]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .multiple(false)
        .args(["scale", "negate", "remove", "copy"])
))]
pub struct Cli {
    /// Directory containing the images.
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Include subdirectories.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub sub: Option<bool>,

    /// Resize every image by FACTOR (> 0) and overwrite it.
    #[arg(long, short = 's', value_name = "FACTOR", allow_negative_numbers = true)]
    pub scale: Option<f64>,

    /// Invert the colours of every image and overwrite it.
    #[arg(long, short = 'n')]
    pub negate: bool,

    /// Delete every image.
    #[arg(long, short = 'r')]
    pub remove: bool,

    /// Copy every image into DIR (created if missing), replacing files of the same name.
    #[arg(long, short = 'c', value_name = "DIR")]
    pub copy: Option<PathBuf>,

    /// Worker thread count. Default: one per CPU.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Seconds to wait for running files on shutdown before giving up on them.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Encoding for files whose extension does not name a format (e.g. jpg, png).
    #[arg(long, value_parser = parse_image_format)]
    pub default_format: Option<ImageFormat>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Skip unreadable subdirectories instead of aborting.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub skip_unreadable: Option<bool>,

    /// Write scaled/negated images to a temp file and rename over the original.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub atomic: Option<bool>,

    /// Also cancel when ESC (followed by Enter) is typed on stdin.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub esc_cancel: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}

impl Cli {
    /// The selected operation. clap's `operation` group guarantees exactly one flag is set.
    pub fn operation(&self) -> Operation {
        if let Some(factor) = self.scale {
            Operation::Scale { factor }
        } else if let Some(target_dir) = &self.copy {
            Operation::Copy {
                target_dir: target_dir.clone(),
            }
        } else if self.remove {
            Operation::Remove
        } else {
            Operation::Negate
        }
    }
}
