//! Per-operation transform logic. One strategy per [`Operation`] variant, built once per job.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::Operation;
use crate::engine::cancel::CancellationSignal;
use crate::error::TransformError;
use crate::utils::write_via_temp;

/// Resampling filter for scaling.
const SCALE_FILTER: FilterType = FilterType::Lanczos3;

/// Options shared by the strategies that re-encode images.
#[derive(Clone, Copy, Debug)]
pub struct StrategyOpts {
    /// Encoding used when the extension does not name a known format.
    pub default_format: ImageFormat,
    /// Replace via temp file + rename instead of writing over the original.
    pub atomic_write: bool,
}

impl Default for StrategyOpts {
    fn default() -> Self {
        Self {
            default_format: ImageFormat::Jpeg,
            atomic_write: false,
        }
    }
}

/// A transform applied to one file. `signal` is for best-effort early exit; callers check it first.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, path: &Path, signal: &CancellationSignal) -> Result<(), TransformError>;
}

impl Operation {
    /// Build the strategy for this operation.
    pub fn strategy(&self, opts: StrategyOpts) -> Box<dyn Transform> {
        match self {
            Operation::Scale { factor } => Box::new(ScaleStrategy {
                factor: *factor,
                opts,
            }),
            Operation::Negate => Box::new(NegateStrategy { opts }),
            Operation::Remove => Box::new(RemoveStrategy),
            Operation::Copy { target_dir } => Box::new(CopyStrategy {
                target_dir: target_dir.clone(),
            }),
        }
    }
}

/// Format to re-encode `path` with: from its extension, else `default`.
pub fn output_format(path: &Path, default: ImageFormat) -> ImageFormat {
    path.extension()
        .and_then(ImageFormat::from_extension)
        .unwrap_or(default)
}

/// Decode by content, not by extension.
fn read_image(path: &Path) -> Result<DynamicImage, TransformError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

fn write_image(
    img: &DynamicImage,
    path: &Path,
    opts: &StrategyOpts,
) -> Result<(), TransformError> {
    let format = output_format(path, opts.default_format);
    if opts.atomic_write {
        write_via_temp(path, |tmp| {
            img.save_with_format(tmp, format)
                .map_err(TransformError::from)
        })
    } else {
        Ok(img.save_with_format(path, format)?)
    }
}

/// New dimensions for `factor`, rounded to the nearest pixel.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| (f64::from(v) * factor).round().min(f64::from(u32::MAX)) as u32;
    (scale(width), scale(height))
}

/// Resize by a factor with a smooth filter and overwrite the source.
pub struct ScaleStrategy {
    factor: f64,
    opts: StrategyOpts,
}

impl Transform for ScaleStrategy {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn apply(&self, path: &Path, signal: &CancellationSignal) -> Result<(), TransformError> {
        let img = read_image(path)?;
        let (width, height) = scaled_dimensions(img.width(), img.height(), self.factor);
        if width == 0 || height == 0 {
            return Err(TransformError::EmptyResize { width, height });
        }
        if signal.is_set() {
            return Err(TransformError::Cancelled);
        }
        let scaled = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, SCALE_FILTER)
        };
        write_image(&scaled, path, &self.opts)
    }
}

/// Invert the colour channels (`max - v`, alpha untouched) and overwrite the source.
pub struct NegateStrategy {
    opts: StrategyOpts,
}

/// Invert colour channels in place. Alpha is left alone, so applying it twice is the identity.
pub fn negate_pixels(img: &mut DynamicImage) {
    img.invert();
}

impl Transform for NegateStrategy {
    fn name(&self) -> &'static str {
        "negate"
    }

    fn apply(&self, path: &Path, signal: &CancellationSignal) -> Result<(), TransformError> {
        let mut img = read_image(path)?;
        if signal.is_set() {
            return Err(TransformError::Cancelled);
        }
        negate_pixels(&mut img);
        write_image(&img, path, &self.opts)
    }
}

/// Delete the file. An already-absent file counts as done.
pub struct RemoveStrategy;

impl Transform for RemoveStrategy {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn apply(&self, path: &Path, _signal: &CancellationSignal) -> Result<(), TransformError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} already absent", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Copy the file into a target directory under its own name, replacing any existing copy.
///
/// The bytes go to a scratch file first and are renamed into place, so sources from different
/// subdirectories that share a name each install a complete copy; the last rename wins.
pub struct CopyStrategy {
    target_dir: PathBuf,
}

impl CopyStrategy {
    pub fn target_for(&self, path: &Path) -> Result<PathBuf, TransformError> {
        let name = path.file_name().ok_or(TransformError::NoFileName)?;
        Ok(self.target_dir.join(name))
    }
}

impl Transform for CopyStrategy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn apply(&self, path: &Path, _signal: &CancellationSignal) -> Result<(), TransformError> {
        let target = self.target_for(path)?;
        // fs::copy onto itself would truncate the source.
        if let (Ok(src), Ok(dst)) = (path.canonicalize(), target.canonicalize())
            && src == dst
        {
            debug!("{} is its own copy target, skipping", path.display());
            return Ok(());
        }
        write_via_temp(&target, |tmp| {
            fs::copy(path, tmp)?;
            Ok::<(), TransformError>(())
        })
    }
}
