//! Lazy image-file discovery over a walkdir iterator, stopping on cancellation.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use walkdir::{DirEntry, WalkDir};

use crate::FileTask;
use crate::engine::cancel::CancellationSignal;
use crate::engine::tools::is_image_file;
use crate::error::JobError;

/// Subdirectories skipped with `skip_unreadable`, with the error message for each.
pub type SkippedDirs = Arc<Mutex<Vec<(PathBuf, String)>>>;

type WalkIter = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// Builds a one-shot, finite stream of image files under a root.
pub struct FileDiscoverer {
    root: PathBuf,
    recurse: bool,
    follow_links: bool,
    skip_unreadable: bool,
    exclude: Option<PathBuf>,
    signal: CancellationSignal,
    skipped: SkippedDirs,
}

impl FileDiscoverer {
    pub fn new(root: impl Into<PathBuf>, recurse: bool, signal: CancellationSignal) -> Self {
        Self {
            root: root.into(),
            recurse,
            follow_links: false,
            skip_unreadable: false,
            exclude: None,
            signal,
            skipped: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Log and skip unreadable subdirectories instead of ending the walk with an error.
    /// An unreadable root is always an error.
    pub fn skip_unreadable(mut self, yes: bool) -> Self {
        self.skip_unreadable = yes;
        self
    }

    /// Do not descend into `dir` (e.g. a copy target nested under the root).
    pub fn exclude_dir(mut self, dir: &Path) -> Self {
        self.exclude = dir.canonicalize().ok();
        self
    }

    /// Shared handle to the skipped-directory list; filled as the walk proceeds.
    pub fn skipped(&self) -> SkippedDirs {
        Arc::clone(&self.skipped)
    }

    /// Start the walk. Consumes the discoverer; build a new one to walk again.
    pub fn discover(self) -> Discovery {
        let mut walk = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if !self.recurse {
            walk = walk.max_depth(1);
        }
        let entries: WalkIter = match self.exclude {
            Some(excluded) => Box::new(walk.into_iter().filter_entry(move |e| {
                !(e.depth() > 0
                    && e.file_type().is_dir()
                    && e.path().canonicalize().is_ok_and(|p| p == excluded))
            })),
            None => Box::new(walk.into_iter()),
        };
        Discovery {
            entries,
            signal: self.signal,
            skip_unreadable: self.skip_unreadable,
            skipped: self.skipped,
            yielded: 0,
            done: false,
        }
    }
}

/// Iterator returned by [`FileDiscoverer::discover`].
///
/// Yields each matching regular file once. Ends when the tree is exhausted, when the
/// signal is seen set, or right after yielding a [`JobError::Discovery`].
pub struct Discovery {
    entries: WalkIter,
    signal: CancellationSignal,
    skip_unreadable: bool,
    skipped: SkippedDirs,
    yielded: usize,
    done: bool,
}

impl Discovery {
    /// Paths yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl Iterator for Discovery {
    type Item = Result<FileTask, JobError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.signal.is_set() {
                debug!("discovery stopped by cancellation after {} files", self.yielded);
                self.done = true;
                break;
            }
            match self.entries.next() {
                None => self.done = true,
                Some(Ok(entry)) => {
                    if entry.file_type().is_file() && is_image_file(entry.path()) {
                        self.yielded += 1;
                        return Some(Ok(FileTask::new(entry.into_path())));
                    }
                }
                Some(Err(err)) if self.skip_unreadable && err.depth() > 0 => {
                    let path = err.path().map(PathBuf::from).unwrap_or_default();
                    warn!("Skipping unreadable path {}: {}", path.display(), err);
                    if let Ok(mut skipped) = self.skipped.lock() {
                        skipped.push((path, err.to_string()));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
            }
        }
        None
    }
}
