//! Temporary directory trees for tests that touch the filesystem.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tempfile::TempDir;

/// A temporary directory addressed with UTF-8 paths.
///
/// The directory is removed when the value is dropped.
pub struct TempTree {
    _guard: TempDir,
    root: Utf8PathBuf,
    dir: Dir,
}

impl TempTree {
    /// Creates an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let guard = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf())
            .map_err(|path| anyhow!("temp dir is not UTF-8: {}", path.display()))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .with_context(|| format!("open {root}"))?;
        Ok(Self {
            _guard: guard,
            root,
            dir,
        })
    }

    /// Absolute path of the tree root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when a directory or the file cannot be written.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<Utf8PathBuf> {
        if let Some(parent) = Utf8Path::new(relative).parent().filter(|p| !p.as_str().is_empty()) {
            self.dir
                .create_dir_all(parent)
                .with_context(|| format!("create {parent}"))?;
        }
        self.dir
            .write(relative, contents)
            .with_context(|| format!("write {relative}"))?;
        Ok(self.root.join(relative))
    }

    /// Reads `relative` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or not UTF-8.
    pub fn read(&self, relative: &str) -> Result<String> {
        self.dir
            .read_to_string(relative)
            .with_context(|| format!("read {relative}"))
    }

    /// Returns `true` when `relative` exists.
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.dir.exists(relative)
    }
}
