//! Discovers Rust sources below the configured roots.
//!
//! Each root is walked in name order. Hidden directories and `target` are
//! skipped, as are files that open with a "Code generated" marker so earlier
//! output is never scanned again. A file that cannot be read is reported as
//! a module load failure and the walk continues.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use kubetype_gen::scan::rust::module_for_file;
use kubetype_gen::{KubetypeError, ModulePath, RustSource};

use crate::error::CliError;
use crate::fs::open_optional_dir;

/// Restricts scanning to modules below any of the given prefixes.
///
/// An empty boundary admits every module.
#[derive(Debug, Clone, Default)]
pub struct Boundary(Vec<ModulePath>);

impl Boundary {
    /// Builds a boundary from module path prefixes such as `apis/v1`.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            prefixes
                .into_iter()
                .map(|prefix| ModulePath::new(prefix.as_ref()))
                .collect(),
        )
    }

    /// Whether `module` lies inside the boundary.
    #[must_use]
    pub fn admits(&self, module: &ModulePath) -> bool {
        self.0.is_empty() || self.0.iter().any(|prefix| module.starts_with(prefix))
    }
}

/// Sources found below the roots plus the files that could not be read.
#[derive(Debug, Default)]
pub struct CollectedSources {
    /// Readable files in walk order.
    pub sources: Vec<RustSource>,
    /// One [`KubetypeError::ModuleLoad`] per unreadable file.
    pub unreadable: Vec<KubetypeError>,
}

/// Collects every admitted `.rs` file below `roots`.
///
/// # Errors
///
/// Returns [`CliError::Io`] when a root is missing or a directory cannot be
/// listed. Unreadable files end up in [`CollectedSources::unreadable`].
pub fn collect_sources(roots: &[Utf8PathBuf], boundary: &Boundary) -> Result<CollectedSources, CliError> {
    let mut collected = CollectedSources::default();
    for root in roots {
        let dir = open_optional_dir(root)?.ok_or_else(|| {
            CliError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source root not found"),
            )
        })?;
        let before = collected.sources.len();
        walk(&dir, root, Utf8Path::new(""), boundary, &mut collected)?;
        tracing::debug!(%root, files = collected.sources.len() - before, "scanned source root");
    }
    Ok(collected)
}

fn walk(
    dir: &Dir,
    root: &Utf8Path,
    relative: &Utf8Path,
    boundary: &Boundary,
    collected: &mut CollectedSources,
) -> Result<(), CliError> {
    let display = root.join(relative);
    let mut entries = Vec::new();
    for entry_result in dir.read_dir(".").map_err(|err| CliError::io(&display, err))? {
        let entry = entry_result.map_err(|err| CliError::io(&display, err))?;
        let name = entry.file_name().map_err(|err| CliError::io(&display, err))?;
        let file_type = entry.file_type().map_err(|err| CliError::io(&display, err))?;
        entries.push((name, file_type));
    }
    entries.sort_by(|(left, _), (right, _)| left.cmp(right));

    for (name, file_type) in entries {
        let rel = relative.join(&name);
        if file_type.is_dir() {
            if name.starts_with('.') || name == "target" {
                continue;
            }
            let subdir = dir.open_dir(&name).map_err(|err| CliError::io(root.join(&rel), err))?;
            walk(&subdir, root, &rel, boundary, collected)?;
        } else if file_type.is_file() && rel.extension() == Some("rs") {
            let module = module_for_file(rel.as_str());
            if !boundary.admits(&module) {
                continue;
            }
            let text = match dir.read_to_string(&name) {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(file = %rel, error = %err, "unreadable source file");
                    collected.unreadable.push(KubetypeError::ModuleLoad {
                        module: module.to_string(),
                        origin: root.join(&rel).into_string(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if is_generated(&text) {
                tracing::debug!(file = %rel, "skipping generated file");
                continue;
            }
            collected.sources.push(RustSource::new(module, rel.as_str(), text));
        }
    }
    Ok(())
}

fn is_generated(text: &str) -> bool {
    text.lines()
        .take_while(|line| line.trim_start().starts_with("//") || line.trim().is_empty())
        .any(|line| line.contains("Code generated by") && line.contains("DO NOT EDIT"))
}
