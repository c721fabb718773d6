//! Writes generated units below the output directory.
//!
//! Files whose SHA-256 digest already matches the generated text are left
//! untouched so build tools do not see spurious changes.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::{Dir, OpenOptions};
use kubetype_gen::GeneratedUnit;
use sha2::{Digest, Sha256};

use crate::error::CliError;
use crate::fs::{ensure_dir, open_optional_dir};

/// What happened to each unit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    /// Files created or rewritten.
    pub written: Vec<Utf8PathBuf>,
    /// Files already up to date.
    pub unchanged: Vec<Utf8PathBuf>,
}

/// Collapses units that share a path.
///
/// Identical duplicates are merged; differing ones are a conflict.
///
/// # Errors
///
/// Returns [`CliError::OutputConflict`] for the first clashing path.
pub fn dedupe(units: &[GeneratedUnit]) -> Result<Vec<&GeneratedUnit>, CliError> {
    let mut by_path: BTreeMap<&Utf8Path, &GeneratedUnit> = BTreeMap::new();
    for unit in units {
        match by_path.get(unit.path.as_path()) {
            Some(existing) if existing.text != unit.text => {
                return Err(CliError::OutputConflict {
                    path: unit.path.clone(),
                });
            }
            Some(_) => tracing::debug!(path = %unit.path, "dropping identical duplicate unit"),
            None => {
                by_path.insert(&unit.path, unit);
            }
        }
    }
    Ok(by_path.into_values().collect())
}

/// Writes `units` below `out_dir`, skipping files that are already current.
///
/// # Errors
///
/// Returns [`CliError::Io`] when a directory or file cannot be written.
pub fn write_units(out_dir: &Utf8Path, units: &[&GeneratedUnit]) -> Result<OutputSummary, CliError> {
    let root = ensure_dir(out_dir)?;
    let mut summary = OutputSummary::default();
    for unit in units {
        if existing_digest(&root, out_dir, &unit.path)? == Some(digest(&unit.text)) {
            summary.unchanged.push(unit.path.clone());
            continue;
        }
        write_unit(&root, out_dir, unit)?;
        tracing::info!(path = %out_dir.join(&unit.path), "wrote generated file");
        summary.written.push(unit.path.clone());
    }
    Ok(summary)
}

/// Returns the units whose file under `out_dir` is missing or differs.
///
/// # Errors
///
/// Returns [`CliError::Io`] when an existing file cannot be read.
pub fn stale_units(out_dir: &Utf8Path, units: &[&GeneratedUnit]) -> Result<Vec<Utf8PathBuf>, CliError> {
    let Some(root) = open_optional_dir(out_dir)? else {
        return Ok(units.iter().map(|unit| unit.path.clone()).collect());
    };
    let mut stale = Vec::new();
    for unit in units {
        if existing_digest(&root, out_dir, &unit.path)? != Some(digest(&unit.text)) {
            stale.push(unit.path.clone());
        }
    }
    Ok(stale)
}

fn digest(text: &str) -> [u8; 32] {
    Sha256::digest(text.as_bytes()).into()
}

fn existing_digest(root: &Dir, out_dir: &Utf8Path, path: &Utf8Path) -> Result<Option<[u8; 32]>, CliError> {
    match root.read(path) {
        Ok(bytes) => Ok(Some(Sha256::digest(&bytes).into())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(CliError::io(out_dir.join(path), err)),
    }
}

fn write_unit(root: &Dir, out_dir: &Utf8Path, unit: &GeneratedUnit) -> Result<(), CliError> {
    if let Some(parent) = unit.path.parent().filter(|p| !p.as_str().is_empty()) {
        root.create_dir_all(parent)
            .map_err(|err| CliError::io(out_dir.join(parent), err))?;
    }
    let target = out_dir.join(&unit.path);
    let mut file = root
        .open_with(
            &unit.path,
            OpenOptions::new().write(true).create(true).truncate(true),
        )
        .map_err(|err| CliError::io(&target, err))?;
    file.write_all(unit.text.as_bytes())
        .map_err(|err| CliError::io(&target, err))
}
