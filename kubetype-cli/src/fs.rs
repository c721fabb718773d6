//! Filesystem helpers built on `cap-std` directory handles.

use std::io::ErrorKind;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::error::CliError;

/// Opens a directory if it exists, returning `None` when the path is missing.
pub fn open_optional_dir(path: &Utf8Path) -> Result<Option<Dir>, CliError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(Some(dir)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(CliError::io(path, err)),
    }
}

/// Opens `path`, creating it and its parents first when missing.
pub fn ensure_dir(path: &Utf8Path) -> Result<Dir, CliError> {
    if let Some(dir) = open_optional_dir(path)? {
        return Ok(dir);
    }
    Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|err| CliError::io(path, err))?;
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| CliError::io(path, err))
}

/// Reads a whole file given by an ambient path.
pub fn read(path: &Utf8Path) -> Result<Vec<u8>, CliError> {
    let (dir, name) = parent_and_name(path)?;
    dir.read(name).map_err(|err| CliError::io(path, err))
}

/// Reads a whole UTF-8 file given by an ambient path.
pub fn read_to_string(path: &Utf8Path) -> Result<String, CliError> {
    let (dir, name) = parent_and_name(path)?;
    dir.read_to_string(name).map_err(|err| CliError::io(path, err))
}

fn parent_and_name(path: &Utf8Path) -> Result<(Dir, &str), CliError> {
    let name = path.file_name().ok_or_else(|| {
        CliError::io(
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| CliError::io(parent, err))?;
    Ok((dir, name))
}
