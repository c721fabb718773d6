//! Helpers for running configuration tests inside a [`figment::Jail`].

use anyhow::{Result, anyhow};

/// Runs `f` inside a fresh jail and hands back its output.
///
/// The jail's temporary directory is the working directory for the duration
/// of `f`, and environment changes made through the jail are undone when it
/// returns.
///
/// # Errors
///
/// Returns an error if the jail cannot be set up or `f` fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!(err.to_string()))?;
    output.ok_or_else(|| anyhow!("jail closure produced no value"))
}

/// Writes `kubetype-gen.toml` into the jail's working directory.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn write_config(jail: &mut figment::Jail, contents: &str) -> figment::error::Result<()> {
    jail.create_file("kubetype-gen.toml", contents)?;
    Ok(())
}

/// Converts any displayable error into a [`figment::Error`] so it can be
/// returned from a jail closure.
pub fn jail_error(err: &impl ToString) -> figment::Error {
    figment::Error::from(err.to_string())
}
