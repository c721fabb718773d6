//! Layered settings for the binaries.
//!
//! Values are merged lowest to highest: built-in defaults, the configuration
//! file, `KUBETYPE_GEN_*` environment variables (`__` separates nested keys)
//! and finally command-line flags.

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use kubetype_gen::{SynthOptions, TagConfig, TagOption};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Command, OutputArgs};
use crate::error::CliError;
use crate::fs;

/// Configuration file read from the working directory when `--config` is
/// not given.
pub const CONFIG_FILE: &str = "kubetype-gen.toml";

/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "KUBETYPE_GEN_";

/// Process-wide default tags, the lowest-precedence tag layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTags {
    /// Default `groupVersion`.
    #[serde(alias = "groupVersion", skip_serializing_if = "Option::is_none")]
    pub group_version: Option<String>,
    /// Default `package`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Default `status`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl DefaultTags {
    /// Converts the defaults into a tag layer.
    #[must_use]
    pub fn to_tag_config(&self) -> TagConfig {
        let entries = [
            (TagOption::GroupVersion, &self.group_version),
            (TagOption::Package, &self.package),
            (TagOption::Status, &self.status),
        ];
        TagConfig::from_options(
            entries
                .into_iter()
                .filter_map(|(option, value)| value.as_deref().map(|v| (option.as_str(), v))),
        )
    }
}

/// Fully merged settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory generated files are written below.
    pub out_dir: Utf8PathBuf,
    /// File whose contents are prepended to every unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boilerplate_file: Option<Utf8PathBuf>,
    /// Default tag values.
    pub defaults: DefaultTags,
    /// Synthesis options.
    #[serde(flatten)]
    pub synth: SynthOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: Utf8PathBuf::from("generated"),
            boilerplate_file: None,
            defaults: DefaultTags::default(),
            synth: SynthOptions::default(),
        }
    }
}

/// Values given on the command line, serialised as the top layer.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boilerplate_file: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crate_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta_module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
}

impl CliOverrides {
    fn from_cli(cli: &Cli) -> Self {
        let OutputArgs {
            out_dir,
            boilerplate,
            generated_by,
            ..
        } = cli.output.clone();
        let mut overrides = Self {
            out_dir,
            boilerplate_file: boilerplate,
            generated_by,
            ..Self::default()
        };
        if let Command::Types(args) = &cli.command {
            overrides.crate_root.clone_from(&args.crate_root);
            overrides.meta_module.clone_from(&args.meta_module);
            overrides.file_name.clone_from(&args.file_name);
        }
        overrides
    }
}

impl Settings {
    /// Loads settings for `cli` from every layer.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigNotFound`] when `--config` names a missing
    /// file and [`CliError::Config`] when a layer holds invalid values.
    pub fn load(cli: &Cli) -> Result<Self, CliError> {
        let figment = Self::figment(cli.config.as_deref())?
            .merge(Serialized::defaults(CliOverrides::from_cli(cli)));
        Ok(figment.extract()?)
    }

    /// Builds the defaults, file and environment layers.
    ///
    /// A missing default configuration file is skipped; a missing explicit
    /// one is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigNotFound`] when `explicit` does not exist.
    pub fn figment(explicit: Option<&Utf8Path>) -> Result<Figment, CliError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(CliError::ConfigNotFound(path.to_path_buf()));
            }
            Some(path) => path,
            None => Utf8Path::new(CONFIG_FILE),
        };
        tracing::debug!(config = %file, "loading configuration");
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file.as_std_path()))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Synthesis options with the boilerplate file read in.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when the boilerplate file cannot be read.
    pub fn synth_options(&self) -> Result<SynthOptions, CliError> {
        let mut options = self.synth.clone();
        if let Some(path) = &self.boilerplate_file {
            let text = fs::read_to_string(path)?;
            options.boilerplate = Some(text.trim_end().to_owned());
        }
        Ok(options)
    }
}
