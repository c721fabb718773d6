//! Deep-copy units for prost-generated message types.

use camino::Utf8PathBuf;

use crate::model::{ModulePath, RawDeclaration};
use crate::synth::{GeneratedUnit, SynthOptions, escape_path, whole_value_methods};

/// Generator name used in the header of deep-copy units.
pub const DEEPCOPY_GENERATOR: &str = "protoc-gen-deepcopy";

/// File name of the unit for `package`, next to the `<package>.rs` file
/// `prost-build` writes.
#[must_use]
pub fn unit_path(package: &ModulePath) -> Utf8PathBuf {
    if package.is_root() {
        Utf8PathBuf::from("_.deepcopy.rs")
    } else {
        let dotted = package.segments().collect::<Vec<_>>().join(".");
        Utf8PathBuf::from(format!("{dotted}.deepcopy.rs"))
    }
}

/// Emits one `impl` block per message, in the given order.
#[must_use]
pub fn synthesize_package(
    package: &ModulePath,
    messages: &[&RawDeclaration],
    options: &SynthOptions,
) -> GeneratedUnit {
    let mut text = options.header(DEEPCOPY_GENERATOR);
    let methods = whole_value_methods();
    for message in messages {
        text.push('\n');
        text.push_str(&format!(
            "impl {} {{\n{methods}}}\n",
            escape_path(&message.ident)
        ));
    }
    let path = unit_path(package);
    tracing::debug!(%path, messages = messages.len(), "synthesised deep-copy unit");
    GeneratedUnit { path, text }
}
