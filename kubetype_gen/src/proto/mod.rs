//! Protocol-buffer deep-copy pipeline.
//!
//! Messages carrying the `+kubetype-gen` marker (attached or in a detached
//! leading comment) receive `deep_copy_into`/`deep_copy` methods that clone
//! the whole message. No wrapper or list types are produced here.

pub mod descriptor;
pub mod plugin;
pub mod synth;

pub use descriptor::load_file;
pub use synth::{DEEPCOPY_GENERATOR, synthesize_package};
