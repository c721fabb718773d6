//! Tag resolution and code synthesis engine for `kubetype-gen`.
//!
//! Declarations tagged with `+kubetype-gen` are discovered by the
//! [`scan`] module, their layered tag configuration is merged by
//! [`resolve`], destinations are formed by [`group`] and the final source text
//! is produced by [`synth`]. Protocol-buffer messages follow a shorter path
//! through [`proto`], which only emits deep-copy methods.
//!
//! The crate performs no I/O: callers hand in pre-loaded modules and receive
//! [`GeneratedUnit`]s keyed by destination path.

pub mod error;
pub mod group;
pub mod model;
pub mod pipeline;
pub mod proto;
pub mod resolve;
pub mod scan;
pub mod synth;
pub mod tags;

pub use error::{AggregatedErrors, Diagnostics, KubetypeError};
pub use group::{Destination, DestinationKey, Member};
pub use model::{
    DetachedComment, FieldDecl, FieldShape, LocationPath, ModulePath, RawDeclaration,
    SourceModule,
};
pub use pipeline::{
    GenerationReport, generate_deepcopy, generate_types, generate_types_from_modules,
};
pub use resolve::{GroupVersion, LayerProvenance, ResolvedConfig, StatusType, TagLayers};
pub use scan::rust::RustSource;
pub use synth::{GeneratedUnit, SynthOptions, TYPES_GENERATOR};
pub use tags::{MARKER, TagConfig, TagOption};
