//! Test helpers shared across the kubetype-gen crates.
//!
//! - [`jail`] wraps `figment::Jail` for configuration tests.
//! - [`proto`] builds descriptor fixtures without running `protoc`.
//! - [`tree`] materialises source trees in temporary directories.

pub mod jail;
pub mod proto;
pub mod tree;
