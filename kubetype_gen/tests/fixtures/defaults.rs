//! Spec types for the layered-tag fixture.
//!
//! +kubetype-gen:groupVersion=group1/version1

use serde::{Deserialize, Serialize};

// Plain comment blocks between items are detached and never copied.

/// AllOverridden is for test
/// +kubetype-gen
/// +kubetype-gen:groupVersion=group2/version2
/// +kubetype-gen:package=success/defaults/override
/// +kubetype-gen:status=crate::meta::v1beta1::IstioStatus
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllOverridden {
    /// Hosts the resource applies to.
    pub hosts: Vec<String>,
    /// Number of replicas.
    pub replicas: u32,
}

// +kubetype-gen

/// ModuleDefaults takes its groupVersion from the module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefaults {
    /// Whether the feature is on.
    pub enabled: bool,
    /// Weight in percent.
    pub weight: u8,
}

/// NotTagged has no marker and is skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotTagged {
    /// Free-form value.
    pub value: String,
}
