//! Golden and behavioural tests for the deep-copy pipeline.
//!
//! The golden unit is compiled next to hand-written prost messages that
//! mirror the descriptors, so the emitted methods are exercised as well.

use anyhow::{Result, ensure};
use kubetype_gen::{SynthOptions, generate_deepcopy};
use prost_types::FileDescriptorProto;
use rstest::{fixture, rstest};
use test_helpers::proto::{file, message, with_comments, with_message_field};

mod messages {
    //! Messages as `prost-build` would generate them for `deepcopy.test`.

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct TagType {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, repeated, tag = "2")]
        pub labels: Vec<String>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct RepeatedFieldType {
        #[prost(message, repeated, tag = "1")]
        pub items: Vec<TagType>,
        #[prost(message, optional, tag = "2")]
        pub primary: Option<TagType>,
    }

    include!("golden/deepcopy.test.deepcopy.rs.golden");
}

#[fixture]
fn descriptor() -> FileDescriptorProto {
    let tagged = message("TagType");
    let repeated = with_message_field(
        with_message_field(
            message("RepeatedFieldType"),
            "items",
            ".deepcopy.test.TagType",
            true,
        ),
        "primary",
        ".deepcopy.test.TagType",
        false,
    );
    let untagged = message("Untagged");
    let proto = file(
        "deepcopy/test.proto",
        "deepcopy.test",
        vec![tagged, repeated, untagged],
    );
    let with_attached = with_comments(proto, &[4, 0], "+kubetype-gen\nTagType is tagged directly.", &[]);
    let with_detached = with_comments(
        with_attached,
        &[4, 1],
        "RepeatedFieldType holds tagged items.",
        &["+kubetype-gen"],
    );
    with_comments(with_detached, &[4, 2], "Untagged is left alone.", &[])
}

#[rstest]
fn unit_matches_golden(descriptor: FileDescriptorProto) -> Result<()> {
    let report = generate_deepcopy(&[descriptor], None, &SynthOptions::default());
    ensure!(report.is_clean());
    ensure!(report.candidates == 2, "expected two candidates, got {}", report.candidates);
    let [unit] = report.units.as_slice() else {
        anyhow::bail!("expected one unit, got {}", report.units.len());
    };
    ensure!(unit.path.as_str() == "deepcopy.test.deepcopy.rs", "unexpected path {}", unit.path);
    ensure!(
        unit.text == include_str!("golden/deepcopy.test.deepcopy.rs.golden"),
        "unit differs from its golden file:\n{}",
        unit.text
    );
    Ok(())
}

#[rstest]
fn files_outside_the_request_are_not_generated(descriptor: FileDescriptorProto) {
    let wanted = vec!["other.proto".to_owned()];
    let report = generate_deepcopy(&[descriptor], Some(wanted.as_slice()), &SynthOptions::default());
    assert!(report.units.is_empty());
    assert_eq!(report.candidates, 0);
}

#[rstest]
fn tagged_message_copies_are_independent() {
    let original = messages::TagType {
        name: "first".to_owned(),
        labels: vec!["a".to_owned()],
    };
    let mut copy = original.deep_copy();
    assert_eq!(copy, original);

    copy.labels.push("b".to_owned());
    copy.name.push_str("-changed");
    assert_eq!(original.labels, ["a"]);
    assert_eq!(original.name, "first");
}

#[rstest]
fn repeated_message_fields_are_copied_deeply() {
    let item = messages::TagType {
        name: "item".to_owned(),
        labels: vec!["x".to_owned()],
    };
    let original = messages::RepeatedFieldType {
        items: vec![item.clone()],
        primary: Some(item),
    };

    let mut target = messages::RepeatedFieldType::default();
    original.deep_copy_into(&mut target);
    assert_eq!(target, original);

    if let Some(first) = target.items.first_mut() {
        first.labels.clear();
    }
    if let Some(primary) = target.primary.as_mut() {
        primary.name.clear();
    }
    assert_eq!(
        original.items.first().map(|i| i.labels.len()),
        Some(1)
    );
    assert_eq!(original.primary.as_ref().map(|p| p.name.as_str()), Some("item"));
}
