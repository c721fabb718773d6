//! Builders for protobuf descriptor fixtures.
//!
//! `protoc` attaches comments through `SourceCodeInfo` locations; these
//! helpers let tests attach them directly by descriptor path.

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet, SourceCodeInfo,
};

/// A message with the given name and no fields.
#[must_use]
pub fn message(name: &str) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        ..Default::default()
    }
}

/// Appends a field referencing another message by fully-qualified name.
#[must_use]
pub fn with_message_field(
    mut message: DescriptorProto,
    name: &str,
    type_name: &str,
    repeated: bool,
) -> DescriptorProto {
    let label = if repeated { Label::Repeated } else { Label::Optional };
    message.field.push(FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(i32::try_from(message.field.len() + 1).unwrap_or(i32::MAX)),
        label: Some(label as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_owned()),
        ..Default::default()
    });
    message
}

/// A file declaring `messages` in `package`.
#[must_use]
pub fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_owned()),
        package: (!package.is_empty()).then(|| package.to_owned()),
        message_type: messages,
        syntax: Some("proto3".to_owned()),
        source_code_info: Some(SourceCodeInfo::default()),
        ..Default::default()
    }
}

/// Attaches comments to the descriptor element at `path`.
///
/// `leading` is written the way `protoc` reports it, one leading space per
/// line.
#[must_use]
pub fn with_comments(
    mut file: FileDescriptorProto,
    path: &[i32],
    leading: &str,
    detached: &[&str],
) -> FileDescriptorProto {
    let location = Location {
        path: path.to_vec(),
        leading_comments: (!leading.is_empty()).then(|| protoc_comment(leading)),
        leading_detached_comments: detached.iter().map(|d| protoc_comment(d)).collect(),
        ..Default::default()
    };
    file.source_code_info
        .get_or_insert_with(SourceCodeInfo::default)
        .location
        .push(location);
    file
}

/// Encodes `files` as a serialized `FileDescriptorSet`.
#[must_use]
pub fn descriptor_set_bytes(files: Vec<FileDescriptorProto>) -> Vec<u8> {
    FileDescriptorSet { file: files }.encode_to_vec()
}

fn protoc_comment(text: &str) -> String {
    text.lines().map(|line| format!(" {line}\n")).collect()
}
