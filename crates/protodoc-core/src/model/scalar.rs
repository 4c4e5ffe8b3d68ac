//! Protobuf scalar value types.

use serde::Serialize;

const SCALARS: &[(&str, &str)] = &[
    ("double", ""),
    ("float", ""),
    (
        "int32",
        "Uses variable-length encoding. Inefficient for encoding negative numbers; \
         if your field is likely to have negative values, use sint32 instead.",
    ),
    (
        "int64",
        "Uses variable-length encoding. Inefficient for encoding negative numbers; \
         if your field is likely to have negative values, use sint64 instead.",
    ),
    ("uint32", "Uses variable-length encoding."),
    ("uint64", "Uses variable-length encoding."),
    (
        "sint32",
        "Uses variable-length encoding. Signed int value. \
         These more efficiently encode negative numbers than regular int32s.",
    ),
    (
        "sint64",
        "Uses variable-length encoding. Signed int value. \
         These more efficiently encode negative numbers than regular int64s.",
    ),
    (
        "fixed32",
        "Always four bytes. More efficient than uint32 if values are often greater than 2^28.",
    ),
    (
        "fixed64",
        "Always eight bytes. More efficient than uint64 if values are often greater than 2^56.",
    ),
    ("sfixed32", "Always four bytes."),
    ("sfixed64", "Always eight bytes."),
    ("bool", ""),
    (
        "string",
        "A string must always contain UTF-8 encoded or 7-bit ASCII text.",
    ),
    ("bytes", "May contain any arbitrary sequence of bytes."),
];

/// A protobuf scalar type and its encoding notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarValue {
    /// Scalar keyword, e.g. `sint64`
    pub proto_type: String,
    /// Encoding notes
    pub notes: String,
}

/// Every protobuf scalar type, in the order of the language guide
pub fn scalar_values() -> Vec<ScalarValue> {
    SCALARS
        .iter()
        .map(|(proto_type, notes)| ScalarValue {
            proto_type: proto_type.to_string(),
            notes: notes.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::scalar_name;
    use prost_types::field_descriptor_proto::Type;

    #[test]
    fn test_scalars_match_field_types() {
        let scalars = scalar_values();
        assert_eq!(scalars.len(), 15);
        for kind in [Type::Double, Type::Int32, Type::Sfixed64, Type::Bool, Type::Bytes] {
            let name = scalar_name(kind);
            assert!(scalars.iter().any(|s| s.proto_type == name), "missing {}", name);
        }
    }
}
