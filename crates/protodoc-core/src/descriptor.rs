//! Descriptor input.
//!
//! A [`DescriptorSet`] holds the decoded `FileDescriptorProto`s to document
//! together with a reflection pool built from the original wire bytes. The
//! pool is what makes custom options visible: `prost_types` drops unknown
//! fields while decoding, so extension options only survive in the raw
//! payload.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::FileDescriptorProto;
use tracing::{debug, warn};

/// Proto syntax version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoSyntax {
    /// Proto2 syntax
    Proto2,
    /// Proto3 syntax
    Proto3,
}

impl ProtoSyntax {
    /// Returns the syntax declaration string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtoSyntax::Proto2 => "proto2",
            ProtoSyntax::Proto3 => "proto3",
        }
    }

    /// Classifies a file, treating unknown syntaxes like proto2
    pub fn of(file: &FileDescriptorProto) -> Self {
        ProtoSyntax::try_from(file.syntax()).unwrap_or_else(|e| {
            debug!("{}: {}, using proto2 labels", file.name(), e);
            ProtoSyntax::Proto2
        })
    }
}

impl TryFrom<&str> for ProtoSyntax {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "" | "proto2" => Ok(ProtoSyntax::Proto2),
            "proto3" => Ok(ProtoSyntax::Proto3),
            _ => Err(Error::UnsupportedSyntax {
                syntax: value.to_string(),
            }),
        }
    }
}

/// `google.protobuf.FileDescriptorSet` with files kept as raw bytes
#[derive(Clone, PartialEq, Message)]
struct RawFileSet {
    #[prost(bytes = "bytes", repeated, tag = "1")]
    file: Vec<Bytes>,
}

/// `google.protobuf.compiler.CodeGeneratorRequest` with files kept as raw bytes
#[derive(Clone, PartialEq, Message)]
struct RawGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    parameter: Option<String>,
    #[prost(bytes = "bytes", repeated, tag = "15")]
    proto_file: Vec<Bytes>,
}

/// The parsed descriptors to build a model from.
#[derive(Debug, Clone)]
pub struct DescriptorSet {
    files: Vec<FileDescriptorProto>,
    /// Indices into `files`, in documentation order
    targets: Vec<usize>,
    parameter: Option<String>,
    pool: Option<DescriptorPool>,
}

impl DescriptorSet {
    /// Decodes an encoded `FileDescriptorSet`; every file is documented
    pub fn decode<B: Buf>(buf: B) -> Result<Self> {
        let raw = RawFileSet::decode(buf)?;
        Self::from_raw(raw.file, None)
    }

    /// Decodes an encoded `CodeGeneratorRequest`; `file_to_generate` is documented
    pub fn from_code_generator_request<B: Buf>(buf: B) -> Result<Self> {
        let raw = RawGeneratorRequest::decode(buf)?;
        let mut set = Self::from_raw(raw.proto_file, raw.parameter)?;
        set = set.with_targets(&raw.file_to_generate)?;
        Ok(set)
    }

    /// Wraps already-decoded files; every file is documented
    pub fn from_files(files: Vec<FileDescriptorProto>) -> Self {
        let raw: Vec<Bytes> = files
            .iter()
            .map(|f| Bytes::from(f.encode_to_vec()))
            .collect();
        let pool = build_pool(raw);
        Self {
            targets: (0..files.len()).collect(),
            files,
            parameter: None,
            pool,
        }
    }

    fn from_raw(raw: Vec<Bytes>, parameter: Option<String>) -> Result<Self> {
        let files = raw
            .iter()
            .map(|bytes| FileDescriptorProto::decode(&bytes[..]))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("decoded {} file descriptor(s)", files.len());

        Ok(Self {
            targets: (0..files.len()).collect(),
            files,
            parameter,
            pool: build_pool(raw),
        })
    }

    /// Restricts documentation to the named files, in the given order
    pub fn with_targets<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        self.targets = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.files
                    .iter()
                    .position(|f| f.name() == name)
                    .ok_or_else(|| Error::unknown_target(name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Files to document, in documentation order
    pub fn targets(&self) -> impl Iterator<Item = &FileDescriptorProto> + '_ {
        self.targets.iter().map(move |&i| &self.files[i])
    }

    /// Every file in the input, including imports that are not documented
    pub fn files(&self) -> &[FileDescriptorProto] {
        &self.files
    }

    /// Reflection pool, if the input resolved completely
    pub fn pool(&self) -> Option<&DescriptorPool> {
        self.pool.as_ref()
    }

    /// Plugin parameter string of a `CodeGeneratorRequest`
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }
}

fn build_pool(raw: Vec<Bytes>) -> Option<DescriptorPool> {
    let encoded = RawFileSet { file: raw }.encode_to_vec();
    match DescriptorPool::decode(encoded.as_slice()) {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("descriptor pool unavailable, raw options will be skipped: {}", e);
            None
        }
    }
}
