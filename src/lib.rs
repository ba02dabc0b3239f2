#![warn(clippy::all, clippy::pedantic)]
// chunk offsets and counts come off the wire as u32
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

//! Parser for CryEngine's cgf/cga model container format.
//!
//! A cgf file is a flat table of typed, versioned, sized chunks addressed by
//! integer id. Two incompatible on-disk layouts exist: the legacy `CryTek`
//! layout (engine 3.4 and earlier) and the modern `CrChF` layout (3.6 and
//! newer). [`Model::decode`] detects the layout from the file signature,
//! decodes every chunk it knows about and resolves the cross-chunk reference
//! graph (node parents, mesh datastreams, bone trees) into a navigable,
//! read-only model.
//!
//! Decoding is tolerant by design: malformed individual chunks degrade to
//! placeholders and are reported through [`Model::diagnostics`], and only
//! damage that makes the whole file unreadable (bad signature, truncated
//! chunk table, a bone tree walking out of its chunk) aborts the decode.

mod binary_utils;
mod half;
mod header;
mod model;

pub mod chunk;

use std::result;

use thiserror::Error;

pub use half::{cry_half_to_f32, dymek_half_to_f32};
pub use header::{ChunkTable, Dialect, FileKind, Header, TIMING_ID_TAG};
pub use model::{Model, NodeGraph};

use chunk::ChunkKind;

/// Fatal decode failure: the file as a whole cannot be decoded.
///
/// Everything recoverable is an [`Anomaly`] instead and never aborts the
/// decode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("not a cgf file: unrecognized signature `{signature}`")]
    UnrecognizedSignature { signature: String },
    #[error("chunk table truncated: expected {expected} entries, got {read}")]
    TruncatedTable { expected: u32, read: u32 },
    #[error("bone tree record at {offset:#x} outside chunk range {start:#x}..{end:#x}")]
    BoneTreeOverrun {
        offset: usize,
        start: usize,
        end: usize,
    },
    #[error("file corrupted: {error}")]
    Corrupted { error: &'static str },
}

pub type Result<T> = result::Result<T, Error>;

/// Recoverable oddity encountered while decoding.
///
/// Anomalies are collected into [`Model::diagnostics`] and also emitted as
/// `tracing` warnings at the point they are found. Each one has a defined
/// fallback, so a decoded model is always usable even when the list is
/// non-empty. Several of these preserve undocumented legacy exporter
/// behavior (keep-first on a duplicate id, first node chunk becomes the
/// root) rather than asserting it as correct.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Anomaly {
    #[error("duplicate chunk id {id:#010x}: keeping the earlier {kept:?} chunk, dropping a {dropped:?}")]
    DuplicateChunkId {
        id: u32,
        kept: ChunkKind,
        dropped: ChunkKind,
    },
    #[error("node {id:#x} `{name}` references missing parent {parent_id:#x}, treating it as a child of the root")]
    DanglingParentRef {
        id: u32,
        name: String,
        parent_id: u32,
    },
    #[error("unknown chunk type {code:#x} in chunk table")]
    UnknownChunkKind { code: u32 },
    #[error("unknown datastream encoding in chunk {id:#x}: type {kind:#x}, {bytes_per_element} bytes per element")]
    UnknownDataStream {
        id: u32,
        kind: u32,
        bytes_per_element: u32,
    },
    #[error("unrecognized material name version {version:#x} in chunk {id:#x}")]
    UnknownMtlNameVersion { id: u32, version: u32 },
    #[error("failed to decode {kind:?} chunk {id:#x}: {error}")]
    ChunkDecodeFailed {
        id: u32,
        kind: ChunkKind,
        error: String,
    },
    #[error("node {id:#x} declares no parent but node {root_id:#x} was already chosen as root")]
    RootNodeAmbiguous { id: u32, root_id: u32 },
}
