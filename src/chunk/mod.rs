//! Chunk kinds, the decoded chunk variants and the per-kind dispatch.
//!
//! The two dialects name chunk kinds differently: legacy files use 32-bit
//! codes (`0xCCCC_xxxx` for source-asset chunks, `0xACDC_xxxx` for compiled
//! ones), modern files use a 16-bit code table starting at `0x1000`. Both
//! spaces map onto the single [`ChunkKind`] enum here.

mod bones;
mod controller;
mod data_stream;
mod export_flags;
mod helper;
mod mesh;
mod mesh_subsets;
mod mtl_name;
mod node;
mod physical_proxies;
mod scene_props;
mod source_info;
mod timing;

pub use bones::{Bone, BonePhysics, BonesChunk};
pub use controller::{ControllerChunk, ControllerKey};
pub use data_stream::{DataStreamChunk, StreamData, Tangent};
pub use export_flags::ExportFlagsChunk;
pub use helper::HelperChunk;
pub use mesh::MeshChunk;
pub use mesh_subsets::{MeshSubset, MeshSubsetsChunk};
pub use mtl_name::{MaterialFlags, MtlNameChunk};
pub use node::{NodeChunk, NodeFlags, PARENT_NONE};
pub use physical_proxies::{PhysicalProxiesChunk, PhysicalProxy};
pub use scene_props::{SceneProp, ScenePropsChunk};
pub use source_info::SourceInfoChunk;
pub use timing::TimingChunk;

use tracing::trace;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::{Anomaly, Result};

/// What a chunk contains, independent of the dialect that encoded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Mesh,
    Helper,
    VertAnim,
    BoneAnim,
    GeomNameList,
    BoneNameList,
    MtlList,
    Mrm,
    SceneProps,
    Light,
    PatchMesh,
    Node,
    Mtl,
    Controller,
    Timing,
    BoneMesh,
    BoneLightBinding,
    MeshMorphTarget,
    BoneInitialPos,
    SourceInfo,
    MtlName,
    ExportFlags,
    DataStream,
    MeshSubsets,
    MeshPhysicsData,
    CompiledBones,
    CompiledPhysicalBones,
    CompiledMorphTargets,
    CompiledPhysicalProxies,
    CompiledIntFaces,
    CompiledIntSkinVertices,
    CompiledExt2IntMap,
    /// A legacy code outside both known families, carried through verbatim.
    Unknown(u32),
}

impl ChunkKind {
    /// Maps a legacy 32-bit chunk type code. Unknown codes are preserved
    /// rather than rejected; legacy decoding treats them as opaque.
    #[must_use]
    pub fn from_legacy(code: u32) -> Self {
        match code {
            0xCCCC_0000 => Self::Mesh,
            0xCCCC_0001 => Self::Helper,
            0xCCCC_0002 => Self::VertAnim,
            0xCCCC_0003 => Self::BoneAnim,
            0xCCCC_0004 => Self::GeomNameList,
            0xCCCC_0005 => Self::BoneNameList,
            0xCCCC_0006 => Self::MtlList,
            0xCCCC_0007 => Self::Mrm,
            0xCCCC_0008 => Self::SceneProps,
            0xCCCC_0009 => Self::Light,
            0xCCCC_000A => Self::PatchMesh,
            0xCCCC_000B => Self::Node,
            0xCCCC_000C => Self::Mtl,
            0xCCCC_000D => Self::Controller,
            0xCCCC_000E => Self::Timing,
            0xCCCC_000F => Self::BoneMesh,
            0xCCCC_0010 => Self::BoneLightBinding,
            0xCCCC_0011 => Self::MeshMorphTarget,
            0xCCCC_0012 => Self::BoneInitialPos,
            0xCCCC_0013 => Self::SourceInfo,
            0xCCCC_0014 => Self::MtlName,
            0xCCCC_0015 => Self::ExportFlags,
            0xCCCC_0016 => Self::DataStream,
            0xCCCC_0017 => Self::MeshSubsets,
            0xCCCC_0018 => Self::MeshPhysicsData,
            0xACDC_0000 => Self::CompiledBones,
            0xACDC_0001 => Self::CompiledPhysicalBones,
            0xACDC_0002 => Self::CompiledMorphTargets,
            0xACDC_0003 => Self::CompiledPhysicalProxies,
            0xACDC_0004 => Self::CompiledIntFaces,
            0xACDC_0005 => Self::CompiledIntSkinVertices,
            0xACDC_0006 => Self::CompiledExt2IntMap,
            other => Self::Unknown(other),
        }
    }

    /// Maps a modern 16-bit chunk type code, or `None` for a code outside
    /// the table.
    #[must_use]
    pub fn from_modern(code: u16) -> Option<Self> {
        Some(match code {
            0x1000 => Self::Mesh,
            0x1001 => Self::Helper,
            0x1002 => Self::VertAnim,
            0x1003 => Self::BoneAnim,
            0x1004 => Self::GeomNameList,
            0x1005 => Self::BoneNameList,
            0x1006 => Self::MtlList,
            0x1007 => Self::Mrm,
            0x1008 => Self::SceneProps,
            0x1009 => Self::Light,
            0x100A => Self::PatchMesh,
            0x100B => Self::Node,
            0x100C => Self::Mtl,
            0x100D => Self::Controller,
            0x100E => Self::Timing,
            0x100F => Self::BoneMesh,
            0x1010 => Self::BoneLightBinding,
            0x1011 => Self::MeshMorphTarget,
            0x1012 => Self::BoneInitialPos,
            0x1013 => Self::SourceInfo,
            0x1014 => Self::MtlName,
            0x1015 => Self::ExportFlags,
            0x1016 => Self::DataStream,
            0x1017 => Self::MeshSubsets,
            0x1018 => Self::MeshPhysicsData,
            _ => return None,
        })
    }
}

/// One entry of the chunk table, normalized across dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub kind: ChunkKind,
    pub version: u32,
    pub offset: u32,
    pub id: u32,
    pub size: u32,
}

impl ChunkDescriptor {
    /// Byte range of the chunk payload inside the file buffer.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}

/// A chunk whose kind has no decoder; kept so the registry stays complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChunk {
    pub kind: ChunkKind,
    pub version: u32,
    pub id: u32,
    pub size: u32,
}

/// A decoded chunk payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Node(NodeChunk),
    Helper(HelperChunk),
    Mesh(MeshChunk),
    MeshSubsets(MeshSubsetsChunk),
    DataStream(DataStreamChunk),
    MtlName(MtlNameChunk),
    Controller(ControllerChunk),
    Timing(TimingChunk),
    ExportFlags(ExportFlagsChunk),
    SourceInfo(SourceInfoChunk),
    SceneProps(ScenePropsChunk),
    CompiledBones(BonesChunk),
    CompiledPhysicalProxies(PhysicalProxiesChunk),
    Unknown(UnknownChunk),
}

impl Chunk {
    #[must_use]
    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::Node(_) => ChunkKind::Node,
            Self::Helper(_) => ChunkKind::Helper,
            Self::Mesh(_) => ChunkKind::Mesh,
            Self::MeshSubsets(_) => ChunkKind::MeshSubsets,
            Self::DataStream(_) => ChunkKind::DataStream,
            Self::MtlName(_) => ChunkKind::MtlName,
            Self::Controller(_) => ChunkKind::Controller,
            Self::Timing(_) => ChunkKind::Timing,
            Self::ExportFlags(_) => ChunkKind::ExportFlags,
            Self::SourceInfo(_) => ChunkKind::SourceInfo,
            Self::SceneProps(_) => ChunkKind::SceneProps,
            Self::CompiledBones(_) => ChunkKind::CompiledBones,
            Self::CompiledPhysicalProxies(_) => ChunkKind::CompiledPhysicalProxies,
            Self::Unknown(chunk) => chunk.kind,
        }
    }
}

/// Decodes the payload a descriptor points at.
///
/// Kinds without a decoder come back as [`Chunk::Unknown`]; errors are left
/// to the caller, which decides between aborting the file (bone tree
/// overruns) and degrading the single chunk.
pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
    diagnostics: &mut Vec<Anomaly>,
) -> Result<Chunk> {
    trace!(
        kind = ?descriptor.kind,
        id = descriptor.id,
        version = descriptor.version,
        offset = descriptor.offset,
        "decoding chunk"
    );

    Ok(match descriptor.kind {
        ChunkKind::Node => Chunk::Node(node::decode(bytes, dialect, descriptor)?),
        ChunkKind::Helper => Chunk::Helper(helper::decode(bytes, dialect, descriptor)?),
        ChunkKind::Mesh => Chunk::Mesh(mesh::decode(bytes, dialect, descriptor)?),
        ChunkKind::MeshSubsets => {
            Chunk::MeshSubsets(mesh_subsets::decode(bytes, dialect, descriptor)?)
        }
        ChunkKind::DataStream => {
            Chunk::DataStream(data_stream::decode(bytes, dialect, descriptor, diagnostics)?)
        }
        ChunkKind::MtlName => {
            Chunk::MtlName(mtl_name::decode(bytes, dialect, descriptor, diagnostics)?)
        }
        ChunkKind::Controller => {
            Chunk::Controller(controller::decode(bytes, dialect, descriptor)?)
        }
        ChunkKind::Timing => Chunk::Timing(timing::decode(bytes, descriptor)?),
        ChunkKind::ExportFlags => Chunk::ExportFlags(export_flags::decode(bytes, descriptor)?),
        ChunkKind::SourceInfo => Chunk::SourceInfo(source_info::decode(bytes, descriptor)?),
        ChunkKind::SceneProps => {
            Chunk::SceneProps(scene_props::decode(bytes, dialect, descriptor)?)
        }
        ChunkKind::CompiledBones => {
            Chunk::CompiledBones(bones::decode(bytes, dialect, descriptor)?)
        }
        ChunkKind::CompiledPhysicalProxies => {
            Chunk::CompiledPhysicalProxies(physical_proxies::decode(bytes, dialect, descriptor)?)
        }
        _ => Chunk::Unknown(UnknownChunk {
            kind: descriptor.kind,
            version: descriptor.version,
            id: descriptor.id,
            size: descriptor.size,
        }),
    })
}

/// Legacy chunk payloads start with a repeat of their own table entry
/// (`kind`, `version`, `offset`, `id`). The table is authoritative, so the
/// copy is skipped, not compared.
fn skip_embedded_header(r: &mut Reader<'_>, dialect: Dialect) -> Result<()> {
    if dialect == Dialect::Legacy {
        r.skip(16, "eof reading embedded chunk header")?;
    }
    Ok(())
}
