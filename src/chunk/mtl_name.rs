//! Material name chunks link mesh subsets to entries of the external
//! material library. Two schemas exist, selected by the chunk version.

use bitflags::bitflags;
use tracing::warn;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::{Anomaly, Result};

use super::{skip_embedded_header, ChunkDescriptor};

/// The primary schema reserves 66 child slots regardless of how many are
/// used; the unused tail is padding on disk.
const CHILD_SLOTS: u32 = 66;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MaterialFlags: u32 {
        /// A material library with child entries.
        const LIBRARY = 0x01;
        /// A child entry of a library.
        const CHILD = 0x02;
        /// A standalone material.
        const SINGLE = 0x10;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MtlNameChunk {
    pub flags: MaterialFlags,
    pub name: String,
    /// One entry in the primary schema, one per sub-material in the
    /// multi-material schema.
    pub physics_types: Vec<u32>,
    /// Chunk ids of child materials (primary schema only).
    pub child_ids: Vec<u32>,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
    diagnostics: &mut Vec<Anomaly>,
) -> Result<MtlNameChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    match descriptor.version {
        0x800 | 0x744 => decode_primary(&mut r),
        0x802 => decode_multi_material(&mut r),
        version => {
            let anomaly = Anomaly::UnknownMtlNameVersion {
                id: descriptor.id,
                version,
            };
            warn!("{anomaly}");
            diagnostics.push(anomaly);
            Ok(MtlNameChunk::default())
        }
    }
}

fn decode_primary(r: &mut Reader<'_>) -> Result<MtlNameChunk> {
    let flags = MaterialFlags::from_bits_retain(r.read_u32("eof reading material flags")?);
    r.skip(4, "eof reading material filler")?;
    let name = r.read_name(128, "eof reading material name")?;
    let physics_type = r.read_u32("eof reading material physics type")?;
    let child_count = r.read_u32("eof reading material child count")?;

    let mut child_ids = Vec::new();
    for _ in 0..child_count.min(CHILD_SLOTS) {
        child_ids.push(r.read_u32("eof reading material child ids")?);
    }
    // the rest of the 66 slots is padding
    let padding = CHILD_SLOTS.saturating_sub(child_count) as usize;
    r.skip(padding * 4, "eof reading material child padding")?;

    Ok(MtlNameChunk {
        flags,
        name,
        physics_types: vec![physics_type],
        child_ids,
    })
}

fn decode_multi_material(r: &mut Reader<'_>) -> Result<MtlNameChunk> {
    let name = r.read_name(128, "eof reading material name")?;
    let count = r.read_u32("eof reading sub-material count")?;
    let mut physics_types = Vec::with_capacity(count as usize);
    for _ in 0..count {
        physics_types.push(r.read_u32("eof reading sub-material physics types")?);
    }

    Ok(MtlNameChunk {
        flags: MaterialFlags::empty(),
        name,
        physics_types,
        child_ids: Vec::new(),
    })
}
