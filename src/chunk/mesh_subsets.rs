//! Mesh subset chunks split a mesh's vertex and index ranges by material.

use glam::Vec3;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::Result;

use super::{skip_embedded_header, ChunkDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSubset {
    pub first_index: u32,
    pub index_count: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub material_id: u32,
    pub radius: f32,
    pub center: Vec3,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshSubsetsChunk {
    pub flags: u32,
    pub subsets: Vec<MeshSubset>,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<MeshSubsetsChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let flags = r.read_u32("eof reading mesh subset flags")?;
    let count = r.read_u32("eof reading mesh subset count")?;
    r.skip(8, "eof reading mesh subset reserved words")?;
    let count = r.array_len(count, 36, "mesh subset count exceeds the chunk")?;

    let mut subsets = Vec::with_capacity(count);
    for _ in 0..count {
        subsets.push(MeshSubset {
            first_index: r.read_u32("eof reading mesh subset")?,
            index_count: r.read_u32("eof reading mesh subset")?,
            first_vertex: r.read_u32("eof reading mesh subset")?,
            vertex_count: r.read_u32("eof reading mesh subset")?,
            material_id: r.read_u32("eof reading mesh subset")?,
            radius: r.read_f32("eof reading mesh subset")?,
            center: r.read_vec3("eof reading mesh subset")?,
        });
    }

    Ok(MeshSubsetsChunk { flags, subsets })
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;
    use crate::Error;

    #[test]
    fn reads_each_subset_record() {
        let mut buf = Vec::new();
        for value in [0_u32, 2, 0, 0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for (first_index, material) in [(0_u32, 4_u32), (36, 5)] {
            for value in [first_index, 36, 0, 24, material] {
                buf.extend_from_slice(&value.to_le_bytes());
            }
            for value in [0.5_f32, 0.0, 0.0, 1.0] {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::MeshSubsets,
            version: 0x800,
            offset: 0,
            id: 0x1D,
            size: buf.len() as u32,
        };
        let chunk = decode(&buf, Dialect::Modern, &descriptor).unwrap();

        assert_eq!(chunk.subsets.len(), 2);
        assert_eq!(chunk.subsets[0].material_id, 4);
        assert_eq!(chunk.subsets[1].first_index, 36);
        assert_eq!(chunk.subsets[1].center, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn count_beyond_the_chunk_is_an_error() {
        let mut buf = Vec::new();
        for value in [0_u32, u32::MAX, 0, 0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::MeshSubsets,
            version: 0x800,
            offset: 0,
            id: 0x1D,
            size: buf.len() as u32,
        };
        let result = decode(&buf, Dialect::Modern, &descriptor);

        assert!(matches!(result, Err(Error::Corrupted { .. })));
    }
}
