//! Compiled physical proxies: per-bone collision hulls (hit boxes).

use glam::Vec3;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::Result;

use super::{skip_embedded_header, ChunkDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalProxy {
    pub id: u32,
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicalProxiesChunk {
    pub proxies: Vec<PhysicalProxy>,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<PhysicalProxiesChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let count = r.read_u32("eof reading proxy count")?;
    let count = r.array_len(count, 16, "proxy count exceeds the chunk")?;
    let mut proxies = Vec::with_capacity(count);
    for _ in 0..count {
        let id = r.read_u32("eof reading proxy id")?;
        let vertex_count = r.read_u32("eof reading proxy vertex count")?;
        let index_count = r.read_u32("eof reading proxy index count")?;
        let trailing_bytes = r.read_u32("eof reading proxy trailing size")?;
        let vertex_count = r.array_len(vertex_count, 12, "proxy vertex count exceeds the chunk")?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            vertices.push(r.read_vec3("eof reading proxy vertices")?);
        }
        let index_count = r.array_len(index_count, 2, "proxy index count exceeds the chunk")?;
        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            indices.push(r.read_u16("eof reading proxy indices")?);
        }
        // the trailing block must be consumed to land on the next record
        r.skip(
            (trailing_bytes / 2) as usize * 2,
            "eof reading proxy trailing block",
        )?;

        proxies.push(PhysicalProxy {
            id,
            vertices,
            indices,
        });
    }

    Ok(PhysicalProxiesChunk { proxies })
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;

    #[test]
    fn trailing_block_does_not_shift_the_next_record() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2_u32.to_le_bytes());
        // proxy 0: one vertex, one index, 4 trailing bytes
        for value in [7_u32, 1, 1, 4] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for value in [1.0_f32, 2.0, 3.0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&9_u16.to_le_bytes());
        buf.extend_from_slice(&[0xAA; 4]); // trailing block
        // proxy 1: empty
        for value in [8_u32, 0, 0, 0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::CompiledPhysicalProxies,
            version: 0x800,
            offset: 0,
            id: 0x50,
            size: buf.len() as u32,
        };
        let chunk = decode(&buf, Dialect::Modern, &descriptor).unwrap();

        assert_eq!(chunk.proxies.len(), 2);
        assert_eq!(chunk.proxies[0].id, 7);
        assert_eq!(chunk.proxies[0].vertices, [Vec3::new(1.0, 2.0, 3.0)]);
        assert_eq!(chunk.proxies[0].indices, [9]);
        assert_eq!(chunk.proxies[1].id, 8);
    }
}
