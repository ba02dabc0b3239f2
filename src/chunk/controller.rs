//! Animation controller chunks: keyframe tracks referenced by node and bone
//! controller ids.

use glam::Vec3;
use itertools::Itertools;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::Result;

use super::{skip_embedded_header, ChunkDescriptor};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerKey {
    pub time: i32,
    pub abs_pos: Vec3,
    pub rel_pos: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerChunk {
    pub controller_type: u32,
    pub flags: u32,
    /// CRC32 of the bone name this track animates.
    pub controller_id: u32,
    pub keys: Vec<ControllerKey>,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<ControllerChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let controller_type = r.read_u32("eof reading controller type")?;
    let key_count = r.read_u32("eof reading controller key count")?;
    let flags = r.read_u32("eof reading controller flags")?;
    let controller_id = r.read_u32("eof reading controller id")?;
    let key_count = r.array_len(key_count, 28, "controller key count exceeds the chunk")?;

    let keys = (0..key_count)
        .map(|_| {
            Ok(ControllerKey {
                time: r.read_i32("eof reading controller keys")?,
                abs_pos: r.read_vec3("eof reading controller keys")?,
                rel_pos: r.read_vec3("eof reading controller keys")?,
            })
        })
        .try_collect()?;

    Ok(ControllerChunk {
        controller_type,
        flags,
        controller_id,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;

    #[test]
    fn reads_keyframes() {
        let mut buf = Vec::new();
        for value in [0x37_u32, 2, 0, 0xDEAD_BEEF] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for time in [0_i32, 160] {
            buf.extend_from_slice(&time.to_le_bytes());
            for value in [1.0_f32, 2.0, 3.0, 0.0, 0.0, 0.0] {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::Controller,
            version: 0x918,
            offset: 0,
            id: 0x40,
            size: buf.len() as u32,
        };
        let chunk = decode(&buf, Dialect::Modern, &descriptor).unwrap();

        assert_eq!(chunk.controller_id, 0xDEAD_BEEF);
        assert_eq!(chunk.keys.len(), 2);
        assert_eq!(chunk.keys[1].time, 160);
        assert_eq!(chunk.keys[0].abs_pos, Vec3::new(1.0, 2.0, 3.0));
    }
}
