//! Helper chunks: non-rendered placement points (dummies, bone anchors).

use glam::Vec3;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::{Error, Result};

use super::{skip_embedded_header, ChunkDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub struct HelperChunk {
    pub helper_type: u32,
    /// Only the old 0x362 schema stores a name.
    pub name: Option<String>,
    pub position: Vec3,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<HelperChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let helper_type = r.read_u32("eof reading helper type")?;
    match descriptor.version {
        0x744 => Ok(HelperChunk {
            helper_type,
            name: None,
            position: r.read_vec3("eof reading helper position")?,
        }),
        0x362 => {
            let name = r.read_name(64, "eof reading helper name")?;
            let helper_type = r.read_u32("eof reading helper type")?;
            Ok(HelperChunk {
                helper_type,
                name: Some(name),
                position: r.read_vec3("eof reading helper position")?,
            })
        }
        _ => Err(Error::Corrupted {
            error: "unsupported helper chunk version",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;

    fn descriptor(version: u32, size: usize) -> ChunkDescriptor {
        ChunkDescriptor {
            kind: ChunkKind::Helper,
            version,
            offset: 0,
            id: 0x11,
            size: size as u32,
        }
    }

    #[test]
    fn v744_has_position_only() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1_u32.to_le_bytes());
        for value in [4.0_f32, 5.0, 6.0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let chunk = decode(&buf, Dialect::Modern, &descriptor(0x744, buf.len())).unwrap();
        assert_eq!(chunk.helper_type, 1);
        assert_eq!(chunk.name, None);
        assert_eq!(chunk.position, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn v362_carries_a_name() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0_u32.to_le_bytes());
        let mut name = [0_u8; 64];
        name[..5].copy_from_slice(b"dummy");
        buf.extend_from_slice(&name);
        buf.extend_from_slice(&2_u32.to_le_bytes());
        for value in [0.0_f32; 3] {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let chunk = decode(&buf, Dialect::Modern, &descriptor(0x362, buf.len())).unwrap();
        assert_eq!(chunk.name.as_deref(), Some("dummy"));
        assert_eq!(chunk.helper_type, 2);
    }
}
