//! Node chunks form the scene tree: each one names an object chunk (mesh or
//! helper), its parent node and its local transform.

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::Result;

use super::{skip_embedded_header, ChunkDescriptor};

/// Parent id meaning "no parent": this node is a root.
pub const PARENT_NONE: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Node grouping booleans packed into the filler word after the
    /// material id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        const GROUP_HEAD = 0x1;
        const GROUP_MEMBER = 0x100;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeChunk {
    pub name: String,
    /// Id of the mesh or helper chunk this node places.
    pub object_id: u32,
    /// Id of the parent node chunk, or [`PARENT_NONE`].
    pub parent_id: u32,
    pub child_count: u32,
    pub material_id: u32,
    pub flags: NodeFlags,
    /// Full local transform as stored, already converted to glam's column
    /// convention. Translation stays in centimeters here.
    pub transform: Mat4,
    /// Decomposed local position, converted from centimeters to meters.
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub position_controller_id: u32,
    pub rotation_controller_id: u32,
    pub scale_controller_id: u32,
}

impl NodeChunk {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id == PARENT_NONE
    }
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<NodeChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let name = r.read_name(64, "eof reading node name")?;
    let object_id = r.read_u32("eof reading node object id")?;
    let parent_id = r.read_u32("eof reading node parent id")?;
    let child_count = r.read_u32("eof reading node child count")?;
    let material_id = r.read_u32("eof reading node material id")?;
    let flags = NodeFlags::from_bits_retain(r.read_u32("eof reading node flags")?);
    let transform = r.read_mat4("eof reading node transform")?;
    // positions are stored in centimeters
    let position = r.read_vec3("eof reading node position")? / 100.0;
    let rotation = r.read_quat_wxyz("eof reading node rotation")?;
    let scale = r.read_vec3("eof reading node scale")?;
    let position_controller_id = r.read_u32("eof reading node position controller")?;
    let rotation_controller_id = r.read_u32("eof reading node rotation controller")?;
    let scale_controller_id = r.read_u32("eof reading node scale controller")?;

    Ok(NodeChunk {
        name,
        object_id,
        parent_id,
        child_count,
        material_id,
        flags,
        transform,
        position,
        rotation,
        scale,
        position_controller_id,
        rotation_controller_id,
        scale_controller_id,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn synthetic_node_payload() -> Vec<u8> {
        let mut buf = Vec::new();
        let mut name = [0_u8; 64];
        name[..5].copy_from_slice(b"wheel");
        buf.extend_from_slice(&name);
        for value in [7_u32, PARENT_NONE, 0, 2, 0x101] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        // identity transform, row-major
        for row in 0..4_usize {
            for col in 0..4_usize {
                let value: f32 = if row == col { 1.0 } else { 0.0 };
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        for value in [150.0_f32, 0.0, -50.0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        // quaternion on disk is w, x, y, z
        for value in [0.0_f32, 0.0, 1.0, 0.0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for value in [1.0_f32, 1.0, 1.0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for value in [11_u32, 12, 13] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }

    #[test]
    fn decodes_modern_node() {
        let buf = synthetic_node_payload();
        let descriptor = ChunkDescriptor {
            kind: super::super::ChunkKind::Node,
            version: 0x823,
            offset: 0,
            id: 1,
            size: buf.len() as u32,
        };

        let node = decode(&buf, Dialect::Modern, &descriptor).unwrap();

        assert_eq!(node.name, "wheel");
        assert_eq!(node.object_id, 7);
        assert!(node.is_root());
        assert_eq!(node.material_id, 2);
        assert_eq!(node.flags, NodeFlags::GROUP_HEAD | NodeFlags::GROUP_MEMBER);
        // centimeters become meters
        assert_relative_eq!(node.position.x, 1.5);
        assert_relative_eq!(node.position.z, -0.5);
        // stored w, x, y, z; x component on disk was 0, y was 1
        assert_relative_eq!(node.rotation.x, 0.0);
        assert_relative_eq!(node.rotation.y, 1.0);
        assert_relative_eq!(node.rotation.w, 0.0);
        assert_eq!(
            (node.position_controller_id, node.rotation_controller_id),
            (11, 12)
        );
    }

    #[test]
    fn legacy_node_skips_embedded_header() {
        let mut buf = vec![0_u8; 16];
        buf.extend_from_slice(&synthetic_node_payload());
        let descriptor = ChunkDescriptor {
            kind: super::super::ChunkKind::Node,
            version: 0x823,
            offset: 0,
            id: 1,
            size: buf.len() as u32,
        };

        let node = decode(&buf, Dialect::Legacy, &descriptor).unwrap();
        assert_eq!(node.name, "wheel");
    }
}
