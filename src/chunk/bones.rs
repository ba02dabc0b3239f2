//! Compiled bone hierarchy.
//!
//! Bone records are a flat array of 584-byte slots, but the tree structure
//! is encoded as signed slot offsets relative to each record, so the decoder
//! walks the tree rather than the array. Every computed record position is
//! checked against the chunk's byte range first; a child pointer leaving the
//! chunk is unrecoverable corruption.

use glam::{Mat3, Vec3};

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::{Error, Result};

use super::{skip_embedded_header, ChunkDescriptor};

/// Slot size of one bone record. Only the leading 152 bytes carry decoded
/// fields; the rest is reserved.
const RECORD_STRIDE: usize = 584;

/// Joint limits and spring parameters attached to each bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BonePhysics {
    pub geometry: u32,
    pub flags: u32,
    pub min: Vec3,
    pub max: Vec3,
    pub spring_angle: Vec3,
    pub spring_tension: Vec3,
    pub damping: Vec3,
    pub frame_matrix: Mat3,
}

/// One bone, linked into the arena of its [`BonesChunk`] by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub id: u32,
    pub controller_id: u32,
    /// NUL-terminated prefix of the record's 32-byte property blob.
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub physics: BonePhysics,
}

/// The decoded skeleton: bones in pre-order, root first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BonesChunk {
    pub bones: Vec<Bone>,
}

impl BonesChunk {
    #[must_use]
    pub fn root(&self) -> Option<&Bone> {
        self.bones.first()
    }

    #[must_use]
    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }

    /// Name of a bone's parent, if it has one.
    #[must_use]
    pub fn parent_name(&self, bone: &Bone) -> Option<&str> {
        bone.parent.map(|index| self.bones[index].name.as_str())
    }
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<BonesChunk> {
    let range = descriptor.range();

    let mut r = Reader::at(bytes, range.start);
    skip_embedded_header(&mut r, dialect)?;
    // 8 reserved words
    r.skip(32, "eof reading bone chunk preamble")?;

    let mut walker = Walker {
        bytes,
        start: range.start,
        end: range.end,
        // an upper bound on reachable records; exceeding it means the
        // offsets loop back on themselves
        capacity: descriptor.size as usize / RECORD_STRIDE,
        bones: Vec::new(),
    };
    walker.walk(r.position(), None)?;

    Ok(BonesChunk {
        bones: walker.bones,
    })
}

struct Walker<'a> {
    bytes: &'a [u8],
    start: usize,
    end: usize,
    capacity: usize,
    bones: Vec<Bone>,
}

impl Walker<'_> {
    fn walk(&mut self, record_start: usize, parent: Option<usize>) -> Result<usize> {
        let in_range = record_start >= self.start
            && record_start
                .checked_add(RECORD_STRIDE)
                .is_some_and(|record_end| record_end <= self.end);
        if !in_range {
            return Err(Error::BoneTreeOverrun {
                offset: record_start,
                start: self.start,
                end: self.end,
            });
        }
        if self.bones.len() >= self.capacity {
            return Err(Error::Corrupted {
                error: "bone tree visits more records than fit in the chunk",
            });
        }

        let mut r = Reader::at(self.bytes, record_start);
        let id = r.read_u32("eof reading bone id")?;
        let child_offset = r.read_i32("eof reading bone child offset")?;
        let child_count = r.read_u32("eof reading bone child count")?;
        let controller_id = r.read_u32("eof reading bone controller id")?;
        let name = r.read_name(32, "eof reading bone properties")?;
        let physics = BonePhysics {
            geometry: r.read_u32("eof reading bone physics geometry")?,
            flags: r.read_u32("eof reading bone physics flags")?,
            min: r.read_vec3("eof reading bone physics limits")?,
            max: r.read_vec3("eof reading bone physics limits")?,
            spring_angle: r.read_vec3("eof reading bone spring angle")?,
            spring_tension: r.read_vec3("eof reading bone spring tension")?,
            damping: r.read_vec3("eof reading bone damping")?,
            frame_matrix: r.read_mat3("eof reading bone frame matrix")?,
        };

        let index = self.bones.len();
        self.bones.push(Bone {
            id,
            controller_id,
            name,
            parent,
            children: Vec::with_capacity(child_count as usize),
            physics,
        });

        for i in 0..child_count as usize {
            // child i sits child_offset + i whole records away from this one
            let child_start = record_start as i64
                + i64::from(child_offset) * RECORD_STRIDE as i64
                + (i * RECORD_STRIDE) as i64;
            let child_start = usize::try_from(child_start).map_err(|_| Error::BoneTreeOverrun {
                offset: 0,
                start: self.start,
                end: self.end,
            })?;
            let child_index = self.walk(child_start, Some(index))?;
            self.bones[index].children.push(child_index);
        }

        Ok(index)
    }
}
