//! Mesh chunks hold no geometry themselves, only the ids of the datastream
//! and subset chunks that do, plus the mesh bounds.

use glam::Vec3;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::{Error, Result};

use super::{skip_embedded_header, ChunkDescriptor};

/// A stream id of 0 means the mesh has no stream of that kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshChunk {
    pub vertex_count: u32,
    pub index_count: u32,
    /// Id of the [`MeshSubsetsChunk`](super::MeshSubsetsChunk).
    pub subsets_id: u32,
    pub vertices_id: u32,
    pub normals_id: u32,
    pub uvs_id: u32,
    pub colors_id: u32,
    pub colors2_id: u32,
    pub indices_id: u32,
    pub tangents_id: u32,
    pub sh_coeffs_id: u32,
    pub shape_deformation_id: u32,
    pub bone_map_id: u32,
    pub face_map_id: u32,
    pub vert_mats_id: u32,
    pub verts_uvs_id: u32,
    pub min_bound: Vec3,
    pub max_bound: Vec3,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<MeshChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    match descriptor.version {
        0x800 => decode_v800(&mut r),
        0x801 => decode_v801(&mut r),
        _ => Err(Error::Corrupted {
            error: "unsupported mesh chunk version",
        }),
    }
}

fn decode_v800(r: &mut Reader<'_>) -> Result<MeshChunk> {
    r.skip(8, "eof reading mesh header")?;
    let vertex_count = r.read_u32("eof reading mesh vertex count")?;
    let index_count = r.read_u32("eof reading mesh index count")?;
    r.skip(4, "eof reading mesh header")?;
    let subsets_id = r.read_u32("eof reading mesh subsets id")?;
    r.skip(4, "eof reading mesh header")?;

    let mut chunk = MeshChunk {
        vertex_count,
        index_count,
        subsets_id,
        vertices_id: r.read_u32("eof reading mesh stream ids")?,
        normals_id: r.read_u32("eof reading mesh stream ids")?,
        uvs_id: r.read_u32("eof reading mesh stream ids")?,
        colors_id: r.read_u32("eof reading mesh stream ids")?,
        colors2_id: r.read_u32("eof reading mesh stream ids")?,
        indices_id: r.read_u32("eof reading mesh stream ids")?,
        tangents_id: r.read_u32("eof reading mesh stream ids")?,
        sh_coeffs_id: r.read_u32("eof reading mesh stream ids")?,
        shape_deformation_id: r.read_u32("eof reading mesh stream ids")?,
        bone_map_id: r.read_u32("eof reading mesh stream ids")?,
        face_map_id: r.read_u32("eof reading mesh stream ids")?,
        vert_mats_id: r.read_u32("eof reading mesh stream ids")?,
        ..MeshChunk::default()
    };
    r.skip(32, "eof reading mesh reserved words")?;
    chunk.min_bound = r.read_vec3("eof reading mesh bounds")?;
    chunk.max_bound = r.read_vec3("eof reading mesh bounds")?;
    Ok(chunk)
}

fn decode_v801(r: &mut Reader<'_>) -> Result<MeshChunk> {
    r.skip(8, "eof reading mesh header")?;
    let vertex_count = r.read_u32("eof reading mesh vertex count")?;
    let index_count = r.read_u32("eof reading mesh index count")?;
    r.skip(4, "eof reading mesh header")?;
    let subsets_id = r.read_u32("eof reading mesh subsets id")?;
    r.skip(4, "eof reading mesh header")?;

    let mut chunk = MeshChunk {
        vertex_count,
        index_count,
        subsets_id,
        vertices_id: r.read_u32("eof reading mesh stream ids")?,
        normals_id: r.read_u32("eof reading mesh stream ids")?,
        uvs_id: r.read_u32("eof reading mesh stream ids")?,
        colors_id: r.read_u32("eof reading mesh stream ids")?,
        colors2_id: r.read_u32("eof reading mesh stream ids")?,
        indices_id: r.read_u32("eof reading mesh stream ids")?,
        tangents_id: r.read_u32("eof reading mesh stream ids")?,
        ..MeshChunk::default()
    };
    r.skip(32, "eof reading mesh reserved words")?;
    chunk.verts_uvs_id = r.read_u32("eof reading mesh stream ids")?;
    chunk.sh_coeffs_id = r.read_u32("eof reading mesh stream ids")?;
    chunk.shape_deformation_id = r.read_u32("eof reading mesh stream ids")?;
    chunk.bone_map_id = r.read_u32("eof reading mesh stream ids")?;
    chunk.face_map_id = r.read_u32("eof reading mesh stream ids")?;
    chunk.min_bound = r.read_vec3("eof reading mesh bounds")?;
    chunk.max_bound = r.read_vec3("eof reading mesh bounds")?;
    Ok(chunk)
}
