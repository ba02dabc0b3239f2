//! Datastream chunks carry the raw geometry arrays (vertices, normals,
//! indices and friends) that mesh chunks point at by id.
//!
//! The element shape is selected by the pair of the stream's type tag and
//! its declared bytes-per-element. Combinations outside the known set leave
//! the stream empty and are reported, not fatal.

use glam::{Vec2, Vec3};
use tracing::warn;

use crate::binary_utils::Reader;
use crate::half::{cry_half_to_f32, dymek_half_to_f32};
use crate::header::Dialect;
use crate::{Anomaly, Result};

use super::{skip_embedded_header, ChunkDescriptor};

pub const STREAM_VERTICES: u32 = 0;
pub const STREAM_NORMALS: u32 = 1;
pub const STREAM_UVS: u32 = 2;
pub const STREAM_COLORS: u32 = 3;
pub const STREAM_COLORS2: u32 = 4;
pub const STREAM_INDICES: u32 = 5;
pub const STREAM_TANGENTS: u32 = 6;
pub const STREAM_SH_COEFFS: u32 = 7;
pub const STREAM_SHAPE_DEFORMATION: u32 = 8;
pub const STREAM_BONE_MAP: u32 = 9;
pub const STREAM_FACE_MAP: u32 = 10;
pub const STREAM_VERT_MATS: u32 = 11;
pub const STREAM_VERTS_UVS: u32 = 15;

const COUNT_OVERRUN: &str = "datastream element count exceeds the chunk";

/// One element of a tangent stream; fixed-point, divide by 32767 to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tangent {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

/// Decoded stream payload, shaped by the stream type.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamData {
    Vertices(Vec<Vec3>),
    Normals(Vec<Vec3>),
    Uvs(Vec<Vec2>),
    ColorsRgb(Vec<[u8; 3]>),
    ColorsRgba(Vec<[u8; 4]>),
    /// Indices are widened to u32 regardless of the stored width.
    Indices(Vec<u32>),
    /// Two interleaved tangent-space records per element, kept raw.
    Tangents(Vec<[Tangent; 2]>),
    /// Interleaved position + normal + UV, all compact half-floats.
    VertsUvs {
        vertices: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
    },
    /// Per-element byte records without a decoded shape (bone maps, shape
    /// deformation and similar skinning streams).
    Raw(Vec<u8>),
    /// Unknown encoding; the payload was left untouched.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataStreamChunk {
    pub flags: u32,
    /// Raw stream type tag (`STREAM_*`).
    pub stream_type: u32,
    pub element_count: u32,
    pub bytes_per_element: u32,
    pub data: StreamData,
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
    diagnostics: &mut Vec<Anomaly>,
) -> Result<DataStreamChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let flags = r.read_u32("eof reading datastream flags")?;
    let stream_type = r.read_u32("eof reading datastream type")?;
    let element_count = r.read_u32("eof reading datastream element count")?;
    let bytes_per_element = match dialect {
        Dialect::Legacy => r.read_u32("eof reading datastream element size")?,
        Dialect::Modern => {
            let bpe = u32::from(r.read_u16("eof reading datastream element size")?);
            r.skip(2, "eof reading datastream element size")?;
            bpe
        }
    };
    r.skip(8, "eof reading datastream reserved words")?;

    // every known shape validates the declared count against the buffer
    // before allocating anything sized by it
    let data = match (stream_type, bytes_per_element) {
        (STREAM_VERTICES, 12) => {
            let count = r.array_len(element_count, 12, COUNT_OVERRUN)?;
            StreamData::Vertices(read_vec3s(&mut r, count)?)
        }
        (STREAM_VERTICES, 8) => {
            let count = r.array_len(element_count, 8, COUNT_OVERRUN)?;
            let mut vertices = Vec::with_capacity(count);
            for _ in 0..count {
                vertices.push(read_half_vec3(&mut r)?);
                r.skip(2, "eof reading vertex padding")?;
            }
            StreamData::Vertices(vertices)
        }
        (STREAM_VERTICES, 16) => {
            let count = r.array_len(element_count, 16, COUNT_OVERRUN)?;
            let mut vertices = Vec::with_capacity(count);
            for _ in 0..count {
                vertices.push(r.read_vec3("eof reading vertices")?);
                r.skip(4, "eof reading vertex padding")?;
            }
            StreamData::Vertices(vertices)
        }
        // normals and uvs have one fixed stride; the element size field is
        // not consulted
        (STREAM_NORMALS, _) => {
            let count = r.array_len(element_count, 12, COUNT_OVERRUN)?;
            StreamData::Normals(read_vec3s(&mut r, count)?)
        }
        (STREAM_UVS, _) => {
            let count = r.array_len(element_count, 8, COUNT_OVERRUN)?;
            let mut uvs = Vec::with_capacity(count);
            for _ in 0..count {
                uvs.push(r.read_vec2("eof reading uvs")?);
            }
            StreamData::Uvs(uvs)
        }
        (STREAM_COLORS | STREAM_COLORS2, 3) => {
            let count = r.array_len(element_count, 3, COUNT_OVERRUN)?;
            let mut colors = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = r.read_bytes(3, "eof reading colors")?;
                colors.push([raw[0], raw[1], raw[2]]);
            }
            StreamData::ColorsRgb(colors)
        }
        (STREAM_COLORS | STREAM_COLORS2, 4) => {
            let count = r.array_len(element_count, 4, COUNT_OVERRUN)?;
            let mut colors = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = r.read_bytes(4, "eof reading colors")?;
                colors.push([raw[0], raw[1], raw[2], raw[3]]);
            }
            StreamData::ColorsRgba(colors)
        }
        (STREAM_INDICES, 2) => {
            let count = r.array_len(element_count, 2, COUNT_OVERRUN)?;
            let mut indices = Vec::with_capacity(count);
            for _ in 0..count {
                indices.push(u32::from(r.read_u16("eof reading indices")?));
            }
            StreamData::Indices(indices)
        }
        (STREAM_INDICES, 4) => {
            let count = r.array_len(element_count, 4, COUNT_OVERRUN)?;
            let mut indices = Vec::with_capacity(count);
            for _ in 0..count {
                indices.push(r.read_u32("eof reading indices")?);
            }
            StreamData::Indices(indices)
        }
        (STREAM_TANGENTS, 16) => {
            let count = r.array_len(element_count, 16, COUNT_OVERRUN)?;
            let mut tangents = Vec::with_capacity(count);
            for _ in 0..count {
                tangents.push([read_tangent(&mut r)?, read_tangent(&mut r)?]);
            }
            StreamData::Tangents(tangents)
        }
        (STREAM_VERTS_UVS, 16) => {
            let count = r.array_len(element_count, 16, COUNT_OVERRUN)?;
            let mut vertices = Vec::with_capacity(count);
            let mut normals = Vec::with_capacity(count);
            let mut uvs = Vec::with_capacity(count);
            for _ in 0..count {
                vertices.push(read_dymek_vec3(&mut r)?);
                normals.push(read_dymek_vec3(&mut r)?);
                let u = dymek_half_to_f32(r.read_u16("eof reading verts-uvs")?);
                let v = dymek_half_to_f32(r.read_u16("eof reading verts-uvs")?);
                uvs.push(Vec2::new(u, v));
            }
            StreamData::VertsUvs {
                vertices,
                normals,
                uvs,
            }
        }
        (
            STREAM_SH_COEFFS | STREAM_SHAPE_DEFORMATION | STREAM_BONE_MAP | STREAM_FACE_MAP
            | STREAM_VERT_MATS,
            _,
        ) => {
            let len = element_count as usize * bytes_per_element as usize;
            StreamData::Raw(r.read_bytes(len, "eof reading raw stream")?.to_vec())
        }
        _ => {
            let anomaly = Anomaly::UnknownDataStream {
                id: descriptor.id,
                kind: stream_type,
                bytes_per_element,
            };
            warn!("{anomaly}");
            diagnostics.push(anomaly);
            StreamData::Empty
        }
    };

    Ok(DataStreamChunk {
        flags,
        stream_type,
        element_count,
        bytes_per_element,
        data,
    })
}

fn read_vec3s(r: &mut Reader<'_>, count: usize) -> Result<Vec<Vec3>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(r.read_vec3("eof reading vec3 stream")?);
    }
    Ok(values)
}

fn read_half_vec3(r: &mut Reader<'_>) -> Result<Vec3> {
    Ok(Vec3::new(
        cry_half_to_f32(r.read_u16("eof reading half vertex")?),
        cry_half_to_f32(r.read_u16("eof reading half vertex")?),
        cry_half_to_f32(r.read_u16("eof reading half vertex")?),
    ))
}

fn read_dymek_vec3(r: &mut Reader<'_>) -> Result<Vec3> {
    Ok(Vec3::new(
        dymek_half_to_f32(r.read_u16("eof reading verts-uvs")?),
        dymek_half_to_f32(r.read_u16("eof reading verts-uvs")?),
        dymek_half_to_f32(r.read_u16("eof reading verts-uvs")?),
    ))
}

fn read_tangent(r: &mut Reader<'_>) -> Result<Tangent> {
    Ok(Tangent {
        x: r.read_i16("eof reading tangents")?,
        y: r.read_i16("eof reading tangents")?,
        z: r.read_i16("eof reading tangents")?,
        w: r.read_i16("eof reading tangents")?,
    })
}
