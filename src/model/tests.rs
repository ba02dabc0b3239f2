use approx::assert_relative_eq;
use glam::{Mat3, Mat4, Quat, Vec3};

use crate::chunk::{Chunk, ChunkKind, StreamData};
use crate::{Anomaly, Model};

const NODE: u16 = 0x100B;
const MESH: u16 = 0x1000;
const MESH_SUBSETS: u16 = 0x1017;
const DATA_STREAM: u16 = 0x1016;
const MTL_NAME: u16 = 0x1014;

/// Builds a modern-layout file from chunk payloads.
struct FileBuilder {
    data: Vec<u8>,
    table: Vec<u8>,
    count: u32,
}

impl FileBuilder {
    fn new() -> Self {
        let mut data = b"CrChF   ".to_vec();
        data.extend_from_slice(&[0_u8; 8]); // count and table offset, patched later
        Self {
            data,
            table: Vec::new(),
            count: 0,
        }
    }

    fn add_chunk(&mut self, code: u16, version: u16, id: u32, payload: &[u8]) -> &mut Self {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(payload);
        self.table.extend_from_slice(&code.to_le_bytes());
        self.table.extend_from_slice(&version.to_le_bytes());
        self.table.extend_from_slice(&id.to_le_bytes());
        self.table.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.table.extend_from_slice(&offset.to_le_bytes());
        self.count += 1;
        self
    }

    fn finish(mut self) -> Vec<u8> {
        let table_offset = self.data.len() as u32;
        self.data[8..12].copy_from_slice(&self.count.to_le_bytes());
        self.data[12..16].copy_from_slice(&table_offset.to_le_bytes());
        self.data.extend_from_slice(&self.table);
        self.data
    }
}

/// Serializes a node payload with the given local rotation (column
/// convention) and translation, written in the on-disk row-major layout.
fn node_payload(
    name: &str,
    object_id: u32,
    parent_id: u32,
    rotation: Mat3,
    translation: Vec3,
) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut field = [0_u8; 64];
    field[..name.len()].copy_from_slice(name.as_bytes());
    buf.extend_from_slice(&field);
    for value in [object_id, parent_id, 0, 0, 0] {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    // disk rows are the columns of the glam matrix
    for col in 0..3 {
        for value in rotation.col(col).to_array() {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&0.0_f32.to_le_bytes());
    }
    for value in translation.to_array() {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf.extend_from_slice(&1.0_f32.to_le_bytes());
    // decomposed position (centimeters on disk), rotation w-first, scale
    for value in (translation / 100.0).to_array() {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    let q = Quat::from_mat3(&rotation);
    for value in [q.w, q.x, q.y, q.z] {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    for value in [1.0_f32, 1.0, 1.0] {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    for value in [0_u32; 3] {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

fn simple_node(name: &str, parent_id: u32) -> Vec<u8> {
    node_payload(name, 0, parent_id, Mat3::IDENTITY, Vec3::ZERO)
}

#[test]
fn registry_is_keyed_by_descriptor_id() {
    let mut builder = FileBuilder::new();
    builder
        .add_chunk(NODE, 0x823, 5, &simple_node("root", crate::chunk::PARENT_NONE))
        .add_chunk(NODE, 0x823, 9, &simple_node("leaf", 5));
    let model = Model::decode(&builder.finish()).unwrap();

    for descriptor in model.descriptors() {
        let chunk = model.chunk_by_id(descriptor.id).unwrap();
        assert_eq!(chunk.kind(), descriptor.kind);
    }
    assert_eq!(model.root_node_id(), Some(5));
    assert_eq!(model.root_node().unwrap().name, "root");
    assert_eq!(model.graph().children_of(5), [9]);
    assert!(model.diagnostics().is_empty());
}

#[test]
fn duplicate_chunk_id_keeps_the_first_chunk() {
    let mut material = vec![0_u8; 8];
    material.extend_from_slice(&[0_u8; 128]);
    material.extend_from_slice(&[0_u8; 8]);
    material.extend_from_slice(&[0_u8; 66 * 4]);

    let mut builder = FileBuilder::new();
    builder
        .add_chunk(NODE, 0x823, 1, &simple_node("node", crate::chunk::PARENT_NONE))
        .add_chunk(MTL_NAME, 0x800, 1, &material);
    let model = Model::decode(&builder.finish()).unwrap();

    assert!(matches!(model.chunk_by_id(1), Some(Chunk::Node(_))));
    assert_eq!(
        model.diagnostics(),
        [Anomaly::DuplicateChunkId {
            id: 1,
            kept: ChunkKind::Node,
            dropped: ChunkKind::MtlName,
        }]
    );
}

#[test]
fn dangling_parent_is_reattached_to_the_root() {
    let mut builder = FileBuilder::new();
    builder
        .add_chunk(NODE, 0x823, 1, &simple_node("root", crate::chunk::PARENT_NONE))
        .add_chunk(NODE, 0x823, 2, &simple_node("orphan", 99));
    let model = Model::decode(&builder.finish()).unwrap();

    assert_eq!(model.graph().parent_of(2), Some(1));
    assert_eq!(
        model.diagnostics(),
        [Anomaly::DanglingParentRef {
            id: 2,
            name: "orphan".into(),
            parent_id: 99,
        }]
    );
}

#[test]
fn a_second_root_declaration_is_flagged() {
    let mut builder = FileBuilder::new();
    builder
        .add_chunk(NODE, 0x823, 1, &simple_node("a", crate::chunk::PARENT_NONE))
        .add_chunk(NODE, 0x823, 2, &simple_node("b", crate::chunk::PARENT_NONE));
    let model = Model::decode(&builder.finish()).unwrap();

    assert_eq!(model.root_node_id(), Some(1));
    assert_eq!(
        model.diagnostics(),
        [Anomaly::RootNodeAmbiguous { id: 2, root_id: 1 }]
    );
}

#[test]
fn world_transform_matches_matrix_oracle() {
    // parent rotations are identity, so plain translation summing agrees
    // with full matrix composition and the oracle is exact
    let ta = Vec3::new(1.0, 2.0, 3.0);
    let tb = Vec3::new(-4.0, 0.5, 0.0);
    let tc = Vec3::new(0.0, 10.0, -2.0);
    let leaf_rotation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);

    let mut builder = FileBuilder::new();
    builder
        .add_chunk(
            NODE,
            0x823,
            1,
            &node_payload("root", 0, crate::chunk::PARENT_NONE, Mat3::IDENTITY, ta),
        )
        .add_chunk(NODE, 0x823, 2, &node_payload("mid", 0, 1, Mat3::IDENTITY, tb))
        .add_chunk(NODE, 0x823, 3, &node_payload("leaf", 0, 2, leaf_rotation, tc));
    let model = Model::decode(&builder.finish()).unwrap();

    let oracle = Mat4::from_translation(ta)
        * Mat4::from_translation(tb)
        * Mat4::from_rotation_translation(Quat::from_mat3(&leaf_rotation), tc);

    let world = model.graph().world_transform(3).unwrap();
    for col in 0..4 {
        for (ours, reference) in world
            .col(col)
            .to_array()
            .iter()
            .zip(oracle.col(col).to_array())
        {
            assert_relative_eq!(*ours, reference, epsilon = 1e-5);
        }
    }

    let translation = model.graph().world_translation(3).unwrap();
    assert_relative_eq!(translation.x, ta.x + tb.x + tc.x);
    assert_relative_eq!(translation.y, ta.y + tb.y + tc.y);
    assert_relative_eq!(translation.z, ta.z + tb.z + tc.z);

    // a local point is rotated first, then offset
    let placed = model.graph().transform_point(3, Vec3::X).unwrap();
    let expected = leaf_rotation * Vec3::X + translation;
    assert_relative_eq!(placed.x, expected.x, epsilon = 1e-5);
    assert_relative_eq!(placed.y, expected.y, epsilon = 1e-5);
    assert_relative_eq!(placed.z, expected.z, epsilon = 1e-5);
}

#[test]
fn parent_rotation_does_not_feed_into_child_translation() {
    let spin = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let tp = Vec3::new(1.0, 0.0, 0.0);
    let tc = Vec3::new(0.0, 2.0, 0.0);

    let mut builder = FileBuilder::new();
    builder
        .add_chunk(
            NODE,
            0x823,
            1,
            &node_payload("base", 0, crate::chunk::PARENT_NONE, spin, tp),
        )
        .add_chunk(NODE, 0x823, 2, &node_payload("arm", 0, 1, Mat3::IDENTITY, tc));
    let model = Model::decode(&builder.finish()).unwrap();

    // offsets add as plain vectors: the parent's rotation bends the
    // child's orientation but never its position
    let translation = model.graph().world_translation(2).unwrap();
    assert_relative_eq!(translation.x, tp.x + tc.x);
    assert_relative_eq!(translation.y, tp.y + tc.y);
    assert_relative_eq!(translation.z, tp.z + tc.z);

    let rotation = model.graph().world_rotation(2).unwrap();
    for (ours, reference) in rotation
        .to_cols_array()
        .iter()
        .zip(spin.to_cols_array())
    {
        assert_relative_eq!(*ours, reference, epsilon = 1e-6);
    }

    // local X rotates into Y before the summed offset is applied
    let placed = model.graph().transform_point(2, Vec3::X).unwrap();
    assert_relative_eq!(placed.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(placed.y, 3.0, epsilon = 1e-6);
    assert_relative_eq!(placed.z, 0.0, epsilon = 1e-6);
}

#[test]
fn overstated_subset_count_degrades_to_a_diagnostic() {
    let mut subsets = Vec::new();
    for value in [0_u32, u32::MAX, 0, 0] {
        subsets.extend_from_slice(&value.to_le_bytes());
    }

    let mut builder = FileBuilder::new();
    builder
        .add_chunk(MESH_SUBSETS, 0x800, 0x1D, &subsets)
        .add_chunk(NODE, 0x823, 1, &simple_node("ok", crate::chunk::PARENT_NONE));
    let model = Model::decode(&builder.finish()).unwrap();

    assert!(matches!(model.chunk_by_id(0x1D), Some(Chunk::Unknown(_))));
    assert!(matches!(model.chunk_by_id(1), Some(Chunk::Node(_))));
    assert!(matches!(
        model.diagnostics(),
        [Anomaly::ChunkDecodeFailed { id: 0x1D, .. }]
    ));
}

#[test]
fn failed_chunk_degrades_without_stopping_the_decode() {
    let mut builder = FileBuilder::new();
    builder
        .add_chunk(MESH, 0x623, 4, &[0_u8; 64]) // unsupported mesh version
        .add_chunk(NODE, 0x823, 5, &simple_node("ok", crate::chunk::PARENT_NONE));
    let model = Model::decode(&builder.finish()).unwrap();

    assert!(matches!(model.chunk_by_id(4), Some(Chunk::Unknown(_))));
    assert!(matches!(model.chunk_by_id(5), Some(Chunk::Node(_))));
    assert!(matches!(
        model.diagnostics(),
        [Anomaly::ChunkDecodeFailed { id: 4, .. }]
    ));
}

#[test]
fn mesh_resolves_its_subsets_and_streams_by_id() {
    let mut mesh = Vec::new();
    for value in [0_u32, 0, 3, 3, 0, 0x1D, 0] {
        mesh.extend_from_slice(&value.to_le_bytes());
    }
    for value in [0x21_u32, 0, 0, 0, 0, 0x22, 0, 0, 0, 0, 0, 0] {
        mesh.extend_from_slice(&value.to_le_bytes());
    }
    mesh.extend_from_slice(&[0_u8; 32]);
    mesh.extend_from_slice(&[0_u8; 24]); // bounds

    let mut subsets = Vec::new();
    for value in [0_u32, 1, 0, 0] {
        subsets.extend_from_slice(&value.to_le_bytes());
    }
    for value in [0_u32, 3, 0, 3, 0] {
        subsets.extend_from_slice(&value.to_le_bytes());
    }
    subsets.extend_from_slice(&[0_u8; 16]);

    let mut vertices = Vec::new();
    for value in [0_u32, 0, 3] {
        vertices.extend_from_slice(&value.to_le_bytes());
    }
    vertices.extend_from_slice(&12_u16.to_le_bytes());
    vertices.extend_from_slice(&[0_u8; 10]);
    for value in [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        vertices.extend_from_slice(&value.to_le_bytes());
    }

    let mut builder = FileBuilder::new();
    builder
        .add_chunk(MESH, 0x800, 0x20, &mesh)
        .add_chunk(MESH_SUBSETS, 0x800, 0x1D, &subsets)
        .add_chunk(DATA_STREAM, 0x800, 0x21, &vertices);
    let model = Model::decode(&builder.finish()).unwrap();

    let Some(Chunk::Mesh(mesh)) = model.chunk_by_id(0x20) else {
        panic!("mesh chunk missing");
    };
    let subsets = model.mesh_subsets_of(mesh).unwrap();
    assert_eq!(subsets.subsets.len(), 1);
    assert_eq!(subsets.subsets[0].index_count, 3);

    let stream = model.data_stream(mesh.vertices_id).unwrap();
    let StreamData::Vertices(verts) = &stream.data else {
        panic!("expected vertices, got {:?}", stream.data);
    };
    assert_eq!(verts.len(), 3);
    assert_eq!(verts[1], Vec3::X);
    assert!(model.diagnostics().is_empty());
}
