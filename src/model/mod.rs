//! The decoded container: chunk registry, scene graph and diagnostics.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use glam::{Mat3, Mat4, Vec3};
use tracing::{debug, warn};

use crate::chunk::{
    self, BonesChunk, Chunk, ChunkDescriptor, ChunkKind, DataStreamChunk, MeshChunk,
    MeshSubsetsChunk, NodeChunk, UnknownChunk, PARENT_NONE,
};
use crate::header::{ChunkTable, Dialect, Header};
use crate::{Anomaly, Error, Result};

/// A fully decoded cgf/cga file (or a merged pair of them).
///
/// Immutable after decode, except for [`Model::append`] which merges a
/// companion file into the same registry.
#[derive(Debug, Clone)]
pub struct Model {
    header: Header,
    descriptors: Vec<ChunkDescriptor>,
    chunks: BTreeMap<u32, Chunk>,
    root_node_id: Option<u32>,
    diagnostics: Vec<Anomaly>,
    /// How many trailing diagnostics the last resolution pass produced;
    /// they are replaced wholesale when the graph is resolved again.
    resolution_diagnostics: usize,
    graph: NodeGraph,
}

impl Model {
    /// Decodes a complete file buffer.
    ///
    /// Malformed individual chunks degrade to [`Chunk::Unknown`]
    /// placeholders and are reported through [`Model::diagnostics`].
    ///
    /// # Errors
    ///
    /// Fatal damage only: unrecognized signature, truncated chunk table, a
    /// bone tree walking out of its chunk.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut model = Self {
            header: Header::decode(bytes)?,
            descriptors: Vec::new(),
            chunks: BTreeMap::new(),
            root_node_id: None,
            diagnostics: Vec::new(),
            resolution_diagnostics: 0,
            graph: NodeGraph::default(),
        };
        let header = model.header.clone();
        model.ingest(bytes, &header)?;
        model.resolve_graph();
        Ok(model)
    }

    /// Merges a companion file (a `.cgam` geometry file next to its `.cga`)
    /// into this model.
    ///
    /// Chunk ids collide under the same keep-first policy as within one
    /// file, and the root node is never replaced.
    ///
    /// # Errors
    ///
    /// Same fatal conditions as [`Model::decode`], for the new buffer.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let header = Header::decode(bytes)?;
        // the graph is re-resolved from scratch, so the previous pass's
        // diagnostics go with it
        self.diagnostics
            .truncate(self.diagnostics.len() - self.resolution_diagnostics);
        self.resolution_diagnostics = 0;
        self.ingest(bytes, &header)?;
        self.resolve_graph();
        Ok(())
    }

    fn resolve_graph(&mut self) {
        let before = self.diagnostics.len();
        self.graph = NodeGraph::resolve(&self.chunks, self.root_node_id, &mut self.diagnostics);
        self.resolution_diagnostics = self.diagnostics.len() - before;
    }

    fn ingest(&mut self, bytes: &[u8], header: &Header) -> Result<()> {
        let dialect = header.dialect();
        let table = ChunkTable::decode(bytes, header, &mut self.diagnostics)?;
        debug!(count = table.descriptors.len(), ?dialect, "chunk table decoded");

        for descriptor in table.descriptors {
            self.descriptors.push(descriptor);

            if let Some(existing) = self.chunks.get(&descriptor.id) {
                let anomaly = Anomaly::DuplicateChunkId {
                    id: descriptor.id,
                    kept: existing.kind(),
                    dropped: descriptor.kind,
                };
                warn!("{anomaly}");
                self.diagnostics.push(anomaly);
                continue;
            }

            let decoded = match chunk::decode(bytes, dialect, &descriptor, &mut self.diagnostics)
            {
                Ok(decoded) => decoded,
                Err(error @ Error::BoneTreeOverrun { .. }) => return Err(error),
                Err(error) => {
                    let anomaly = Anomaly::ChunkDecodeFailed {
                        id: descriptor.id,
                        kind: descriptor.kind,
                        error: error.to_string(),
                    };
                    warn!("{anomaly}");
                    self.diagnostics.push(anomaly);
                    Chunk::Unknown(UnknownChunk {
                        kind: descriptor.kind,
                        version: descriptor.version,
                        id: descriptor.id,
                        size: descriptor.size,
                    })
                }
            };

            if let Chunk::Node(node) = &decoded {
                match self.root_node_id {
                    // first node chunk becomes the tentative root
                    None => self.root_node_id = Some(descriptor.id),
                    Some(root_id) if node.is_root() && root_id != descriptor.id => {
                        let anomaly = Anomaly::RootNodeAmbiguous {
                            id: descriptor.id,
                            root_id,
                        };
                        warn!("{anomaly}");
                        self.diagnostics.push(anomaly);
                    }
                    Some(_) => {}
                }
            }

            self.chunks.insert(descriptor.id, decoded);
        }

        Ok(())
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.header.dialect()
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Chunk table entries in file order, duplicates included.
    #[must_use]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.descriptors
    }

    /// Everything recoverable that went wrong during decode.
    #[must_use]
    pub fn diagnostics(&self) -> &[Anomaly] {
        &self.diagnostics
    }

    #[must_use]
    pub fn chunk_by_id(&self, id: u32) -> Option<&Chunk> {
        self.chunks.get(&id)
    }

    pub fn chunks_of_kind(&self, kind: ChunkKind) -> impl Iterator<Item = (u32, &Chunk)> {
        self.chunks
            .iter()
            .filter(move |(_, chunk)| chunk.kind() == kind)
            .map(|(&id, chunk)| (id, chunk))
    }

    #[must_use]
    pub fn node(&self, id: u32) -> Option<&NodeChunk> {
        match self.chunks.get(&id) {
            Some(Chunk::Node(node)) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn root_node_id(&self) -> Option<u32> {
        self.root_node_id
    }

    #[must_use]
    pub fn root_node(&self) -> Option<&NodeChunk> {
        self.node(self.root_node_id?)
    }

    /// The resolved scene graph over all node chunks.
    #[must_use]
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// The first compiled skeleton in the file, if any.
    #[must_use]
    pub fn bones(&self) -> Option<&BonesChunk> {
        self.chunks.values().find_map(|chunk| match chunk {
            Chunk::CompiledBones(bones) => Some(bones),
            _ => None,
        })
    }

    /// Resolves a mesh's subset table by the id stored in the mesh chunk.
    #[must_use]
    pub fn mesh_subsets_of(&self, mesh: &MeshChunk) -> Option<&MeshSubsetsChunk> {
        match self.chunks.get(&mesh.subsets_id) {
            Some(Chunk::MeshSubsets(subsets)) => Some(subsets),
            _ => None,
        }
    }

    /// Resolves a datastream by id, as stored in a mesh chunk's stream id
    /// fields.
    #[must_use]
    pub fn data_stream(&self, id: u32) -> Option<&DataStreamChunk> {
        match self.chunks.get(&id) {
            Some(Chunk::DataStream(stream)) => Some(stream),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedNode {
    parent: Option<u32>,
    children: Vec<u32>,
    world_rotation: Mat3,
    world_translation: Vec3,
}

/// Parent links, child lists and accumulated world transforms for every
/// node chunk, resolved once after the registry is complete.
///
/// World rotation is the product of the local rotations up the parent
/// chain; world translation is the plain sum of the local translations up
/// the chain (scale and rotation deliberately do not feed into a child's
/// translation, matching how the exporter composed these files).
/// Translations stay in the transform's native units.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: BTreeMap<u32, ResolvedNode>,
}

impl NodeGraph {
    fn resolve(
        chunks: &BTreeMap<u32, Chunk>,
        root_node_id: Option<u32>,
        diagnostics: &mut Vec<Anomaly>,
    ) -> Self {
        let nodes: BTreeMap<u32, &NodeChunk> = chunks
            .iter()
            .filter_map(|(&id, chunk)| match chunk {
                Chunk::Node(node) => Some((id, node)),
                _ => None,
            })
            .collect();

        // parent links first: sentinel means root, a dangling reference is
        // reattached under the root
        let mut parents: BTreeMap<u32, Option<u32>> = BTreeMap::new();
        for (&id, node) in &nodes {
            let parent = if node.parent_id == PARENT_NONE {
                None
            } else if nodes.contains_key(&node.parent_id) {
                Some(node.parent_id)
            } else {
                let anomaly = Anomaly::DanglingParentRef {
                    id,
                    name: node.name.clone(),
                    parent_id: node.parent_id,
                };
                warn!("{anomaly}");
                diagnostics.push(anomaly);
                root_node_id.filter(|&root_id| root_id != id)
            };
            parents.insert(id, parent);
        }

        let mut resolved: BTreeMap<u32, ResolvedNode> = BTreeMap::new();
        for &id in nodes.keys() {
            Self::resolve_world(id, &nodes, &parents, &mut resolved, nodes.len());
        }
        for (&id, &parent) in &parents {
            if let Some(parent) = parent {
                if let Some(entry) = resolved.get_mut(&parent) {
                    entry.children.push(id);
                }
            }
        }

        Self { nodes: resolved }
    }

    fn resolve_world(
        id: u32,
        nodes: &BTreeMap<u32, &NodeChunk>,
        parents: &BTreeMap<u32, Option<u32>>,
        resolved: &mut BTreeMap<u32, ResolvedNode>,
        depth_budget: usize,
    ) {
        if resolved.contains_key(&id) {
            return;
        }

        let node = nodes[&id];
        let local_rotation = Mat3::from_mat4(node.transform);
        let local_translation = node.transform.w_axis.truncate();

        // depth budget breaks parent cycles in corrupt files
        let (world_rotation, world_translation) = match parents[&id] {
            Some(parent) if depth_budget > 0 => {
                Self::resolve_world(parent, nodes, parents, resolved, depth_budget - 1);
                let parent = &resolved[&parent];
                (
                    parent.world_rotation * local_rotation,
                    parent.world_translation + local_translation,
                )
            }
            _ => (local_rotation, local_translation),
        };

        resolved.insert(
            id,
            ResolvedNode {
                parent: parents[&id],
                children: Vec::new(),
                world_rotation,
                world_translation,
            },
        );
    }

    /// Resolved parent of a node (`None` for roots and unknown ids).
    #[must_use]
    pub fn parent_of(&self, id: u32) -> Option<u32> {
        self.nodes.get(&id)?.parent
    }

    /// Child node ids in ascending id order.
    #[must_use]
    pub fn children_of(&self, id: u32) -> &[u32] {
        self.nodes
            .get(&id)
            .map_or(&[], |node| node.children.as_slice())
    }

    #[must_use]
    pub fn world_rotation(&self, id: u32) -> Option<Mat3> {
        Some(self.nodes.get(&id)?.world_rotation)
    }

    #[must_use]
    pub fn world_translation(&self, id: u32) -> Option<Vec3> {
        Some(self.nodes.get(&id)?.world_translation)
    }

    /// Places a point local to the given node into world space: rotate by
    /// the accumulated rotation, then add the accumulated translation.
    #[must_use]
    pub fn transform_point(&self, id: u32, point: Vec3) -> Option<Vec3> {
        let node = self.nodes.get(&id)?;
        Some(node.world_rotation * point + node.world_translation)
    }

    /// The accumulated transform as a single matrix.
    #[must_use]
    pub fn world_transform(&self, id: u32) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let mut transform = Mat4::from_mat3(node.world_rotation);
        transform.w_axis = node.world_translation.extend(1.0);
        Some(transform)
    }
}
