//! Scene property chunks: a flat list of name/value string pairs written by
//! the exporter.

use itertools::Itertools;

use crate::binary_utils::Reader;
use crate::header::Dialect;
use crate::Result;

use super::{skip_embedded_header, ChunkDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneProp {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenePropsChunk {
    pub props: Vec<SceneProp>,
}

impl ScenePropsChunk {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|prop| prop.name == name)
            .map(|prop| prop.value.as_str())
    }
}

pub(crate) fn decode(
    bytes: &[u8],
    dialect: Dialect,
    descriptor: &ChunkDescriptor,
) -> Result<ScenePropsChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    skip_embedded_header(&mut r, dialect)?;

    let count = r.read_u32("eof reading scene prop count")?;
    let count = r.array_len(count, 96, "scene prop count exceeds the chunk")?;
    let props = (0..count)
        .map(|_| {
            Ok(SceneProp {
                name: r.read_name(32, "eof reading scene prop name")?,
                value: r.read_name(64, "eof reading scene prop value")?,
            })
        })
        .try_collect()?;

    Ok(ScenePropsChunk { props })
}
