//! Source info chunk: the original scene file, export date and author.
//! The only chunk with no header at all, just three NUL-terminated strings.

use crate::binary_utils::Reader;
use crate::Result;

use super::ChunkDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfoChunk {
    pub source_file: String,
    pub date: String,
    pub author: String,
}

pub(crate) fn decode(bytes: &[u8], descriptor: &ChunkDescriptor) -> Result<SourceInfoChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);

    Ok(SourceInfoChunk {
        source_file: r.read_cstr("eof reading source file name")?,
        date: r.read_cstr("eof reading source date")?,
        author: r.read_cstr("eof reading source author")?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;

    #[test]
    fn three_consecutive_strings() {
        let buf = b"scenes/barrel.max\0Mon Jan 05 2004\0exporter\0";
        let descriptor = ChunkDescriptor {
            kind: ChunkKind::SourceInfo,
            version: 0,
            offset: 0,
            id: 0x80,
            size: buf.len() as u32,
        };
        let chunk = decode(buf, &descriptor).unwrap();

        assert_eq!(chunk.source_file, "scenes/barrel.max");
        assert_eq!(chunk.date, "Mon Jan 05 2004");
        assert_eq!(chunk.author, "exporter");
    }
}
