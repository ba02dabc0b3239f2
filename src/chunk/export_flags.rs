//! Export flags chunk: which tool produced the file.
//!
//! Like the timing chunk, this payload always embeds its own table entry,
//! modern dialect included.

use crate::binary_utils::Reader;
use crate::Result;

use super::ChunkDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFlagsChunk {
    pub flags: u32,
    pub rc_version: [u32; 4],
    pub rc_version_string: String,
}

pub(crate) fn decode(bytes: &[u8], descriptor: &ChunkDescriptor) -> Result<ExportFlagsChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    r.skip(16, "eof reading export flags preamble")?;

    let flags = r.read_u32("eof reading export flags")?;
    let mut rc_version = [0_u32; 4];
    for part in &mut rc_version {
        *part = r.read_u32("eof reading resource compiler version")?;
    }
    let rc_version_string = r.read_name(16, "eof reading resource compiler version string")?;
    // 32 reserved words close out the chunk
    r.skip(128, "eof reading export flags reserved words")?;

    Ok(ExportFlagsChunk {
        flags,
        rc_version,
        rc_version_string,
    })
}

#[cfg(test)]
mod tests {
    use super::super::ChunkKind;
    use super::*;

    #[test]
    fn reads_compiler_version() {
        let mut buf = vec![0_u8; 16]; // embedded entry
        buf.extend_from_slice(&1_u32.to_le_bytes());
        for value in [3_u32, 4, 0, 5178] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        let mut version = [0_u8; 16];
        version[..9].copy_from_slice(b"3.4.0.  s");
        buf.extend_from_slice(&version);
        buf.extend_from_slice(&[0_u8; 128]);

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::ExportFlags,
            version: 1,
            offset: 0,
            id: 0x70,
            size: buf.len() as u32,
        };
        let chunk = decode(&buf, &descriptor).unwrap();

        assert_eq!(chunk.flags, 1);
        assert_eq!(chunk.rc_version, [3, 4, 0, 5178]);
        assert_eq!(chunk.rc_version_string, "3.4.0.  s");
    }
}
