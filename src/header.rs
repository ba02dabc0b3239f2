use byteorder::LE;
use tracing::{debug, warn};
use zerocopy::{
    byteorder::{U16, U32},
    FromBytes, Unaligned,
};

use crate::binary_utils::{parse_slice, Reader};
use crate::chunk::{ChunkDescriptor, ChunkKind};
use crate::{Anomaly, Error, Result};

/// Which of the two incompatible on-disk layouts a file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `CryTek` signature, engine 3.4 and earlier. 32-bit chunk kinds, the
    /// chunk count lives in the chunk table, and chunk payloads repeat their
    /// own table entry on disk.
    Legacy,
    /// `CrChF` signature, engine 3.6 and newer. 16-bit chunk kind codes and
    /// the chunk count lives in the file header.
    Modern,
}

/// Legacy-header file type tag (geometry vs. animation data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Geometry,
    Animation,
    Unknown(u32),
}

impl FileKind {
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0xFFFF_0000 => Self::Geometry,
            0xFFFF_0001 => Self::Animation,
            other => Self::Unknown(other),
        }
    }
}

/// The decoded file header. The variant doubles as the dialect tag for the
/// rest of the decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Legacy {
        file_kind: FileKind,
        table_version: u32,
        table_offset: i32,
    },
    Modern {
        chunk_count: u32,
        table_offset: i32,
    },
}

impl Header {
    /// Reads the 8-byte ASCII signature and the dialect-specific header
    /// fields behind it.
    ///
    /// A signature containing `crytek` (case-insensitive) selects the legacy
    /// layout; any other readable ASCII tag selects the modern layout. Note
    /// that nothing else validates the choice: a legacy-looking tag on a
    /// modern file is only caught later, when the chunk table fails to
    /// decode.
    ///
    /// # Errors
    ///
    /// `Error::UnrecognizedSignature` if the buffer is shorter than 8 bytes
    /// or the signature is not ASCII text; `Error::Corrupted` if the header
    /// fields behind the signature are truncated.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let signature = bytes.get(..8).ok_or_else(|| Error::UnrecognizedSignature {
            signature: String::from_utf8_lossy(bytes).into_owned(),
        })?;

        let tag = match std::str::from_utf8(signature) {
            Ok(tag) if tag.is_ascii() => tag,
            _ => {
                return Err(Error::UnrecognizedSignature {
                    signature: String::from_utf8_lossy(signature).into_owned(),
                })
            }
        };

        let mut r = Reader::at(bytes, 8);
        if tag.to_ascii_lowercase().contains("crytek") {
            let header = Self::Legacy {
                file_kind: FileKind::from_raw(r.read_u32("eof reading file type")?),
                table_version: r.read_u32("eof reading chunk table version")?,
                table_offset: r.read_i32("eof reading chunk table offset")?,
            };
            debug!(signature = tag, "legacy cgf header");
            Ok(header)
        } else {
            let header = Self::Modern {
                chunk_count: r.read_u32("eof reading chunk count")?,
                table_offset: r.read_i32("eof reading chunk table offset")?,
            };
            debug!(signature = tag, "modern cgf header");
            Ok(header)
        }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Legacy { .. } => Dialect::Legacy,
            Self::Modern { .. } => Dialect::Modern,
        }
    }

    #[must_use]
    pub fn table_offset(&self) -> i32 {
        match *self {
            Self::Legacy { table_offset, .. } | Self::Modern { table_offset, .. } => table_offset,
        }
    }
}

/// Timing chunks carry no id of their own on disk; the table decoder tags
/// their table-order id with this constant to keep them out of the real id
/// space.
pub const TIMING_ID_TAG: u32 = 0xFFFF_0000;

/// Raw modern-space code for Timing, also honored when it leaks into a
/// legacy table.
const MODERN_TIMING_CODE: u32 = 0x100E;

#[derive(Debug, PartialEq, FromBytes, Unaligned)]
#[repr(C)]
struct LegacyEntry {
    kind: U32<LE>,
    version: U32<LE>,
    offset: U32<LE>,
    id: U32<LE>,
    size: U32<LE>,
}

#[derive(Debug, PartialEq, FromBytes, Unaligned)]
#[repr(C)]
struct ModernEntry {
    kind: U16<LE>,
    version: U16<LE>,
    id: U32<LE>,
    size: U32<LE>,
    offset: U32<LE>,
}

/// The decoded flat chunk index of a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkTable {
    pub descriptors: Vec<ChunkDescriptor>,
}

impl ChunkTable {
    /// Decodes the chunk descriptor array at the header's table offset.
    ///
    /// Modern entries with an unmapped kind code are skipped with an
    /// [`Anomaly::UnknownChunkKind`]; legacy entries pass unknown kinds
    /// through as [`ChunkKind::Unknown`].
    ///
    /// # Errors
    ///
    /// `Error::TruncatedTable` if the buffer ends before the declared entry
    /// count; `Error::Corrupted` on a negative table offset.
    pub fn decode(bytes: &[u8], header: &Header, diagnostics: &mut Vec<Anomaly>) -> Result<Self> {
        let offset: usize = header.table_offset().try_into().map_err(|_| Error::Corrupted {
            error: "chunk table offset is negative",
        })?;

        match *header {
            Header::Legacy { .. } => Self::decode_legacy(bytes, offset),
            Header::Modern { chunk_count, .. } => {
                Self::decode_modern(bytes, offset, chunk_count, diagnostics)
            }
        }
    }

    fn decode_legacy(bytes: &[u8], offset: usize) -> Result<Self> {
        // the legacy table repeats the chunk count in front of the entries
        let mut r = Reader::at(bytes, offset);
        let count = r.read_u32("eof reading chunk count").map_err(|_| {
            Error::TruncatedTable {
                expected: 0,
                read: 0,
            }
        })?;

        let entries: &[LegacyEntry] = parse_slice(bytes, r.position(), count as usize)
            .ok_or_else(|| Error::TruncatedTable {
                expected: count,
                read: available_entries::<LegacyEntry>(bytes, r.position()),
            })?;

        let descriptors = entries
            .iter()
            .map(|entry| {
                let raw_kind = entry.kind.get();
                let kind = ChunkKind::from_legacy(raw_kind);
                let mut id = entry.id.get();
                // Timing chunks have no native id; keep them out of the way
                if kind == ChunkKind::Timing || raw_kind == MODERN_TIMING_CODE {
                    id = id.wrapping_add(TIMING_ID_TAG);
                }
                ChunkDescriptor {
                    kind,
                    version: entry.version.get(),
                    offset: entry.offset.get(),
                    id,
                    size: entry.size.get(),
                }
            })
            .collect();

        Ok(Self { descriptors })
    }

    fn decode_modern(
        bytes: &[u8],
        offset: usize,
        count: u32,
        diagnostics: &mut Vec<Anomaly>,
    ) -> Result<Self> {
        let entries: &[ModernEntry] =
            parse_slice(bytes, offset, count as usize).ok_or_else(|| Error::TruncatedTable {
                expected: count,
                read: available_entries::<ModernEntry>(bytes, offset),
            })?;

        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in entries {
            let code = entry.kind.get();
            let Some(kind) = ChunkKind::from_modern(code) else {
                let anomaly = Anomaly::UnknownChunkKind {
                    code: u32::from(code),
                };
                warn!("{anomaly}");
                diagnostics.push(anomaly);
                continue;
            };
            descriptors.push(ChunkDescriptor {
                kind,
                version: u32::from(entry.version.get()),
                offset: entry.offset.get(),
                id: entry.id.get(),
                size: entry.size.get(),
            });
        }

        Ok(Self { descriptors })
    }
}

fn available_entries<T>(bytes: &[u8], offset: usize) -> u32 {
    (bytes.len().saturating_sub(offset) / std::mem::size_of::<T>()) as u32
}
