//! Timing chunk: tick rate and the global animation range.
//!
//! This payload keeps its 8-byte kind/version preamble in both dialects, so
//! the decoder skips it unconditionally instead of going through the usual
//! legacy-only embedded header.

use crate::binary_utils::Reader;
use crate::Result;

use super::ChunkDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub struct TimingChunk {
    pub secs_per_tick: f32,
    pub ticks_per_frame: i32,
    pub global_range_name: String,
    pub global_range_start: i32,
    pub global_range_end: i32,
}

pub(crate) fn decode(bytes: &[u8], descriptor: &ChunkDescriptor) -> Result<TimingChunk> {
    let mut r = Reader::at(bytes, descriptor.offset as usize);
    r.skip(8, "eof reading timing preamble")?;

    let secs_per_tick = r.read_f32("eof reading timing tick rate")?;
    let ticks_per_frame = r.read_i32("eof reading timing frame rate")?;
    r.skip(8, "eof reading timing reserved words")?;
    let global_range_name = r.read_name(32, "eof reading timing range name")?;
    let global_range_start = r.read_i32("eof reading timing range")?;
    let global_range_end = r.read_i32("eof reading timing range")?;

    Ok(TimingChunk {
        secs_per_tick,
        ticks_per_frame,
        global_range_name,
        global_range_start,
        global_range_end,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::super::ChunkKind;
    use super::*;

    #[test]
    fn preamble_is_skipped_in_both_dialects() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0xCCCC_000E_u32.to_le_bytes());
        buf.extend_from_slice(&0x918_u32.to_le_bytes());
        buf.extend_from_slice(&(1.0_f32 / 4800.0).to_le_bytes());
        buf.extend_from_slice(&160_i32.to_le_bytes());
        buf.extend_from_slice(&[0_u8; 8]);
        let mut name = [0_u8; 32];
        name[..7].copy_from_slice(b"GlobalR");
        buf.extend_from_slice(&name);
        buf.extend_from_slice(&0_i32.to_le_bytes());
        buf.extend_from_slice(&100_i32.to_le_bytes());

        let descriptor = ChunkDescriptor {
            kind: ChunkKind::Timing,
            version: 0x918,
            offset: 0,
            id: 0xFFFF_0001,
            size: buf.len() as u32,
        };
        let chunk = decode(&buf, &descriptor).unwrap();

        assert_relative_eq!(chunk.secs_per_tick, 1.0 / 4800.0);
        assert_eq!(chunk.ticks_per_frame, 160);
        assert_eq!(chunk.global_range_name, "GlobalR");
        assert_eq!(chunk.global_range_end, 100);
    }
}
