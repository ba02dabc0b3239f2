use byteorder::{ByteOrder, LittleEndian};
use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use zerocopy::{FromBytes, LayoutVerified, Unaligned};

use crate::{Error, Result};

/// Little-endian cursor over an immutable byte buffer.
///
/// Every chunk decoder gets its own `Reader`, so payloads can be decoded
/// independently of each other; the buffer itself is never mutated.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        let taken = self
            .bytes
            .get(self.pos..)
            .and_then(|rest| rest.get(..len))
            .ok_or(Error::Corrupted { error: what })?;
        self.pos += len;
        Ok(taken)
    }

    pub fn skip(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.take(len, what).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        self.take(len, what)
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        self.take(1, what).map(|b| b[0])
    }

    pub fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        self.take(2, what).map(LittleEndian::read_u16)
    }

    pub fn read_i16(&mut self, what: &'static str) -> Result<i16> {
        self.take(2, what).map(LittleEndian::read_i16)
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        self.take(4, what).map(LittleEndian::read_u32)
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32> {
        self.take(4, what).map(LittleEndian::read_i32)
    }

    pub fn read_f32(&mut self, what: &'static str) -> Result<f32> {
        self.take(4, what).map(LittleEndian::read_f32)
    }

    pub fn read_vec2(&mut self, what: &'static str) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32(what)?, self.read_f32(what)?))
    }

    pub fn read_vec3(&mut self, what: &'static str) -> Result<Vec3> {
        Ok(Vec3::new(
            self.read_f32(what)?,
            self.read_f32(what)?,
            self.read_f32(what)?,
        ))
    }

    /// Reads a quaternion stored on disk in W, X, Y, Z order.
    pub fn read_quat_wxyz(&mut self, what: &'static str) -> Result<Quat> {
        let w = self.read_f32(what)?;
        let x = self.read_f32(what)?;
        let y = self.read_f32(what)?;
        let z = self.read_f32(what)?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// Reads a 3x3 matrix stored row-major in the engine's row-vector
    /// convention; the returned [`Mat3`] is the equivalent matrix for glam's
    /// column vectors.
    pub fn read_mat3(&mut self, what: &'static str) -> Result<Mat3> {
        let mut rows = [[0.0_f32; 3]; 3];
        for row in &mut rows {
            for value in row.iter_mut() {
                *value = self.read_f32(what)?;
            }
        }
        Ok(Mat3::from_cols_array_2d(&rows))
    }

    /// Reads a 4x4 matrix stored row-major in the engine's row-vector
    /// convention, converted like [`Reader::read_mat3`].
    pub fn read_mat4(&mut self, what: &'static str) -> Result<Mat4> {
        let mut rows = [[0.0_f32; 4]; 4];
        for row in &mut rows {
            for value in row.iter_mut() {
                *value = self.read_f32(what)?;
            }
        }
        Ok(Mat4::from_cols_array_2d(&rows))
    }

    /// Reads a fixed-width NUL-terminated name field, discarding the bytes
    /// after the terminator.
    pub fn read_name(&mut self, len: usize, what: &'static str) -> Result<String> {
        let raw = self.take(len, what)?;
        let name = null_terminated_prefix(raw).unwrap_or(raw);
        Ok(String::from_utf8_lossy(name).into_owned())
    }

    /// Validates a wire-supplied element count against the bytes left in
    /// the buffer. Checked before any allocation sized by the count.
    pub fn array_len(&self, count: u32, elem_size: usize, what: &'static str) -> Result<usize> {
        let count = count as usize;
        if count > self.bytes.len().saturating_sub(self.pos) / elem_size {
            return Err(Error::Corrupted { error: what });
        }
        Ok(count)
    }

    /// Reads a NUL-terminated string of unknown length, consuming the
    /// terminator.
    pub fn read_cstr(&mut self, what: &'static str) -> Result<String> {
        let rest = self
            .bytes
            .get(self.pos..)
            .ok_or(Error::Corrupted { error: what })?;
        let value = null_terminated_prefix(rest).ok_or(Error::Corrupted { error: what })?;
        self.pos += value.len() + 1;
        Ok(String::from_utf8_lossy(value).into_owned())
    }
}

pub fn null_terminated_prefix(bytes: &[u8]) -> Option<&[u8]> {
    let end = bytes.iter().position(|&b| b == 0)?;
    Some(&bytes[..end])
}

pub fn parse_slice<T: FromBytes + Unaligned>(
    bytes: &[u8],
    offset: usize,
    count: usize,
) -> Option<&[T]> {
    if count == 0 {
        return Some(&[]);
    }

    bytes
        .get(offset..)
        .and_then(|bytes| LayoutVerified::new_slice_unaligned_from_prefix(bytes, count))
        .map(|(res, _)| res.into_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_tracks_absolute_position() {
        let bytes = [1_u8, 0, 0, 0, 2, 0];
        let mut r = Reader::at(&bytes, 0);
        assert_eq!(r.read_u32("u32").unwrap(), 1);
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_u16("u16").unwrap(), 2);
        assert!(r.read_u8("eof").is_err());
    }

    #[test]
    fn name_field_stops_at_nul() {
        let mut field = [0_u8; 8];
        field[..3].copy_from_slice(b"abc");
        field[5] = b'x'; // garbage after the terminator is ignored
        let mut r = Reader::new(&field);
        assert_eq!(r.read_name(8, "name").unwrap(), "abc");
        assert_eq!(r.position(), 8);
    }

    #[test]
    fn name_field_without_terminator_uses_all_bytes() {
        let mut r = Reader::new(b"abcd");
        assert_eq!(r.read_name(4, "name").unwrap(), "abcd");
    }

    #[test]
    fn array_len_rejects_counts_the_buffer_cannot_hold() {
        let bytes = [0_u8; 40];
        let r = Reader::at(&bytes, 4);
        assert_eq!(r.array_len(3, 12, "count").unwrap(), 3);
        assert!(r.array_len(4, 12, "count").is_err());
        assert!(r.array_len(u32::MAX, 12, "count").is_err());
    }

    #[test]
    fn cstr_consumes_terminator() {
        let mut r = Reader::new(b"ab\0cd\0");
        assert_eq!(r.read_cstr("first").unwrap(), "ab");
        assert_eq!(r.read_cstr("second").unwrap(), "cd");
        assert!(r.read_cstr("eof").is_err());
    }
}
