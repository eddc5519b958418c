// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read cursor over a wire buffer.
//!

use crate::error::{CodecError, CodecResult};

/// Generate read methods for fixed-width little-endian primitives
/// (eliminates code duplication)
///
/// Each generated method:
/// 1. Checks buffer bounds (returns `CodecError::TruncatedInput` if short)
/// 2. Reads N bytes from buffer
/// 3. Converts bytes to value via `from_le_bytes()`
/// 4. Advances offset
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> CodecResult<$type> {
            if self.offset + $size > self.buffer.len() {
                return Err(CodecError::TruncatedInput {
                    offset: self.offset,
                    need: $size,
                    have: self.remaining(),
                });
            }
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(&self.buffer[self.offset..self.offset + $size]);
            self.offset += $size;
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_u16_le, u16, 2);
    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_u64_le, u64, 8);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_i16_le, i16, 2);
    impl_read_le!(read_i32_le, i32, 4);
    impl_read_le!(read_i64_le, i64, 8);

    pub fn read_f32_le(&mut self) -> CodecResult<f32> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    pub fn read_f64_le(&mut self) -> CodecResult<f64> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    /// Read `count` raw bytes, advancing the cursor.
    pub fn read_bytes(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::TruncatedInput {
                offset: self.offset,
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_offset() {
        let buf = [0x2A, 0x00, 0x01, 0x00, 0x00, 0x00];
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_u8().unwrap(), 0x2A);
        assert_eq!(cur.read_u8().unwrap(), 0x00);
        assert_eq!(cur.read_u32_le().unwrap(), 1);
        assert_eq!(cur.offset(), 6);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn short_read_reports_offset() {
        let buf = [0x01, 0x02];
        let mut cur = Cursor::new(&buf);
        cur.read_u8().unwrap();
        let err = cur.read_u32_le().unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                offset: 1,
                need: 4,
                have: 1
            }
        );
    }

    #[test]
    fn read_bytes_checks_bounds() {
        let buf = [1, 2, 3];
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert!(matches!(
            cur.read_bytes(1),
            Err(CodecError::TruncatedInput { .. })
        ));
    }
}
