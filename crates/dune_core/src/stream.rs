//! Ordered binary stream used for save games.
//!
//! Values are written one after another with no framing beyond what each
//! primitive needs, so readers must consume fields in exactly the order
//! they were written. The encoding itself is bincode.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::coord::Coord;
use crate::error::{GameError, Result};

/// Longest list a reader accepts.
pub const MAX_LIST_LEN: u32 = 1 << 16;

/// Sink for ordered primitive values.
pub trait OutputStream {
    /// Write one byte.
    fn write_u8(&mut self, value: u8) -> Result<()>;
    /// Write an unsigned 32-bit integer.
    fn write_u32(&mut self, value: u32) -> Result<()>;
    /// Write a signed 32-bit integer.
    fn write_i32(&mut self, value: i32) -> Result<()>;
    /// Write a boolean.
    fn write_bool(&mut self, value: bool) -> Result<()>;

    /// Write a coordinate as two signed integers.
    fn write_coord(&mut self, value: Coord) -> Result<()> {
        self.write_i32(value.x)?;
        self.write_i32(value.y)
    }

    /// Write a list length prefix.
    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .ok()
            .filter(|l| *l <= MAX_LIST_LEN)
            .ok_or_else(|| GameError::Persistence(format!("list of {len} is too long")))?;
        self.write_u32(len)
    }
}

/// Source of ordered primitive values.
pub trait InputStream {
    /// Read one byte.
    fn read_u8(&mut self) -> Result<u8>;
    /// Read an unsigned 32-bit integer.
    fn read_u32(&mut self) -> Result<u32>;
    /// Read a signed 32-bit integer.
    fn read_i32(&mut self) -> Result<i32>;
    /// Read a boolean.
    fn read_bool(&mut self) -> Result<bool>;

    /// Read a coordinate.
    fn read_coord(&mut self) -> Result<Coord> {
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        Ok(Coord::new(x, y))
    }

    /// Read a list length prefix.
    fn read_len(&mut self) -> Result<u32> {
        let len = self.read_u32()?;
        if len > MAX_LIST_LEN {
            return Err(GameError::Persistence(format!(
                "list length {len} exceeds {MAX_LIST_LEN}"
            )));
        }
        Ok(len)
    }
}

/// [`OutputStream`] over any writer.
#[derive(Debug)]
pub struct BinaryWriter<W: Write> {
    inner: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put<T: Serialize>(&mut self, value: &T) -> Result<()> {
        bincode::serialize_into(&mut self.inner, value)
            .map_err(|e| GameError::Persistence(e.to_string()))
    }
}

impl<W: Write> OutputStream for BinaryWriter<W> {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&value)
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value)
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put(&value)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.put(&value)
    }
}

/// [`InputStream`] over any reader.
#[derive(Debug)]
pub struct BinaryReader<R: Read> {
    inner: R,
}

impl<R: Read> BinaryReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn take<T: DeserializeOwned>(&mut self) -> Result<T> {
        bincode::deserialize_from(&mut self.inner).map_err(|e| GameError::Persistence(e.to_string()))
    }
}

impl<R: Read> InputStream for BinaryReader<R> {
    fn read_u8(&mut self) -> Result<u8> {
        self.take()
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.take()
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.take()
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_fields_read_back_in_order() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u32(7).expect("write");
        writer.write_i32(-300).expect("write");
        writer.write_bool(true).expect("write");
        writer.write_len(2).expect("write");
        writer.write_coord(Coord::new(1, 2)).expect("write");
        writer.write_coord(Coord::INVALID).expect("write");
        writer.write_u8(3).expect("write");
        let bytes = writer.into_inner();

        let mut reader = BinaryReader::new(bytes.as_slice());
        assert_eq!(reader.read_u32().expect("read"), 7);
        assert_eq!(reader.read_i32().expect("read"), -300);
        assert!(reader.read_bool().expect("read"));
        assert_eq!(reader.read_len().expect("read"), 2);
        assert_eq!(reader.read_coord().expect("read"), Coord::new(1, 2));
        assert_eq!(reader.read_coord().expect("read"), Coord::INVALID);
        assert_eq!(reader.read_u8().expect("read"), 3);
    }

    #[test]
    fn test_truncated_stream_is_error() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u8(1).expect("write");
        let bytes = writer.into_inner();
        let mut reader = BinaryReader::new(bytes.as_slice());
        assert!(matches!(reader.read_u32(), Err(GameError::Persistence(_))));
    }

    #[test]
    fn test_oversized_list_is_rejected() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u32(MAX_LIST_LEN + 1).expect("write");
        let bytes = writer.into_inner();
        let mut reader = BinaryReader::new(bytes.as_slice());
        assert!(reader.read_len().is_err());

        let mut writer = BinaryWriter::new(Vec::new());
        assert!(writer.write_len(MAX_LIST_LEN as usize + 1).is_err());
    }
}
