//! Self-describing binary encoding of model state.
//!
//! This is the default wire format behind `fmi2GetFMUstate` for models
//! using the derived variable builder: a magic word, a format version, the
//! field count, then one tagged value per field in declaration order.
//! Numbers are little-endian; strings are length-prefixed UTF-8. Decoding
//! rejects wrong magic, unknown versions, count mismatches and tag
//! mismatches, so a payload from a different model or library version
//! fails loudly instead of silently scrambling fields.

use thiserror::Error;

use crate::model::ModelError;

const MAGIC: [u8; 2] = *b"MV";
const VERSION: u8 = 1;

const TAG_REAL: u8 = 1;
const TAG_INTEGER: u8 = 2;
const TAG_BOOLEAN: u8 = 3;
const TAG_STRING: u8 = 4;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("state payload does not start with the expected magic bytes")]
    BadMagic,

    #[error("state payload has format version {0}, expected {VERSION}")]
    UnsupportedVersion(u8),

    #[error("state payload carries {found} fields, expected {expected}")]
    FieldCountMismatch { expected: u32, found: u32 },

    #[error("state payload has type tag {found} where {expected} was expected")]
    TagMismatch { expected: u8, found: u8 },

    #[error("state payload ended unexpectedly")]
    UnexpectedEnd,

    #[error("state payload has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("state payload holds a string that is not valid UTF-8")]
    InvalidUtf8,
}

impl From<CodecError> for ModelError {
    fn from(err: CodecError) -> Self {
        ModelError::MalformedState(err.to_string())
    }
}

/// Serializes one state snapshot. Fields must be written in the same order
/// the matching [`StateReader`] reads them.
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    pub fn new(field_count: u32) -> Self {
        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&field_count.to_le_bytes());
        Self { buf }
    }

    pub fn write_real(&mut self, value: f64) {
        self.buf.push(TAG_REAL);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_integer(&mut self, value: i32) {
        self.buf.push(TAG_INTEGER);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_boolean(&mut self, value: bool) {
        self.buf.push(TAG_BOOLEAN);
        self.buf.push(value as u8);
    }

    pub fn write_string(&mut self, value: &str) {
        self.buf.push(TAG_STRING);
        self.buf
            .extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Decodes a snapshot produced by [`StateWriter`], validating the header
/// before any field is read.
pub struct StateReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(bytes: &'a [u8], expected_fields: u32) -> Result<Self, CodecError> {
        let mut reader = Self { bytes, pos: 0 };
        if reader.take(MAGIC.len())? != MAGIC {
            return Err(CodecError::BadMagic);
        }
        let version = reader.take(1)?[0];
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let found = u32::from_le_bytes(reader.take(4)?.try_into().expect("4 bytes"));
        if found != expected_fields {
            return Err(CodecError::FieldCountMismatch {
                expected: expected_fields,
                found,
            });
        }
        Ok(reader)
    }

    pub fn read_real(&mut self) -> Result<f64, CodecError> {
        self.tag(TAG_REAL)?;
        Ok(f64::from_le_bytes(
            self.take(8)?.try_into().expect("8 bytes"),
        ))
    }

    pub fn read_integer(&mut self) -> Result<i32, CodecError> {
        self.tag(TAG_INTEGER)?;
        Ok(i32::from_le_bytes(
            self.take(4)?.try_into().expect("4 bytes"),
        ))
    }

    pub fn read_boolean(&mut self) -> Result<bool, CodecError> {
        self.tag(TAG_BOOLEAN)?;
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        self.tag(TAG_STRING)?;
        let len = u32::from_le_bytes(self.take(4)?.try_into().expect("4 bytes")) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    /// Confirm the payload was fully consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        let remaining = self.bytes.len() - self.pos;
        if remaining != 0 {
            return Err(CodecError::TrailingBytes(remaining));
        }
        Ok(())
    }

    fn tag(&mut self, expected: u8) -> Result<(), CodecError> {
        let found = self.take(1)?[0];
        if found != expected {
            return Err(CodecError::TagMismatch { expected, found });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEnd)?;
        if end > self.bytes.len() {
            return Err(CodecError::UnexpectedEnd);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}
