//! Runtime-owned FMU-state records behind the opaque `fmi2FMUstate` handle.
//!
//! The serialized wire form is a little-endian `u64` payload length
//! followed by the payload bytes. Deserialization validates the header
//! against the caller-declared buffer length before touching the payload,
//! and records carry a magic word so handles not produced by this library
//! fail validation instead of being dereferenced blindly.

use crate::binding;

const STATE_MAGIC: u32 = 0x464D_5553; // "FMUS"

/// Length of the size header preceding the payload in serialized form.
pub const SERIALIZED_HEADER_LEN: usize = size_of::<u64>();

/// A snapshot of model state owned by the runtime. The environment holds
/// it only as an opaque `fmi2FMUstate` pointer.
pub struct FmuState {
    magic: u32,
    payload: Vec<u8>,
}

impl FmuState {
    pub fn new(payload: Vec<u8>) -> Box<Self> {
        Box::new(Self {
            magic: STATE_MAGIC,
            payload,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Size of the serialized form: header word plus payload.
    pub fn serialized_size(&self) -> usize {
        SERIALIZED_HEADER_LEN + self.payload.len()
    }

    /// Copy the size-prefixed form into `buffer`, whose length must equal
    /// [`Self::serialized_size`] exactly.
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Result<(), String> {
        if buffer.len() != self.serialized_size() {
            return Err(format!(
                "serialization buffer holds {} bytes, state needs {}",
                buffer.len(),
                self.serialized_size()
            ));
        }
        let (header, payload) = buffer.split_at_mut(SERIALIZED_HEADER_LEN);
        header.copy_from_slice(&(self.payload.len() as u64).to_le_bytes());
        payload.copy_from_slice(&self.payload);
        Ok(())
    }

    /// Reconstruct a record from a size-prefixed buffer. The header must
    /// match the buffer length; payload bytes are treated as opaque.
    pub fn deserialize(buffer: &[u8]) -> Result<Box<Self>, String> {
        if buffer.len() < SERIALIZED_HEADER_LEN {
            return Err(format!(
                "serialized state of {} bytes is shorter than the size header",
                buffer.len()
            ));
        }
        let (header, payload) = buffer.split_at(SERIALIZED_HEADER_LEN);
        let declared = u64::from_le_bytes(header.try_into().expect("header is 8 bytes")) as usize;
        if declared != payload.len() {
            return Err(format!(
                "size header declares {declared} bytes but {} follow",
                payload.len()
            ));
        }
        Ok(Self::new(payload.to_vec()))
    }

    pub fn into_handle(self: Box<Self>) -> binding::fmi2FMUstate {
        Box::into_raw(self) as binding::fmi2FMUstate
    }

    /// Borrow a record from a handle, rejecting null pointers and records
    /// whose magic word does not match this library.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a pointer previously produced by
    /// [`Self::into_handle`] that has not been freed.
    pub unsafe fn from_handle<'a>(handle: binding::fmi2FMUstate) -> Option<&'a FmuState> {
        if handle.is_null() {
            return None;
        }
        let state = unsafe { &*(handle as *const FmuState) };
        (state.magic == STATE_MAGIC).then_some(state)
    }

    /// Drop the record behind a handle. Null is a no-op.
    ///
    /// # Safety
    ///
    /// `handle` must be null or a pointer previously produced by
    /// [`Self::into_handle`] that has not been freed.
    pub unsafe fn free(handle: binding::fmi2FMUstate) {
        if handle.is_null() {
            return;
        }
        drop(unsafe { Box::from_raw(handle as *mut FmuState) });
    }
}
