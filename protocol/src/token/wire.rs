//! Fixed-width field serialization.
//!
//! Every token payload is an ordered list of [`WireField`]s. Integers are
//! big-endian, byte arrays are copied verbatim, booleans are one byte that
//! must be 0 or 1. Nothing depends on in-memory struct layout.

use bytes::{BufMut, BytesMut};

use crate::config::{ADDRESS_SIZE, DESCRIPTOR_SIZE, INTERMEDIARY_ID_SIZE};
use crate::crypto::keys::Address;
use crate::error::{PaymentError, Result};
use crate::party::{Descriptor, IntermediaryId};

/// Append-only output buffer for field encoding.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

/// Cursor over a received byte string.
#[derive(Debug)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                PaymentError::Malformed(format!(
                    "field of {n} bytes at offset {} overruns {} byte input",
                    self.pos,
                    self.bytes.len()
                ))
            })?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// A field with a fixed wire width.
pub trait WireField: Sized {
    /// Encoded width in bytes.
    const SIZE: usize;

    fn write(&self, w: &mut WireWriter);

    fn read(r: &mut WireReader<'_>) -> Result<Self>;
}

impl<const N: usize> WireField for [u8; N] {
    const SIZE: usize = N;

    fn write(&self, w: &mut WireWriter) {
        w.put_bytes(self);
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        r.take_array()
    }
}

impl WireField for u8 {
    const SIZE: usize = 1;

    fn write(&self, w: &mut WireWriter) {
        w.put_u8(*self);
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(r.take(1)?[0])
    }
}

impl WireField for bool {
    const SIZE: usize = 1;

    fn write(&self, w: &mut WireWriter) {
        w.put_u8(u8::from(*self));
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        match r.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(PaymentError::Malformed(format!("boolean byte {other}"))),
        }
    }
}

macro_rules! int_field {
    ($($ty:ty),*) => {
        $(
            impl WireField for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn write(&self, w: &mut WireWriter) {
                    w.put_bytes(&self.to_be_bytes());
                }

                fn read(r: &mut WireReader<'_>) -> Result<Self> {
                    Ok(<$ty>::from_be_bytes(r.take_array()?))
                }
            }
        )*
    };
}

int_field!(u32, u64, i64);

impl WireField for Address {
    const SIZE: usize = ADDRESS_SIZE;

    fn write(&self, w: &mut WireWriter) {
        w.put_bytes(self.as_bytes());
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Address(r.take_array()?))
    }
}

impl WireField for Descriptor {
    const SIZE: usize = DESCRIPTOR_SIZE;

    fn write(&self, w: &mut WireWriter) {
        w.put_bytes(&self.to_bytes());
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Descriptor::from_bytes(r.take(DESCRIPTOR_SIZE)?)
    }
}

impl WireField for IntermediaryId {
    const SIZE: usize = INTERMEDIARY_ID_SIZE;

    fn write(&self, w: &mut WireWriter) {
        w.put_bytes(&self.to_bytes());
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        IntermediaryId::from_bytes(r.take(INTERMEDIARY_ID_SIZE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::PartyRole;

    #[test]
    fn integers_are_big_endian() {
        let mut w = WireWriter::default();
        0x0102_0304u32.write(&mut w);
        (-2i64).write(&mut w);
        let bytes = w.into_vec();
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[4..], &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]);

        let mut r = WireReader::new(&bytes);
        assert_eq!(u32::read(&mut r).unwrap(), 0x0102_0304);
        assert_eq!(i64::read(&mut r).unwrap(), -2);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn booleans_reject_other_bytes() {
        let mut r = WireReader::new(&[1, 0, 2]);
        assert!(bool::read(&mut r).unwrap());
        assert!(!bool::read(&mut r).unwrap());
        assert!(matches!(bool::read(&mut r), Err(PaymentError::Malformed(_))));
    }

    #[test]
    fn overrun_is_an_error_not_a_panic() {
        let mut r = WireReader::new(&[0u8; 3]);
        assert!(u64::read(&mut r).is_err());
        assert!(<[u8; 4]>::read(&mut WireReader::new(&[0u8; 3])).is_err());
    }

    #[test]
    fn descriptor_field_width_matches_encoding() {
        let desc = Descriptor::new(9, 8, PartyRole::Relay);
        let mut w = WireWriter::default();
        desc.write(&mut w);
        assert_eq!(w.len(), Descriptor::SIZE);
        let bytes = w.into_vec();
        assert_eq!(Descriptor::read(&mut WireReader::new(&bytes)).unwrap(), desc);
    }
}
