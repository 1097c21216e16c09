//! 128- and 16-bit attribute identifiers.

use std::fmt::{Debug, Display, Formatter};
use std::num::{NonZeroU128, NonZeroU16};

use structbuf::{Packer, Unpack};

const SHIFT: u32 = u128::BITS - u32::BITS;
const SIG_BASE: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// Base UUID for locally assigned identifiers. Service and characteristic
/// tags occupy bytes 11 and 10 (`C2D5B9D6-XXYY-452E-84D1-0A0C537A36D7`).
const LOCAL_BASE: u128 = 0xC2D5B9D6_0000_452E_84D1_0A0C537A36D7;
const SVC_TAG_SHIFT: u32 = 11 * 8;
const CHR_TAG_SHIFT: u32 = 10 * 8;
const TAG_MASK: u128 = !(0xFFFF << CHR_TAG_SHIFT);

/// 128-bit service or characteristic identifier.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Uuid(NonZeroU128);

impl Uuid {
    /// UUID size in bytes.
    pub const BYTES: usize = std::mem::size_of::<Self>();

    /// Creates a UUID from a `u128`. Returns [`None`] if the value is zero.
    #[inline]
    #[must_use]
    pub const fn new(v: u128) -> Option<Self> {
        match NonZeroU128::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Creates a locally assigned UUID from service and characteristic tags.
    /// The characteristic tag must be `0` for a service identifier.
    #[inline]
    #[must_use]
    pub const fn local(svc_tag: u8, chr_tag: u8) -> Self {
        let v = LOCAL_BASE | (svc_tag as u128) << SVC_TAG_SHIFT | (chr_tag as u128) << CHR_TAG_SHIFT;
        // SAFETY: LOCAL_BASE is non-zero
        Self(unsafe { NonZeroU128::new_unchecked(v) })
    }

    /// Returns whether the UUID uses the locally assigned base.
    #[inline]
    #[must_use]
    pub const fn is_local(self) -> bool {
        self.0.get() & TAG_MASK == LOCAL_BASE
    }

    /// Returns the service tag of a locally assigned UUID.
    #[inline]
    #[must_use]
    pub const fn service_tag(self) -> u8 {
        (self.0.get() >> SVC_TAG_SHIFT) as u8
    }

    /// Returns the characteristic tag of a locally assigned UUID.
    #[inline]
    #[must_use]
    pub const fn characteristic_tag(self) -> u8 {
        (self.0.get() >> CHR_TAG_SHIFT) as u8
    }

    /// Returns the UUID as a little-endian byte array.
    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::BYTES] {
        self.0.get().to_le_bytes()
    }
}

impl From<Uuid> for u128 {
    #[inline]
    fn from(u: Uuid) -> Self {
        u.0.get()
    }
}

impl From<Uuid16> for Uuid {
    #[inline]
    fn from(u: Uuid16) -> Self {
        u.as_uuid()
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = ();

    #[inline]
    fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
        match v.len() {
            Self::BYTES => Self::new(v.unpack().u128()),
            Uuid16::BYTES => Uuid16::new(v.unpack().u16()).map(Uuid16::as_uuid),
            _ => None,
        }
        .ok_or(())
    }
}

impl Debug for Uuid {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let v = self.0.get();
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl Display for Uuid {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// 16-bit SIG-assigned attribute type identifier.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Uuid16(NonZeroU16);

impl Uuid16 {
    /// UUID size in bytes.
    pub const BYTES: usize = std::mem::size_of::<Self>();

    /// Creates a 16-bit UUID from a `u16`. Returns [`None`] if the value is
    /// zero.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Option<Self> {
        match NonZeroU16::new(v) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Returns the full 128-bit representation.
    #[inline]
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        // SAFETY: SIG_BASE is non-zero
        Uuid(unsafe { NonZeroU128::new_unchecked(SIG_BASE | (self.0.get() as u128) << SHIFT) })
    }

    /// Returns the raw 16-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.get()
    }
}

impl From<Uuid16> for u16 {
    #[inline]
    fn from(u: Uuid16) -> Self {
        u.0.get()
    }
}

impl Debug for Uuid16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#06X})", crate::name_of!(Uuid16), self.0.get())
    }
}

impl Display for Uuid16 {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Packer extension for writing UUIDs.
pub(crate) trait UuidPacker {
    fn uuid(&mut self, u: Uuid);
}

impl UuidPacker for Packer<'_> {
    /// Writes a 128-bit UUID at the current index.
    #[inline]
    fn uuid(&mut self, u: Uuid) {
        self.u128(u);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_tags() {
        let u = Uuid::local(0x0A, 0x03);
        assert!(u.is_local());
        assert_eq!(u.service_tag(), 0x0A);
        assert_eq!(u.characteristic_tag(), 0x03);
        assert_eq!(u128::from(u), 0xC2D5B9D6_0A03_452E_84D1_0A0C537A36D7);

        let svc = Uuid::local(0x0A, 0);
        assert_eq!(svc.characteristic_tag(), 0);
        assert_ne!(svc, u);
    }

    #[test]
    fn local_byte_layout() {
        let b = Uuid::local(0x12, 0x34).to_bytes();
        assert_eq!(b[11], 0x12);
        assert_eq!(b[10], 0x34);
        assert_eq!(b[15], 0xC2);
        assert_eq!(b[0], 0xD7);
    }

    #[test]
    fn display() {
        assert_eq!(
            Uuid::local(0, 0).to_string(),
            "C2D5B9D6-0000-452E-84D1-0A0C537A36D7"
        );
        assert_eq!(
            Uuid16::new(0x2800).unwrap().as_uuid().to_string(),
            "00002800-0000-1000-8000-00805F9B34FB"
        );
    }

    #[test]
    fn from_bytes() {
        let u = Uuid::local(7, 9);
        assert_eq!(Uuid::try_from(u.to_bytes().as_ref()), Ok(u));
        assert_eq!(Uuid::try_from([0u8; 5].as_ref()), Err(()));
    }
}
