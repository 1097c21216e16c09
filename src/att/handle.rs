use std::fmt::{Debug, Display, Formatter};
use std::num::NonZeroU16;

use crate::name_of;

/// Stack-assigned attribute handle.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Handle(NonZeroU16);

impl Handle {
    /// Wraps a raw handle. Returns `None` if the handle is invalid.
    #[inline]
    #[must_use]
    pub const fn new(h: u16) -> Option<Self> {
        match NonZeroU16::new(h) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Returns the next handle or `None` if the maximum handle was reached.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0.get().wrapping_add(1))
    }

    /// Returns the distance from `base`, or `None` if the handle precedes it.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, base: Self) -> Option<usize> {
        match self.0.get().checked_sub(base.0.get()) {
            Some(off) => Some(off as usize),
            None => None,
        }
    }

    /// Returns the raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0.get()
    }
}

impl Debug for Handle {
    #[allow(clippy::use_self)]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#06X})", name_of!(Handle), self.0.get())
    }
}

impl Display for Handle {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl From<Handle> for u16 {
    #[inline]
    fn from(h: Handle) -> Self {
        h.0.get()
    }
}

impl From<Handle> for usize {
    #[inline]
    fn from(h: Handle) -> Self {
        Self::from(h.0.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        let base = Handle::new(100).unwrap();
        assert_eq!(base.offset_from(base), Some(0));
        assert_eq!(Handle::new(104).unwrap().offset_from(base), Some(4));
        assert_eq!(Handle::new(99).unwrap().offset_from(base), None);
    }

    #[test]
    fn next_wraps_to_none() {
        assert_eq!(Handle::new(0), None);
        assert_eq!(Handle::new(0xFFFF).unwrap().next(), None);
        assert_eq!(Handle::new(1).unwrap().next(), Handle::new(2));
    }
}
