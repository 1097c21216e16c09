use bitflags::bitflags;

use crate::uuid::Uuid16;

/// GATT profile declaration attribute types ([Assigned Numbers] Section 3.6).
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u16)]
pub enum Declaration {
    PrimaryService = 0x2800,
    SecondaryService = 0x2801,
    Include = 0x2802,
    Characteristic = 0x2803,
}

impl Declaration {
    /// Returns the declaration type UUID.
    #[inline]
    #[must_use]
    pub const fn uuid16(self) -> Uuid16 {
        // All discriminants are non-zero
        match Uuid16::new(self as u16) {
            Some(u) => u,
            None => unreachable!(),
        }
    }
}

bitflags! {
    /// Characteristic properties encoded in the declaration attribute value.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct Prop: u8 {
        /// Permits reads of the characteristic value.
        const READ = 0x02;
        /// Permits writes of the characteristic value with response.
        const WRITE = 0x08;
    }
}

bitflags! {
    /// Attribute access permissions.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct Access: u8 {
        /// Read access.
        const READ = 1 << 0;
        /// Write access.
        const WRITE = 1 << 1;
        /// Read/write access.
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl From<Prop> for Access {
    /// Derives value-attribute permissions from the declared properties.
    fn from(p: Prop) -> Self {
        let mut ac = Self::empty();
        ac.set(Self::READ, p.contains(Prop::READ));
        ac.set(Self::WRITE, p.contains(Prop::WRITE));
        ac
    }
}

/// ATT protocol error codes reportable to the remote peer
/// ([Vol 3] Part F, Section 3.4.1.1).
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
    thiserror::Error,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum ErrorCode {
    /// The attribute handle given was not valid on this server.
    #[error("invalid handle")]
    InvalidHandle = 0x01,
    /// The attribute cannot be read.
    #[error("read not permitted")]
    ReadNotPermitted = 0x02,
    /// The attribute cannot be written.
    #[error("write not permitted")]
    WriteNotPermitted = 0x03,
    /// The attribute value length is invalid for the operation.
    #[error("invalid attribute value length")]
    InvalidAttributeValueLength = 0x0D,
    /// The request has encountered an error that was unlikely, and therefore
    /// could not be completed as requested.
    #[error("unlikely error")]
    UnlikelyError = 0x0E,
    /// Insufficient resources to complete the request.
    #[error("insufficient resources")]
    InsufficientResources = 0x11,
    /// The attribute parameter value was not allowed.
    #[error("value not allowed")]
    ValueNotAllowed = 0x13,
    /// Write operation cannot be fulfilled for reasons other than permissions.
    #[error("write request rejected")]
    WriteRequestRejected = 0xFC,
    /// Attribute value is out of range.
    #[error("out of range")]
    OutOfRange = 0xFF,
}

/// Status codes reported by the external attribute-protocol stack.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
    thiserror::Error,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum Status {
    #[error("ok")]
    Ok = 0x00,
    #[error("no resources")]
    NoResources = 0x80,
    #[error("internal error")]
    InternalError = 0x81,
    #[error("busy")]
    Busy = 0x84,
    #[error("generic error")]
    Error = 0x85,
    #[error("invalid state")]
    InvalidState = 0x87,
}

impl Status {
    /// Converts a status code into a result.
    #[inline]
    pub const fn ok(self) -> Result<(), Self> {
        match self {
            Self::Ok => Ok(()),
            e => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_uuids() {
        assert_eq!(u16::from(Declaration::PrimaryService.uuid16()), 0x2800);
        assert_eq!(u16::from(Declaration::Characteristic.uuid16()), 0x2803);
    }

    #[test]
    fn access_from_props() {
        assert_eq!(Access::from(Prop::READ | Prop::WRITE), Access::READ_WRITE);
        assert_eq!(Access::from(Prop::READ), Access::READ);
        assert_eq!(Access::from(Prop::empty()), Access::empty());
    }

    #[test]
    fn status_result() {
        assert_eq!(Status::Ok.ok(), Ok(()));
        assert_eq!(Status::Busy.ok(), Err(Status::Busy));
    }
}
