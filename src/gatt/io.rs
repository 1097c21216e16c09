use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use structbuf::{Pack, StructBuf};

use crate::name_of;

use super::*;

/// I/O callback result type.
pub type IoResult = std::result::Result<(), ErrorCode>;

/// Characteristic read/write callback.
#[derive(Clone)]
#[repr(transparent)]
pub struct Io(Arc<dyn for<'a> Fn(IoReq<'a>) -> IoResult + Send + Sync>);

impl Io {
    /// Returns an I/O callback for a method of `T`.
    #[inline(always)]
    pub fn with<T: Send + Sync + 'static>(
        this: &Arc<T>,
        f: impl Fn(&T, IoReq) -> IoResult + Send + Sync + 'static,
    ) -> Self {
        let this = Arc::clone(this);
        Self(Arc::new(move |req: IoReq| f(&this, req)))
    }

    /// Executes the specified request.
    #[inline(always)]
    pub(super) fn exec(&self, req: IoReq) -> IoResult {
        self.0(req)
    }
}

impl Debug for Io {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        (f.debug_tuple(name_of!(Io)).field(&Arc::as_ptr(&self.0))).finish()
    }
}

impl<T: Fn(IoReq) -> IoResult + Send + Sync + 'static> From<T> for Io {
    #[inline(always)]
    fn from(f: T) -> Self {
        Self(Arc::new(f))
    }
}

/// Characteristic I/O request.
#[derive(Debug)]
#[non_exhaustive]
pub enum IoReq<'a> {
    Read(&'a mut ReadReq),
    Write(&'a WriteReq<'a>),
}

/// Characteristic read request. The callback fills the response buffer, which
/// is capped at the characteristic's configured value size and the response
/// capacity of the transport.
#[derive(Debug)]
pub struct ReadReq {
    pub(super) hdl: Handle,
    pub(super) buf: StructBuf,
}

impl ReadReq {
    /// Creates a new read request with the specified buffer capacity.
    #[inline(always)]
    pub(super) fn new(hdl: Handle, cap: usize) -> Self {
        Self {
            hdl,
            buf: StructBuf::new(cap),
        }
    }

    /// Returns the value attribute handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the response buffer capacity.
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.lim()
    }

    /// Provides the attribute value, truncated to the buffer capacity.
    #[inline]
    pub fn fill(&mut self, v: impl AsRef<[u8]>) -> IoResult {
        let v = v.as_ref();
        self.buf.clear();
        self.buf.put_at(0, &v[..v.len().min(self.buf.lim())]);
        Ok(())
    }

    /// Consumes the request, returning the response value.
    #[inline(always)]
    pub(super) fn into_value(self) -> StructBuf {
        self.buf
    }
}

/// Characteristic write request carrying the peer-supplied value verbatim.
/// The callback alone decides how to interpret truncated or oversized input.
#[derive(Debug)]
pub struct WriteReq<'a> {
    pub(super) hdl: Handle,
    pub(super) val: &'a [u8],
}

impl<'a> WriteReq<'a> {
    /// Returns the value attribute handle.
    #[inline(always)]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.hdl
    }

    /// Returns the value to be written.
    #[inline(always)]
    #[must_use]
    pub const fn value(&self) -> &'a [u8] {
        self.val
    }

    /// Updates `dst` with the written value. Fails with
    /// `InvalidAttributeValueLength` if the value does not fit.
    #[inline]
    pub fn update(&self, mut dst: impl AsMut<[u8]>) -> IoResult {
        let Some(dst) = dst.as_mut().get_mut(..self.val.len()) else {
            return Err(ErrorCode::InvalidAttributeValueLength);
        };
        dst.copy_from_slice(self.val);
        Ok(())
    }
}

impl<'a> AsRef<[u8]> for WriteReq<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &'a [u8] {
        self.val
    }
}
