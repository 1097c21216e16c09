use smallvec::SmallVec;
use tracing::info;

use super::table::{layout, Slot};
use super::*;

/// Dense mapping from assigned handles back to the owning characteristics.
///
/// Built once per server activation by walking the configuration with the
/// same layout sequence used for table construction while consuming the
/// stack-assigned handle range in lockstep. Value slots record their
/// characteristic; declaration slots consume a handle but carry no
/// read/write traffic. Torn down on unregistration.
#[derive(Debug)]
pub struct HandleIndex {
    base: Handle,
    slots: Box<[Option<Characteristic>]>,
    services: SmallVec<[Handle; 4]>,
}

impl HandleIndex {
    /// Builds the index from the handle range assigned by the stack after
    /// table registration. `handles` must be in table submission order and
    /// exactly as long as the submitted table.
    pub fn from_handles(cfg: &DeviceConfig, handles: &[u16]) -> Result<Self> {
        let expected = layout(cfg).count();
        if handles.len() != expected {
            #[allow(clippy::cast_possible_truncation)]
            return Err(Error::HandleRangeMismatch {
                expected: expected as u16,
                actual: handles.len() as u16,
            });
        }
        let base = match handles.first() {
            Some(&h) => Handle::new(h).ok_or(Error::UnknownHandle(h))?,
            None => return Err(Error::InvalidConfiguration("empty attribute layout")),
        };
        let mut slots = vec![None; handles.len()].into_boxed_slice();
        let mut services = SmallVec::new();
        for (slot, &raw) in layout(cfg).zip(handles) {
            let hdl = Handle::new(raw).ok_or(Error::UnknownHandle(raw))?;
            let off = (hdl.offset_from(base))
                .filter(|&off| off < slots.len())
                .ok_or(Error::UnknownHandle(raw))?;
            match slot {
                Slot::Service(_) => services.push(hdl),
                Slot::Declaration(_) => {}
                Slot::Value(chr) => slots[off] = Some(chr.clone()),
            }
        }
        info!(
            "Handle index built for {} attributes at base {base}",
            slots.len()
        );
        Ok(Self {
            base,
            slots,
            services,
        })
    }

    /// Returns the characteristic whose value attribute was assigned `hdl`.
    /// Declaration handles and handles outside the indexed range resolve to
    /// [`Error::UnknownHandle`].
    pub fn get(&self, hdl: Handle) -> Result<&Characteristic> {
        (hdl.offset_from(self.base))
            .and_then(|off| self.slots.get(off))
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownHandle(hdl.raw()))
    }

    /// Returns the assigned service declaration handles in configuration
    /// order, used to start each service.
    #[inline(always)]
    #[must_use]
    pub fn service_handles(&self) -> &[Handle] {
        &self.services
    }

    /// Returns the first assigned handle.
    #[inline(always)]
    #[must_use]
    pub const fn base(&self) -> Handle {
        self.base
    }
}
