use std::iter;

use structbuf::{Pack, StructBuf};
use tracing::info;

use crate::uuid::{Uuid, UuidPacker};

use super::*;

/// One position in the flat attribute layout. The same sequence is consumed
/// by table construction and by handle-index construction, so the two can
/// never disagree on how many slots a service or characteristic occupies.
#[derive(Clone, Copy, Debug)]
pub(super) enum Slot<'a> {
    /// Service declaration, one per service.
    Service(&'a Service),
    /// Characteristic declaration, immediately followed by its value.
    Declaration(&'a Characteristic),
    /// Characteristic value, the attribute bound to read/write traffic.
    Value(&'a Characteristic),
}

/// Returns the attribute layout of `cfg` in registration order.
pub(super) fn layout(cfg: &DeviceConfig) -> impl Iterator<Item = Slot<'_>> {
    cfg.services().iter().flat_map(|svc| {
        iter::once(Slot::Service(svc)).chain(
            (svc.characteristics().iter())
                .flat_map(|chr| [Slot::Declaration(chr), Slot::Value(chr)]),
        )
    })
}

/// Attribute type of one table entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrType {
    /// Primary service declaration (type `0x2800`).
    Service,
    /// Characteristic declaration (type `0x2803`).
    Declaration,
    /// Characteristic value, typed by the characteristic's own identifier.
    Value(Uuid),
}

impl AttrType {
    /// Returns the protocol-level attribute type identifier.
    #[inline]
    #[must_use]
    pub fn uuid(self) -> Uuid {
        match self {
            Self::Service => Declaration::PrimaryService.uuid16().as_uuid(),
            Self::Declaration => Declaration::Characteristic.uuid16().as_uuid(),
            Self::Value(u) => u,
        }
    }
}

/// One row of the registration table submitted to the external stack.
#[derive(Clone, Debug, Eq, PartialEq)]
#[must_use]
pub struct AttrDesc {
    typ: AttrType,
    access: Access,
    val: Vec<u8>,
}

impl AttrDesc {
    /// Returns the attribute type.
    #[inline(always)]
    pub const fn typ(&self) -> AttrType {
        self.typ
    }

    /// Returns the access permissions.
    #[inline(always)]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Returns the initial attribute value. Empty for value attributes, whose
    /// contents are produced by callbacks rather than table storage.
    #[inline(always)]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.val
    }
}

/// Flat, ordered attribute table derived from a device configuration.
///
/// For `S` services with `Cᵢ` characteristics each, the table holds exactly
/// `S + 2·ΣCᵢ` rows: one service declaration per service, then a declaration
/// and a value row per characteristic in configuration order. Construction is
/// a pure function of the configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttrTable {
    attrs: Box<[AttrDesc]>,
}

impl AttrTable {
    /// Builds the attribute table for `cfg`. A configuration with no services
    /// or a service with no characteristics cannot be registered and is
    /// rejected.
    pub fn build(cfg: &DeviceConfig) -> Result<Self> {
        if cfg.services().is_empty() {
            return Err(Error::InvalidConfiguration("no services"));
        }
        if cfg.services().iter().any(|s| s.characteristics().is_empty()) {
            return Err(Error::InvalidConfiguration("service with no characteristics"));
        }
        let attrs = layout(cfg)
            .map(|slot| match slot {
                Slot::Service(svc) => AttrDesc {
                    typ: AttrType::Service,
                    access: Access::READ,
                    val: pack_val(Uuid::BYTES, |p| p.uuid(svc.uuid())),
                },
                Slot::Declaration(chr) => AttrDesc {
                    typ: AttrType::Declaration,
                    access: Access::READ,
                    val: pack_val(1, |p| {
                        p.u8(chr.props().bits());
                    }),
                },
                Slot::Value(chr) => AttrDesc {
                    typ: AttrType::Value(chr.uuid()),
                    access: chr.props().into(),
                    val: Vec::new(),
                },
            })
            .collect();
        let this = Self { attrs };
        info!("Attribute table built ({} entries)", this.len());
        Ok(this)
    }

    /// Returns the number of table entries, which must equal the length of
    /// the handle range assigned by the stack.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::len_without_is_empty)]
    pub fn len(&self) -> u16 {
        self.attrs.len() as u16
    }

    /// Returns the table rows in registration order.
    #[inline(always)]
    #[must_use]
    pub fn attrs(&self) -> &[AttrDesc] {
        &self.attrs
    }
}

/// Packs a declaration value using `f`.
fn pack_val(cap: usize, f: impl FnOnce(&mut structbuf::Packer)) -> Vec<u8> {
    let mut b = StructBuf::new(cap);
    f(&mut b.append());
    b.as_ref().to_vec()
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;

    use super::*;

    fn nop() -> Io {
        Io::from(|_: IoReq| Ok(()))
    }

    /// 1 service with 2 characteristics.
    fn scenario_a() -> DeviceConfig {
        let mut b = DeviceConfig::build("a", "t");
        b.service(Uuid::local(1, 0), |s| {
            s.characteristic(Uuid::local(1, 1), 4, nop())
                .characteristic(Uuid::local(1, 2), 2, nop());
        });
        b.freeze()
    }

    /// 2 services, 1 characteristic then 2.
    fn scenario_b() -> DeviceConfig {
        let mut b = DeviceConfig::build("b", "t");
        b.service(Uuid::local(1, 0), |s| {
            s.characteristic(Uuid::local(1, 1), 4, nop());
        })
        .service(Uuid::local(2, 0), |s| {
            s.characteristic(Uuid::local(2, 1), 4, nop())
                .characteristic(Uuid::local(2, 2), 2, nop());
        });
        b.freeze()
    }

    #[test]
    fn row_counts() {
        // One row per service, two per characteristic, nothing past the end.
        assert_eq!(AttrTable::build(&scenario_a()).unwrap().len(), 5);
        assert_eq!(AttrTable::build(&scenario_b()).unwrap().len(), 8);

        let mut b = DeviceConfig::build("one", "t");
        b.service(Uuid::local(1, 0), |s| {
            s.characteristic(Uuid::local(1, 1), 4, nop());
        });
        let tab = AttrTable::build(&b.freeze()).unwrap();
        assert_eq!(tab.len(), 3);
        assert_matches!(tab.attrs()[2].typ(), AttrType::Value(_));
    }

    #[test]
    fn row_order_and_contents() {
        let cfg = scenario_a();
        let tab = AttrTable::build(&cfg).unwrap();
        let rows = tab.attrs();

        assert_eq!(rows[0].typ(), AttrType::Service);
        assert_eq!(rows[0].value(), Uuid::local(1, 0).to_bytes());
        assert_eq!(rows[0].access(), Access::READ);

        assert_eq!(rows[1].typ(), AttrType::Declaration);
        assert_eq!(rows[1].value(), [(Prop::READ | Prop::WRITE).bits()]);

        assert_eq!(rows[2].typ(), AttrType::Value(Uuid::local(1, 1)));
        assert_eq!(rows[2].access(), Access::READ_WRITE);
        assert!(rows[2].value().is_empty());

        assert_eq!(rows[3].typ(), AttrType::Declaration);
        assert_eq!(rows[4].typ(), AttrType::Value(Uuid::local(1, 2)));
    }

    #[test]
    fn value_rows_keep_their_own_identity() {
        let cfg = scenario_b();
        let tab = AttrTable::build(&cfg).unwrap();
        let uuids: Vec<_> = (tab.attrs().iter())
            .filter_map(|at| match at.typ() {
                AttrType::Value(u) => Some(u),
                _ => None,
            })
            .collect();
        assert_eq!(
            uuids,
            [Uuid::local(1, 1), Uuid::local(2, 1), Uuid::local(2, 2)]
        );
    }

    #[test]
    fn deterministic() {
        let cfg = scenario_b();
        assert_eq!(
            AttrTable::build(&cfg).unwrap(),
            AttrTable::build(&cfg).unwrap()
        );
    }

    #[test]
    fn rejects_empty() {
        let empty = DeviceConfig::build("e", "t").freeze();
        assert_matches!(
            AttrTable::build(&empty),
            Err(Error::InvalidConfiguration(_))
        );

        let mut b = DeviceConfig::build("e", "t");
        b.service(Uuid::local(1, 0), |_| {});
        assert_matches!(
            AttrTable::build(&b.freeze()),
            Err(Error::InvalidConfiguration(_))
        );
    }

    #[test]
    fn restricted_props() {
        let mut b = DeviceConfig::build("ro", "t");
        b.service(Uuid::local(1, 0), |s| {
            s.push(Characteristic::new(Uuid::local(1, 1), 4, nop()).with_props(Prop::READ));
        });
        let tab = AttrTable::build(&b.freeze()).unwrap();
        assert_eq!(tab.attrs()[1].value(), [Prop::READ.bits()]);
        assert_eq!(tab.attrs()[2].access(), Access::READ);
    }
}
