use tracing::debug;

use crate::uuid::Uuid;

use super::*;

/// A single addressable data point with read/write semantics. The value is
/// never stored here; reads and writes are delegated to the I/O callback.
/// Immutable once the configuration is frozen.
#[derive(Clone, Debug)]
pub struct Characteristic {
    uuid: Uuid,
    size: u16,
    props: Prop,
    io: Io,
}

impl Characteristic {
    /// Creates a readable/writable characteristic with a fixed value size.
    #[inline]
    pub fn new(uuid: Uuid, size: u16, io: impl Into<Io>) -> Self {
        Self {
            uuid,
            size,
            props: Prop::READ | Prop::WRITE,
            io: io.into(),
        }
    }

    /// Restricts the declared properties.
    #[inline]
    #[must_use]
    pub const fn with_props(mut self, props: Prop) -> Self {
        self.props = props;
        self
    }

    /// Returns the characteristic identifier.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the fixed value size in bytes.
    #[inline(always)]
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Returns the declared properties.
    #[inline(always)]
    #[must_use]
    pub const fn props(&self) -> Prop {
        self.props
    }

    /// Returns the I/O callback.
    #[inline(always)]
    pub(super) const fn io(&self) -> &Io {
        &self.io
    }
}

/// An ordered, non-empty grouping of characteristics. Order determines
/// attribute position and therefore handle assignment.
#[derive(Clone, Debug)]
pub struct Service {
    uuid: Uuid,
    chars: Vec<Characteristic>,
}

impl Service {
    /// Returns the service identifier.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the characteristics in declaration order.
    #[inline(always)]
    #[must_use]
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.chars
    }
}

/// Read-only description of the device's services and advertising metadata.
/// Shared by reference between table construction, index construction, and
/// request dispatch for the lifetime of the server.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    name: String,
    manufacturer: String,
    services: Vec<Service>,
}

impl DeviceConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn build(name: impl Into<String>, manufacturer: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder(Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            services: Vec::new(),
        })
    }

    /// Returns the advertised device name.
    #[inline(always)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the manufacturer name.
    #[inline(always)]
    #[must_use]
    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    /// Returns the services in declaration order.
    #[inline(always)]
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }
}

/// Device configuration builder. Services and characteristics keep their
/// declaration order.
#[derive(Debug)]
pub struct ConfigBuilder(DeviceConfig);

impl ConfigBuilder {
    /// Defines a service with an explicit identifier.
    #[inline]
    pub fn service(&mut self, uuid: Uuid, chars: impl FnOnce(&mut ServiceBuilder)) -> &mut Self {
        self.push_service(uuid, chars)
    }

    /// Defines a service whose identifier is derived from its placement
    /// index, as are those of characteristics declared without an explicit
    /// identifier inside it.
    #[inline]
    pub fn indexed_service(&mut self, chars: impl FnOnce(&mut ServiceBuilder)) -> &mut Self {
        #[allow(clippy::cast_possible_truncation)]
        let tag = self.0.services.len() as u8;
        self.push_service(Uuid::local(tag, 0), chars)
    }

    fn push_service(&mut self, uuid: Uuid, chars: impl FnOnce(&mut ServiceBuilder)) -> &mut Self {
        let mut b = ServiceBuilder(Service {
            uuid,
            chars: Vec::new(),
        });
        chars(&mut b);
        debug!("Configured service {} ({} characteristics)", b.0.uuid, b.0.chars.len());
        self.0.services.push(b.0);
        self
    }

    /// Returns the finalized read-only configuration.
    #[inline]
    #[must_use]
    pub fn freeze(self) -> DeviceConfig {
        self.0
    }
}

/// Builder for the characteristics of one service.
#[derive(Debug)]
pub struct ServiceBuilder(Service);

impl ServiceBuilder {
    /// Defines a characteristic with an explicit identifier.
    #[inline]
    pub fn characteristic(&mut self, uuid: Uuid, size: u16, io: impl Into<Io>) -> &mut Self {
        self.0.chars.push(Characteristic::new(uuid, size, io));
        self
    }

    /// Defines a characteristic whose identifier is derived from the service
    /// tag and its placement index.
    #[inline]
    pub fn indexed_characteristic(&mut self, size: u16, io: impl Into<Io>) -> &mut Self {
        #[allow(clippy::cast_possible_truncation)]
        let tag = self.0.chars.len() as u8 + 1;
        let uuid = Uuid::local(self.0.uuid.service_tag(), tag);
        self.characteristic(uuid, size, io)
    }

    /// Adds a fully specified characteristic.
    #[inline]
    pub fn push(&mut self, chr: Characteristic) -> &mut Self {
        self.0.chars.push(chr);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop() -> Io {
        Io::from(|_: IoReq| Ok(()))
    }

    #[test]
    fn declaration_order() {
        let mut b = DeviceConfig::build("dev", "mfr");
        b.service(Uuid::local(1, 0), |s| {
            s.characteristic(Uuid::local(1, 1), 4, nop())
                .characteristic(Uuid::local(1, 2), 2, nop());
        })
        .service(Uuid::local(2, 0), |s| {
            s.characteristic(Uuid::local(2, 1), 1, nop());
        });
        let cfg = b.freeze();

        assert_eq!(cfg.name(), "dev");
        assert_eq!(cfg.manufacturer(), "mfr");
        assert_eq!(cfg.services().len(), 2);
        assert_eq!(cfg.services()[0].characteristics().len(), 2);
        assert_eq!(cfg.services()[0].characteristics()[1].uuid(), Uuid::local(1, 2));
        assert_eq!(cfg.services()[1].characteristics()[0].size(), 1);
    }

    #[test]
    fn indexed_identifiers() {
        let mut b = DeviceConfig::build("dev", "mfr");
        b.indexed_service(|s| {
            s.indexed_characteristic(4, nop());
        })
        .indexed_service(|s| {
            s.indexed_characteristic(4, nop()).indexed_characteristic(2, nop());
        });
        let cfg = b.freeze();

        assert_eq!(cfg.services()[0].uuid(), Uuid::local(0, 0));
        assert_eq!(cfg.services()[1].uuid(), Uuid::local(1, 0));
        let chars = cfg.services()[1].characteristics();
        assert_eq!(chars[0].uuid(), Uuid::local(1, 1));
        assert_eq!(chars[1].uuid(), Uuid::local(1, 2));
    }

    #[test]
    fn default_props() {
        let chr = Characteristic::new(Uuid::local(1, 1), 4, nop());
        assert_eq!(chr.props(), Prop::READ | Prop::WRITE);
        let ro = chr.clone().with_props(Prop::READ);
        assert_eq!(ro.props(), Prop::READ);
    }
}
