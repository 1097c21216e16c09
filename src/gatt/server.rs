use std::sync::Arc;

use tracing::{debug, info, warn};

use super::*;

/// Application profile identifier. Only one profile is supported by design.
const PROFILE_ID: u8 = 0;

/// Attribute table instance identifier. Only one table instance exists at a
/// time.
const INSTANCE_ID: u8 = 0;

/// Server lifecycle state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// No profile registered. Initial and terminal state.
    Unregistered,
    /// Profile registration submitted, waiting for the stack to confirm.
    Registering,
    /// Attribute table submitted, waiting for the assigned handle range.
    AwaitingTableCreation,
    /// Start directives issued, waiting for every service to come up.
    StartingServices,
    /// Serving read/write traffic.
    Ready,
    /// Teardown requested, waiting for the stack to confirm.
    Unregistering,
}

/// Asynchronous notification delivered by the external stack. Notifications
/// are processed one at a time; the lifecycle state machine is the sole
/// serialization mechanism.
#[derive(Debug)]
#[non_exhaustive]
pub enum Event<'a> {
    /// Profile registration completed.
    Registered { status: Status },
    /// The submitted attribute table was created and assigned a contiguous
    /// handle range, in submission order.
    TableCreated { status: Status, handles: &'a [u16] },
    /// One service start directive completed.
    ServiceStarted { status: Status, hdl: u16 },
    /// A peer requested a characteristic read.
    Read {
        conn: u16,
        trans: u32,
        hdl: u16,
        /// Maximum response payload the transport can relay.
        capacity: u16,
    },
    /// A peer wrote a characteristic value.
    Write { hdl: u16, value: &'a [u8] },
    /// A peer connected.
    Connected { conn: u16 },
    /// A peer disconnected.
    Disconnected { conn: u16, reason: u8 },
    /// Profile unregistration completed.
    Unregistered,
}

impl Event<'_> {
    /// Returns the event name used in logs and transition errors.
    const fn name(&self) -> &'static str {
        match *self {
            Self::Registered { .. } => "registered",
            Self::TableCreated { .. } => "table created",
            Self::ServiceStarted { .. } => "service started",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Connected { .. } => "connect",
            Self::Disconnected { .. } => "disconnect",
            Self::Unregistered => "unregistered",
        }
    }
}

/// Operations consumed from the external attribute-protocol stack. Completion
/// of the asynchronous ones is reported back through [`Event`]s.
pub trait Stack {
    /// Registers an application profile. Completion arrives as
    /// [`Event::Registered`].
    fn register_profile(&mut self, id: u8) -> std::result::Result<(), Status>;

    /// Unregisters an application profile. Completion arrives as
    /// [`Event::Unregistered`].
    fn unregister_profile(&mut self, id: u8) -> std::result::Result<(), Status>;

    /// Submits the attribute table for bulk registration. The assigned handle
    /// range arrives as [`Event::TableCreated`].
    fn create_attr_table(
        &mut self,
        table: &AttrTable,
        instance: u8,
    ) -> std::result::Result<(), Status>;

    /// Starts the service declared at `hdl`.
    fn start_service(&mut self, hdl: Handle) -> std::result::Result<(), Status>;

    /// Relays a read response, or a protocol error, to the peer.
    fn read_response(
        &mut self,
        conn: u16,
        trans: u32,
        hdl: Handle,
        rsp: std::result::Result<&[u8], ErrorCode>,
    ) -> std::result::Result<(), Status>;
}

/// GATT attribute server. Owns the configuration, the lifecycle state, and
/// the per-activation table and handle index; every operation goes through
/// this context object.
#[derive(Debug)]
pub struct Server<S> {
    stack: S,
    cfg: Arc<DeviceConfig>,
    state: State,
    table: Option<AttrTable>,
    index: Option<HandleIndex>,
    pending_services: usize,
}

impl<S: Stack> Server<S> {
    /// Creates a new unregistered server for `cfg`.
    #[inline]
    pub fn new(stack: S, cfg: Arc<DeviceConfig>) -> Self {
        Self {
            stack,
            cfg,
            state: State::Unregistered,
            table: None,
            index: None,
            pending_services: 0,
        }
    }

    /// Returns the current lifecycle state.
    #[inline(always)]
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Returns the device configuration, shared read-only with the
    /// advertising collaborator.
    #[inline(always)]
    #[must_use]
    pub const fn config(&self) -> &Arc<DeviceConfig> {
        &self.cfg
    }

    /// Issues one-time profile registration. Valid only while unregistered;
    /// re-registering an active server is rejected.
    pub fn register(&mut self) -> Result<()> {
        if self.state != State::Unregistered {
            return Err(self.reject("register"));
        }
        self.stack.register_profile(PROFILE_ID)?;
        self.state = State::Registering;
        Ok(())
    }

    /// Requests teardown of a ready server. The index and table are released
    /// once the stack confirms with [`Event::Unregistered`].
    pub fn unregister(&mut self) -> Result<()> {
        if self.state != State::Ready {
            return Err(self.reject("unregister"));
        }
        self.stack.unregister_profile(PROFILE_ID)?;
        self.state = State::Unregistering;
        Ok(())
    }

    /// Processes one stack notification to completion.
    ///
    /// Per-request failures (unknown handle, callback error) are logged and
    /// isolated to that request. Integrity failures and illegal transitions
    /// are returned and leave the state unchanged, halting further lifecycle
    /// progress.
    pub fn handle_event(&mut self, evt: Event) -> Result<()> {
        use {Event::*, State::*};
        match (self.state, evt) {
            (Registering, Registered { status }) => {
                status.ok()?;
                self.submit_table()
            }
            (AwaitingTableCreation, TableCreated { status, handles }) => {
                status.ok()?;
                self.start_services(handles)
            }
            (StartingServices, ServiceStarted { status, hdl }) => {
                status.ok()?;
                debug!("Service at handle {hdl:#06X} started");
                self.pending_services = self.pending_services.saturating_sub(1);
                if self.pending_services == 0 {
                    self.state = Ready;
                    info!("Server ready");
                }
                Ok(())
            }
            (Ready, Read {
                conn,
                trans,
                hdl,
                capacity,
            }) => {
                if let Err(e) = self.on_read(conn, trans, hdl, capacity) {
                    warn!("Read for handle {hdl:#06X} dropped: {e}");
                }
                Ok(())
            }
            (Ready, Write { hdl, value }) => {
                if let Err(e) = self.on_write(hdl, value) {
                    warn!("Write for handle {hdl:#06X} dropped: {e}");
                }
                Ok(())
            }
            (Ready, Connected { conn }) => {
                info!("Peer connected (conn {conn})");
                Ok(())
            }
            (Ready, Disconnected { conn, reason }) => {
                info!("Peer disconnected (conn {conn}, reason {reason:#04X})");
                Ok(())
            }
            (Unregistering, Event::Unregistered) => {
                self.index = None;
                self.table = None;
                self.pending_services = 0;
                self.state = State::Unregistered;
                info!("Server unregistered");
                Ok(())
            }
            (_, evt) => Err(self.reject(evt.name())),
        }
    }

    /// Builds the attribute table and submits it to the stack.
    fn submit_table(&mut self) -> Result<()> {
        let table = AttrTable::build(&self.cfg)?;
        self.stack.create_attr_table(&table, INSTANCE_ID)?;
        self.table = Some(table);
        self.state = State::AwaitingTableCreation;
        Ok(())
    }

    /// Builds the handle index from the assigned range and starts each
    /// service at its declaration handle.
    fn start_services(&mut self, handles: &[u16]) -> Result<()> {
        let index = HandleIndex::from_handles(&self.cfg, handles)?;
        self.pending_services = index.service_handles().len();
        for &hdl in index.service_handles() {
            debug!("Starting service at {hdl}");
            self.stack.start_service(hdl)?;
        }
        self.index = Some(index);
        self.state = State::StartingServices;
        Ok(())
    }

    /// Read dispatch: resolves the characteristic, runs its callback into a
    /// response buffer capped at the configured value size, and relays the
    /// result tagged with the originating handle. Callback failures are
    /// propagated to the peer as a protocol error response.
    fn on_read(&mut self, conn: u16, trans: u32, hdl: u16, capacity: u16) -> Result<()> {
        let hdl = Handle::new(hdl).ok_or(Error::UnknownHandle(hdl))?;
        let chr = self.index()?.get(hdl)?.clone();
        let cap = usize::from(chr.size().min(capacity));
        let mut req = ReadReq::new(hdl, cap);
        match chr.io().exec(IoReq::Read(&mut req)) {
            Ok(()) => {
                let val = req.into_value();
                self.stack.read_response(conn, trans, hdl, Ok(val.as_ref()))?;
                Ok(())
            }
            Err(e) => {
                self.stack.read_response(conn, trans, hdl, Err(e))?;
                Err(Error::Callback(e))
            }
        }
    }

    /// Write dispatch: resolves the characteristic and hands the payload to
    /// its callback verbatim. No acknowledgement is generated here.
    fn on_write(&mut self, hdl: u16, value: &[u8]) -> Result<()> {
        let hdl = Handle::new(hdl).ok_or(Error::UnknownHandle(hdl))?;
        let chr = self.index()?.get(hdl)?;
        let req = WriteReq { hdl, val: value };
        chr.io().exec(IoReq::Write(&req))?;
        Ok(())
    }

    /// Returns the active handle index.
    fn index(&self) -> Result<&HandleIndex> {
        (self.index.as_ref()).ok_or(Error::InvalidTransition {
            state: self.state,
            event: "dispatch",
        })
    }

    /// Logs and returns an illegal transition error.
    fn reject(&self, event: &'static str) -> Error {
        warn!("Rejected {event} event in {:?} state", self.state);
        Error::InvalidTransition {
            state: self.state,
            event,
        }
    }
}
