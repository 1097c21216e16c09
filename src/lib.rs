//! Declarative GATT services bridged onto an external BLE attribute server.
//!
//! The crate turns a human-authored service/characteristic configuration into
//! the flat, handle-addressed attribute table expected by an external
//! attribute-protocol stack, and routes inbound read/write traffic back to the
//! owning characteristic once the stack has assigned a handle range.

pub mod att;
pub mod gatt;
pub mod uuid;

/// Returns a string representation of the specified type.
macro_rules! name_of {
    ($t:ty) => {{
        // TODO: Switch to `std::any::type_name` when stabilized
        type _T = $t; // Allows $t to be recognized as a type for refactoring
        stringify!($t)
    }};
}
pub(crate) use name_of;
