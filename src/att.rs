//! Attribute-level primitives shared by table construction and request
//! routing.

pub use {consts::*, handle::*};

mod consts;
mod handle;
