//! Serde `with` helpers for values whose text form must not depend on the host.

pub mod bytes;
pub mod date;
