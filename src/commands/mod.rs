//! Glue between the binaries and the library: load settings, wire the real
//! capabilities together, and report results through `ui`.

pub mod cleanup;
pub mod launch;
