//! Shared I/O helpers.

pub mod io;
