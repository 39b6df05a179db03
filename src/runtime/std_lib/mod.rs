//! Built-in modules.
//!
//! `Kernel` is the only module every class is forced to include. Its methods
//! are ordinary members, so classes may override them and reach the built-in
//! version through super.

pub mod kernel;

pub use kernel::kernel;
