//! Core data structures of the object model.

pub mod class;
pub mod dispatch;
pub mod error;
pub mod method;
pub mod module;
pub mod object;
pub mod value;
