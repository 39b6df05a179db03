//! The mixin runtime: modules, classes, objects and dispatch.

pub mod config;
pub mod ds;
pub mod std_lib;

pub use ds::class::{singleton, Class};
pub use ds::error::ModelError;
pub use ds::method::{Includable, Members};
pub use ds::module::Module;
pub use ds::object::Object;
pub use ds::value::Value;
