//! # mixin-engine - Ruby-style mixins for Rust
//!
//! A runtime object model where behavior is composed from modules:
//! - Modules that include other modules, with a deterministic linearization
//! - Classes built on modules, with single inheritance and inherited statics
//! - Per-object extension through personal (eigen) modules
//! - A `super` chain that walks every definition of a method, most-derived first
//! - Dispatch tables that are rebuilt whenever an ancestor gains a module
//!
//! ## Quick Start
//!
//! ```
//! use mixin_engine::runtime::{Class, Members, Module, Value};
//!
//! let named = Module::define(
//!     "Named",
//!     Members::new().super_method("label", |this, _args| {
//!         let base = this.call_super(Vec::new())?;
//!         Ok(Value::from(format!("named {}", base)))
//!     }),
//! )
//! .unwrap();
//!
//! let widget = Class::define(
//!     "Widget",
//!     None,
//!     Members::new()
//!         .method("label", |_this, _args| Ok(Value::from("widget")))
//!         .include(&named),
//! )
//! .unwrap();
//!
//! let w = widget.new_instance(Vec::new()).unwrap();
//! assert_eq!(w.call("label", Vec::new()).unwrap(), Value::from("widget"));
//! ```
//!
//! Members listed in a body are defined on the class itself, so `Widget#label`
//! wins over `Named#label` above. Including `Named` afterwards does not change
//! that; the class is always the most-derived entry of its own ancestry.
//!
//! ## Dispatch
//!
//! Every module keeps a dispatch table compiled from its ancestors. Calling a
//! method on an object consults the table of the object's eigenmodule, or of
//! its class when it has none. See [`runtime::ds::dispatch`] for how `super`
//! walks the chain, and [`runtime::ds::module`] for linearization.
//!
//! ## Diagnostics
//!
//! Events are emitted through `tracing` under the `mixin::*` targets. The
//! [`runtime::config`] module controls collision warnings and call tracing.
//!
//! ## Architecture
//!
//! - **[`runtime::ds`]** - Data structures (modules, classes, objects, values)
//! - **[`runtime::std_lib`]** - Built-in modules (`Kernel`)
//! - **[`runtime::config`]** - Engine configuration

#[macro_use]
extern crate lazy_static;

pub mod runtime;
