//! Method definitions and member bundles.
//!
//! A [`Members`] value is the plain-object form of a module body: named
//! methods and values plus nested `include`/`extend` requests. It is built with
//! chained calls, in the same way built-in objects are assembled:
//!
//! ```
//! use mixin_engine::runtime::ds::method::Members;
//! use mixin_engine::runtime::ds::value::Value;
//!
//! let members = Members::new()
//!     .method("get_label", |_this, _args| Ok(Value::from("base")))
//!     .value("kind", Value::from("label"));
//! assert_eq!(members.len(), 2);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::runtime::ds::class::Class;
use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::module::{Module, WeakModule};
use crate::runtime::ds::object::Object;
use crate::runtime::ds::value::{MethodFn, NativeFunction, Value};

/// A method as stored in a module's own members.
pub struct MethodDef {
    owner: WeakModule,
    name: String,
    implementation: MethodFn,
    calls_super: bool,
}
impl MethodDef {
    pub(crate) fn new(owner: WeakModule, name: &str, implementation: MethodFn, calls_super: bool) -> Self {
        MethodDef {
            owner,
            name: name.to_string(),
            implementation,
            calls_super,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module this definition belongs to, if it is still alive.
    pub fn owner(&self) -> Option<Module> {
        self.owner.upgrade()
    }

    pub fn owner_name(&self) -> String {
        match self.owner.upgrade() {
            Some(m) => m.name(),
            None => "<dropped>".to_string(),
        }
    }

    /// Whether the definition was declared with super support.
    pub fn calls_super(&self) -> bool {
        self.calls_super
    }

    pub(crate) fn implementation(&self) -> MethodFn {
        self.implementation.clone()
    }

    pub fn call(&self, this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
        (self.implementation)(this, args)
    }
}
impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodDef({}#{})", self.owner_name(), self.name)
    }
}

/// An entry in a module's own member table.
#[derive(Clone)]
pub enum Member {
    Method(Rc<MethodDef>),
    Value(Value),
}

pub(crate) enum MemberDef {
    Method { func: MethodFn, calls_super: bool },
    Value(Value),
}

/// Anything that can be handed to `include`/`extend`.
pub enum Includable {
    Module(Module),
    Members(Members),
}
impl From<Module> for Includable {
    fn from(m: Module) -> Self {
        Includable::Module(m)
    }
}
impl From<&Module> for Includable {
    fn from(m: &Module) -> Self {
        Includable::Module(m.clone())
    }
}
impl From<&Class> for Includable {
    fn from(c: &Class) -> Self {
        Includable::Module(c.module().clone())
    }
}
impl From<Members> for Includable {
    fn from(m: Members) -> Self {
        Includable::Members(m)
    }
}

/// The body of a module or class definition.
pub struct Members {
    pub(crate) entries: Vec<(String, MemberDef)>,
    pub(crate) includes: Vec<Includable>,
    pub(crate) extends: Vec<Includable>,
}
impl Members {
    pub fn new() -> Self {
        Members {
            entries: Vec::new(),
            includes: Vec::new(),
            extends: Vec::new(),
        }
    }

    /// A method that does not reach for super.
    pub fn method<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> Result<Value, ModelError> + 'static,
    {
        self.entries.push((
            name.to_string(),
            MemberDef::Method {
                func: Rc::new(func),
                calls_super: false,
            },
        ));
        self
    }

    /// A method that may call `this.call_super(..)`.
    pub fn super_method<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> Result<Value, ModelError> + 'static,
    {
        self.entries.push((
            name.to_string(),
            MemberDef::Method {
                func: Rc::new(func),
                calls_super: true,
            },
        ));
        self
    }

    /// A plain callable, copied as a non-dispatching member.
    pub fn function<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> Result<Value, ModelError> + 'static,
    {
        let value = Value::Function(NativeFunction::new(name, func));
        self.entries.push((name.to_string(), MemberDef::Value(value)));
        self
    }

    pub fn value(mut self, name: &str, value: Value) -> Self {
        self.entries.push((name.to_string(), MemberDef::Value(value)));
        self
    }

    pub fn include<I: Into<Includable>>(mut self, target: I) -> Self {
        self.includes.push(target.into());
        self
    }

    pub fn extend<I: Into<Includable>>(mut self, target: I) -> Self {
        self.extends.push(target.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.includes.is_empty() && self.extends.is_empty()
    }
}
impl Default for Members {
    fn default() -> Self {
        Self::new()
    }
}
