//! Receivers: class instances, class objects and module objects.
//!
//! An object resolves calls through its personal module (eigenmodule) when it
//! has one, and through its class's module otherwise. An instance's
//! eigenmodule is created on the first `extend` and includes the class module,
//! so extensions sit in front of the class and can reach it through super.
//! Class objects and module objects always have one: for a class it is the
//! meta-module holding the statics.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::runtime::config;
use crate::runtime::ds::class::Class;
use crate::runtime::ds::dispatch::{SuperFrame, TargetEntry};
use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::method::Includable;
use crate::runtime::ds::module::{Module, WeakModule};
use crate::runtime::ds::value::Value;

pub(crate) enum ObjectKind {
    Instance(Class),
    Entity(WeakModule),
}

pub struct ObjectBase {
    id: String,
    kind: ObjectKind,
    fields: RefCell<BTreeMap<String, Value>>,
    eigen: RefCell<Option<Module>>,
    super_stack: RefCell<Vec<Rc<SuperFrame>>>,
    destroyed: Cell<bool>,
}

#[derive(Clone)]
pub struct Object(Rc<ObjectBase>);

/// Keeps a super frame on the receiver's stack for the duration of a call.
pub(crate) struct ActiveFrame<'a> {
    stack: &'a RefCell<Vec<Rc<SuperFrame>>>,
}
impl<'a> Drop for ActiveFrame<'a> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl Object {
    fn build(kind: ObjectKind, eigen: Option<Module>) -> Self {
        Object(Rc::new(ObjectBase {
            id: Uuid::new_v4().to_hyphenated().to_string(),
            kind,
            fields: RefCell::new(BTreeMap::new()),
            eigen: RefCell::new(eigen),
            super_stack: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        }))
    }

    pub(crate) fn new_instance(class: &Class) -> Self {
        Object::build(ObjectKind::Instance(class.clone()), None)
    }

    pub(crate) fn new_entity(module: &Module, eigen: Module) -> Self {
        Object::build(ObjectKind::Entity(module.downgrade()), Some(eigen))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// The class this object is an instance of.
    pub fn class(&self) -> Option<Class> {
        match &self.0.kind {
            ObjectKind::Instance(c) => Some(c.clone()),
            ObjectKind::Entity(_) => None,
        }
    }

    /// The module this object stands for, when it is a module or class object.
    pub fn as_module(&self) -> Option<Module> {
        match &self.0.kind {
            ObjectKind::Instance(_) => None,
            ObjectKind::Entity(m) => m.upgrade(),
        }
    }

    pub fn as_class(&self) -> Option<Class> {
        self.as_module().and_then(|m| m.as_class())
    }

    pub fn eigen(&self) -> Option<Module> {
        self.0.eigen.borrow().clone()
    }

    fn dispatch_host(&self) -> Option<Module> {
        if let Some(eigen) = self.0.eigen.borrow().as_ref() {
            return Some(eigen.clone());
        }
        match &self.0.kind {
            ObjectKind::Instance(c) => Some(c.module().clone()),
            ObjectKind::Entity(_) => None,
        }
    }

    fn find(&self, name: &str) -> Option<TargetEntry> {
        self.dispatch_host().and_then(|host| host.target_entry(name))
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, ModelError> {
        match self.find(name) {
            Some(TargetEntry::Method(dispatcher)) => dispatcher.invoke(self, args),
            Some(TargetEntry::Value(Value::Function(f))) => f.call(self, args),
            Some(TargetEntry::Value(v)) => Err(ModelError::not_callable(&format!(
                "`{}` ({}) on {}",
                name,
                v.type_name(),
                self
            ))),
            None => Err(ModelError::no_method(&self.to_string(), name)),
        }
    }

    /// Invoke the next less-derived definition of the method currently being
    /// dispatched on this object. Arguments not supplied are taken from the
    /// same positions of the running call.
    pub fn call_super(&self, args: Vec<Value>) -> Result<Value, ModelError> {
        let frame = self.0.super_stack.borrow().last().cloned();
        match frame {
            Some(frame) => frame.step(self, args),
            None => Err(ModelError::not_callable(&format!(
                "super outside of a method dispatch on {}",
                self
            ))),
        }
    }

    pub(crate) fn enter(&self, frame: SuperFrame) -> ActiveFrame<'_> {
        self.0.super_stack.borrow_mut().push(Rc::new(frame));
        ActiveFrame {
            stack: &self.0.super_stack,
        }
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.find(name).map(|e| e.is_callable()).unwrap_or(false)
    }

    pub fn methods(&self) -> Vec<String> {
        match self.dispatch_host() {
            Some(host) => host.target_names(),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    /// An own field, or failing that a plain value member.
    pub fn get(&self, name: &str) -> Value {
        if let Some(v) = self.0.fields.borrow().get(name) {
            return v.clone();
        }
        match self.find(name) {
            Some(TargetEntry::Value(v)) => v,
            _ => Value::Undefined,
        }
    }

    pub fn set(&self, name: &str, value: Value) {
        self.0.fields.borrow_mut().insert(name.to_string(), value);
    }

    // ------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------

    /// Mix `target` into this object only.
    pub fn extend<I: Into<Includable>>(&self, target: I) -> Result<(), ModelError> {
        let eigen = self.ensure_eigen()?;
        match target.into() {
            Includable::Module(m) => {
                if eigen.attach(&m)? {
                    eigen.resolve()?;
                    m.run_hook("extended", Value::Object(self.clone()))?;
                }
                Ok(())
            }
            Includable::Members(members) => eigen.include(members, false),
        }
    }

    fn ensure_eigen(&self) -> Result<Module, ModelError> {
        if let Some(eigen) = self.0.eigen.borrow().as_ref() {
            return Ok(eigen.clone());
        }
        let class = match &self.0.kind {
            ObjectKind::Instance(c) => c.clone(),
            ObjectKind::Entity(m) => {
                return Err(ModelError::Destroyed(format!(
                    "module object of `{}` has no eigenmodule",
                    m.upgrade().map(|m| m.name()).unwrap_or_default()
                )))
            }
        };
        let eigen = Module::new(&format!("#<{}>", class.name()));
        eigen.attach(class.module())?;
        eigen.resolve()?;
        *self.0.eigen.borrow_mut() = Some(eigen.clone());
        debug!(target: "mixin::object", object = %self, "created eigenmodule");
        Ok(eigen)
    }

    /// Module-graph membership: true for the class chain and for anything
    /// included into the class or mixed into this object.
    pub fn is_a(&self, module: &Module) -> bool {
        if let Some(class) = self.class() {
            if class.lineage().iter().any(|c| c.module() == module) {
                return true;
            }
        }
        match self.dispatch_host() {
            Some(host) => host.includes(module),
            None => false,
        }
    }

    /// The native type check: follows the parent-class chain only.
    pub fn is_a_class(&self, class: &Class) -> bool {
        match self.class() {
            Some(own) => own.lineage().iter().any(|c| c == class),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Drop this object's fields and personal extensions.
    pub fn destroy(&self) {
        if self.0.destroyed.get() {
            if config::current().warn_on_double_destroy {
                warn!(target: "mixin::object", object = %self, "object already destroyed");
            }
            return;
        }
        self.0.fields.borrow_mut().clear();
        if let ObjectKind::Instance(_) = self.0.kind {
            *self.0.eigen.borrow_mut() = None;
        }
        self.0.destroyed.set(true);
        debug!(target: "mixin::object", object = %self, "destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ObjectKind::Instance(c) => write!(f, "#<{}:{}>", c.name(), &self.0.id[..8]),
            ObjectKind::Entity(m) => match m.upgrade() {
                Some(m) => write!(f, "{}", m.name()),
                None => write!(f, "#<dropped>"),
            },
        }
    }
}
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self)
    }
}
