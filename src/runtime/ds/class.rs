//! The class factory.
//!
//! A class is a module with instantiation semantics. Its instance methods live
//! on the class module, which always includes `Kernel` and, for subclasses,
//! the parent's class module. Class-level behavior ("statics") lives on a
//! separate meta-module that includes the parent's meta-module, so statics
//! are inherited and can call super the same way instance methods do.
//!
//! ```text
//!   Widget            module: [Kernel, Widget]        meta: [Kernel, #<Class:Widget>]
//!   Button < Widget   module: [Kernel, Widget, Button] meta: [Kernel, #<Class:Widget>, #<Class:Button>]
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::method::{Includable, Members, MethodDef};
use crate::runtime::ds::module::Module;
use crate::runtime::ds::object::Object;
use crate::runtime::ds::value::Value;
use crate::runtime::std_lib::kernel::kernel;

pub(crate) struct ClassData {
    parent: Option<Class>,
    meta: Module,
}

#[derive(Clone)]
pub struct Class {
    module: Module,
    data: Rc<ClassData>,
}

impl Class {
    /// `defineClass(name, parent, members)`.
    pub fn define(name: &str, parent: Option<&Class>, members: Members) -> Result<Class, ModelError> {
        let meta = Module::new(&format!("#<Class:{}>", name));
        match parent {
            Some(p) => meta.attach(p.meta())?,
            None => meta.attach(&kernel())?,
        };
        meta.resolve()?;

        let data = Rc::new(ClassData {
            parent: parent.cloned(),
            meta: meta.clone(),
        });
        let module = Module::with_class(name, data.clone());
        module.install_receiver(Object::new_entity(&module, meta));
        module.attach(&kernel())?;
        if let Some(p) = parent {
            module.attach(p.module())?;
        }
        module.include(members, false)?;

        let class = Class { module, data };
        debug!(
            target: "mixin::class",
            class = name,
            parent = %parent.map(|p| p.name()).unwrap_or_default(),
            "defined"
        );
        if let Some(p) = parent {
            p.module().run_hook("inherited", Value::Class(class.clone()))?;
        }
        Ok(class)
    }

    pub(crate) fn from_parts(module: Module, data: Rc<ClassData>) -> Class {
        Class { module, data }
    }

    pub fn name(&self) -> String {
        self.module.name()
    }

    /// The module holding this class's instance methods.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The module holding this class's statics.
    pub fn meta(&self) -> &Module {
        &self.data.meta
    }

    pub fn superclass(&self) -> Option<Class> {
        self.data.parent.clone()
    }

    /// This class followed by its ancestors along the parent chain.
    pub fn lineage(&self) -> Vec<Class> {
        let mut chain = vec![self.clone()];
        let mut current = self.superclass();
        while let Some(c) = current {
            current = c.superclass();
            chain.push(c);
        }
        chain
    }

    /// The receiver for class-level calls.
    pub fn object(&self) -> Result<Object, ModelError> {
        self.module.object()
    }

    /// Instantiate: run `initialize` if any definition of it is reachable and
    /// return the object it produced, or the new instance when it produced
    /// something other than an object.
    pub fn new_instance(&self, args: Vec<Value>) -> Result<Object, ModelError> {
        let instance = Object::new_instance(self);
        if instance.responds_to("initialize") {
            if let Value::Object(o) = instance.call("initialize", args)? {
                return Ok(o);
            }
        }
        Ok(instance)
    }

    pub fn include<I: Into<Includable>>(&self, target: I) -> Result<(), ModelError> {
        self.module.include(target, false)
    }

    /// Add class-level behavior.
    pub fn extend<I: Into<Includable>>(&self, target: I) -> Result<(), ModelError> {
        self.object()?.extend(target)
    }

    /// Call a static.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, ModelError> {
        self.object()?.call(name, args)
    }

    pub fn includes(&self, module: &Module) -> bool {
        self.module.includes(module)
    }

    pub fn instance_method(&self, name: &str) -> Result<Option<Rc<MethodDef>>, ModelError> {
        self.module.instance_method(name)
    }

    pub fn ancestors(&self) -> Result<Vec<Module>, ModelError> {
        self.module.ancestors()
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module
    }
}
impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module.name())
    }
}
impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.module.name())
    }
}

/// Define a one-off class and return its only instance.
pub fn singleton(name: &str, parent: Option<&Class>, members: Members) -> Result<Object, ModelError> {
    Class::define(name, parent, members)?.new_instance(Vec::new())
}
