//! Modules and their inclusion graph.
//!
//! A module owns a table of members and an ordered list of included modules.
//! Everything a caller can observe about dispatch is derived from that graph:
//!
//! ```text
//!   D includes [B, C], B includes [A], C includes [A]
//!
//!   ancestors(D) = [A, B, C, D]      included first, self last, no duplicates
//!   lookup(D, f) = definitions of f in that order
//!   target(D)[f] = dispatcher for the most-derived f
//! ```
//!
//! The derived tables (ancestor list, lookup cache, dispatch table) are cached
//! per module. Any new inclusion invalidates them on the mutated module and,
//! through the `dependents` back edges, on every module that includes it
//! directly or transitively. Recompilation happens before `include` returns.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::runtime::config;
use crate::runtime::ds::class::{Class, ClassData};
use crate::runtime::ds::dispatch::{compile, DispatchTable, TargetEntry};
use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::method::{Includable, Member, MemberDef, Members, MethodDef};
use crate::runtime::ds::object::Object;
use crate::runtime::ds::value::{MethodFn, Value};
use crate::runtime::std_lib::kernel::kernel;

pub(crate) struct ModuleInner {
    name: String,
    own_members: RefCell<BTreeMap<String, Member>>,
    includes: RefCell<Vec<Module>>,
    dependents: RefCell<Vec<WeakModule>>,
    ancestor_cache: RefCell<Option<Vec<Module>>>,
    lookup_cache: RefCell<Option<HashMap<String, Vec<Rc<MethodDef>>>>>,
    target: RefCell<DispatchTable>,
    receiver: RefCell<Option<Object>>,
    class: Option<Rc<ClassData>>,
    trace: Cell<bool>,
}

#[derive(Clone)]
pub struct Module(Rc<ModuleInner>);

#[derive(Clone)]
pub struct WeakModule(Weak<ModuleInner>);
impl WeakModule {
    pub fn upgrade(&self) -> Option<Module> {
        self.0.upgrade().map(Module)
    }
}

impl Module {
    /// An empty module with no members and no inclusions.
    pub fn new(name: &str) -> Self {
        Module::build(name, None)
    }

    /// `defineModule(name, members)`.
    pub fn define(name: &str, members: Members) -> Result<Self, ModelError> {
        let module = Module::new(name);
        module.include(members, false)?;
        Ok(module)
    }

    pub(crate) fn with_class(name: &str, class: Rc<ClassData>) -> Self {
        Module::build(name, Some(class))
    }

    fn build(name: &str, class: Option<Rc<ClassData>>) -> Self {
        Module(Rc::new(ModuleInner {
            name: name.to_string(),
            own_members: RefCell::new(BTreeMap::new()),
            includes: RefCell::new(Vec::new()),
            dependents: RefCell::new(Vec::new()),
            ancestor_cache: RefCell::new(None),
            lookup_cache: RefCell::new(None),
            target: RefCell::new(DispatchTable::new()),
            receiver: RefCell::new(None),
            class,
            trace: Cell::new(false),
        }))
    }

    pub fn name(&self) -> String {
        self.0.name.to_string()
    }

    pub fn downgrade(&self) -> WeakModule {
        WeakModule(Rc::downgrade(&self.0))
    }

    /// The class this module is the instance table of, if any.
    pub fn as_class(&self) -> Option<Class> {
        self.0
            .class
            .as_ref()
            .map(|data| Class::from_parts(self.clone(), data.clone()))
    }

    pub fn set_trace(&self, enabled: bool) {
        self.0.trace.set(enabled);
    }

    pub fn is_traced(&self) -> bool {
        self.0.trace.get()
    }

    // ------------------------------------------------------------------
    // Inclusion
    // ------------------------------------------------------------------

    /// Mix `target` into this module.
    ///
    /// `target` is either another module (added as an inclusion edge) or a
    /// [`Members`] bundle whose `extend`/`include` requests are processed first
    /// and whose named entries become own members of this module. Unless
    /// `suppress_resolve` is set, the dispatch tables of this module and of
    /// everything depending on it are rebuilt before returning.
    pub fn include<I: Into<Includable>>(
        &self,
        target: I,
        suppress_resolve: bool,
    ) -> Result<(), ModelError> {
        let mut included = Vec::new();
        match target.into() {
            Includable::Module(m) => {
                if self.attach(&m)? {
                    included.push(m);
                }
            }
            Includable::Members(members) => self.include_members(members, &mut included)?,
        }
        if !suppress_resolve {
            self.resolve()?;
        }
        for m in included {
            m.run_hook("included", Value::Module(self.clone()))?;
        }
        Ok(())
    }

    fn include_members(
        &self,
        members: Members,
        included: &mut Vec<Module>,
    ) -> Result<(), ModelError> {
        let Members {
            entries,
            includes,
            extends,
        } = members;
        for ext in extends {
            self.extend(ext)?;
        }
        for inc in includes {
            match inc {
                Includable::Module(m) => {
                    if self.attach(&m)? {
                        included.push(m);
                    }
                }
                Includable::Members(nested) => self.include_members(nested, included)?,
            }
        }
        for (name, def) in entries {
            self.define_member(&name, def, included)?;
        }
        Ok(())
    }

    /// Add the inclusion edge `self -> module` and its inverse.
    ///
    /// Returns `false` when the edge already exists. No resolution and no hooks.
    pub(crate) fn attach(&self, module: &Module) -> Result<bool, ModelError> {
        if module.reaches(self) {
            return Err(ModelError::CyclicInclusion {
                module: self.name(),
                included: module.name(),
            });
        }
        if self.0.includes.borrow().iter().any(|m| m == module) {
            return Ok(false);
        }
        self.0.includes.borrow_mut().push(module.clone());
        *self.0.ancestor_cache.borrow_mut() = None;
        *self.0.lookup_cache.borrow_mut() = None;

        let mut dependents = module.0.dependents.borrow_mut();
        dependents.retain(|d| d.upgrade().is_some());
        dependents.push(self.downgrade());
        Ok(true)
    }

    /// Whether `other` is this module or reachable through live inclusion
    /// edges. Ignores the ancestor cache, which a suppressed resolve leaves
    /// stale.
    fn reaches(&self, other: &Module) -> bool {
        let mut pending = vec![self.clone()];
        let mut seen: Vec<Module> = Vec::new();
        while let Some(current) = pending.pop() {
            if &current == other {
                return true;
            }
            if seen.iter().any(|m| m == &current) {
                continue;
            }
            pending.extend(current.0.includes.borrow().iter().cloned());
            seen.push(current);
        }
        false
    }

    fn define_member(
        &self,
        name: &str,
        def: MemberDef,
        included: &mut Vec<Module>,
    ) -> Result<(), ModelError> {
        let previous = self.0.own_members.borrow_mut().remove(name);
        if let Some(previous) = previous {
            // The earlier definition moves into its own module so the new one
            // can still reach it through super.
            let holder = Module::new(&format!(
                "{}#{}",
                self.name(),
                Uuid::new_v4().to_hyphenated().to_string()
            ));
            let moved = match previous {
                Member::Method(d) => Member::Method(Rc::new(MethodDef::new(
                    holder.downgrade(),
                    name,
                    d.implementation(),
                    d.calls_super(),
                ))),
                Member::Value(v) => Member::Value(v),
            };
            holder.insert_member(name, moved);
            if config::current().warn_on_collision {
                warn!(
                    target: "mixin::module",
                    module = %self.name(),
                    member = name,
                    holder = %holder.name(),
                    "member already defined, previous definition moved into a synthesized module"
                );
            }
            if self.attach(&holder)? {
                included.push(holder);
            }
        }
        let member = match def {
            MemberDef::Method { func, calls_super } => {
                Member::Method(Rc::new(MethodDef::new(self.downgrade(), name, func, calls_super)))
            }
            MemberDef::Value(v) => Member::Value(v),
        };
        self.insert_member(name, member);
        Ok(())
    }

    pub(crate) fn insert_member(&self, name: &str, member: Member) {
        self.0.own_members.borrow_mut().insert(name.to_string(), member);
    }

    pub(crate) fn define_native(&self, name: &str, func: MethodFn) {
        let def = MethodDef::new(self.downgrade(), name, func, false);
        self.insert_member(name, Member::Method(Rc::new(def)));
    }

    /// Mix `target` into this module's own receiver rather than its instances.
    pub fn extend<I: Into<Includable>>(&self, target: I) -> Result<(), ModelError> {
        self.object()?.extend(target)
    }

    /// The object this module answers to when it is itself the receiver of a
    /// call. For a class this is the class object carrying its statics.
    pub fn object(&self) -> Result<Object, ModelError> {
        if let Some(receiver) = self.0.receiver.borrow().as_ref() {
            return Ok(receiver.clone());
        }
        let eigen = Module::new(&format!("#<Module:{}>", self.name()));
        eigen.attach(&kernel())?;
        eigen.resolve()?;
        let receiver = Object::new_entity(self, eigen);
        *self.0.receiver.borrow_mut() = Some(receiver.clone());
        Ok(receiver)
    }

    pub(crate) fn install_receiver(&self, receiver: Object) {
        *self.0.receiver.borrow_mut() = Some(receiver);
    }

    /// Call `hook` on this module's receiver if it answers to it.
    pub(crate) fn run_hook(&self, hook: &str, arg: Value) -> Result<(), ModelError> {
        let receiver = self.0.receiver.borrow().clone();
        if let Some(receiver) = receiver {
            if receiver.responds_to(hook) {
                receiver.call(hook, vec![arg])?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ancestors and lookup
    // ------------------------------------------------------------------

    /// Every module reachable through inclusion, included first and self last.
    pub fn ancestors(&self) -> Result<Vec<Module>, ModelError> {
        if let Some(cached) = self.0.ancestor_cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let mut result = Vec::new();
        let mut visiting = Vec::new();
        self.collect_ancestors(&mut result, &mut visiting)?;
        *self.0.ancestor_cache.borrow_mut() = Some(result.clone());
        Ok(result)
    }

    fn collect_ancestors(
        &self,
        result: &mut Vec<Module>,
        visiting: &mut Vec<Module>,
    ) -> Result<(), ModelError> {
        if visiting.iter().any(|m| m == self) {
            return Err(ModelError::CyclicInclusion {
                module: visiting
                    .last()
                    .map(|m| m.name())
                    .unwrap_or_else(|| self.name()),
                included: self.name(),
            });
        }
        visiting.push(self.clone());
        let includes = self.0.includes.borrow().clone();
        for module in &includes {
            module.collect_ancestors(result, visiting)?;
        }
        visiting.pop();
        if !result.iter().any(|m| m == self) {
            result.push(self.clone());
        }
        Ok(())
    }

    /// All definitions of `name` across the ancestors, least-derived first.
    pub fn lookup(&self, name: &str) -> Result<Vec<Rc<MethodDef>>, ModelError> {
        if let Some(cache) = self.0.lookup_cache.borrow().as_ref() {
            if let Some(hit) = cache.get(name) {
                return Ok(hit.clone());
            }
        }
        let methods = self
            .ancestors()?
            .iter()
            .filter_map(|m| match m.0.own_members.borrow().get(name) {
                Some(Member::Method(def)) => Some(def.clone()),
                _ => None,
            })
            .collect::<Vec<Rc<MethodDef>>>();
        self.0
            .lookup_cache
            .borrow_mut()
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), methods.clone());
        Ok(methods)
    }

    /// The most-derived definition of `name`.
    pub fn instance_method(&self, name: &str) -> Result<Option<Rc<MethodDef>>, ModelError> {
        Ok(self.lookup(name)?.pop())
    }

    /// Names of all methods defined anywhere in the ancestry, sorted.
    pub fn instance_methods(&self) -> Result<Vec<String>, ModelError> {
        let mut names = Vec::new();
        for module in self.ancestors()? {
            for (name, member) in module.0.own_members.borrow().iter() {
                if let Member::Method(_) = member {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Whether `other` is this module or reachable from it through inclusion.
    pub fn includes(&self, other: &Module) -> bool {
        self.ancestors()
            .map(|ancestors| ancestors.iter().any(|m| m == other))
            .unwrap_or(false)
    }

    pub(crate) fn target_entry(&self, name: &str) -> Option<TargetEntry> {
        self.0.target.borrow().get(name)
    }

    pub(crate) fn target_names(&self) -> Vec<String> {
        self.0.target.borrow().callable_names()
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Drop derived tables here and on every dependent, then rebuild them.
    pub fn resolve(&self) -> Result<(), ModelError> {
        *self.0.ancestor_cache.borrow_mut() = None;
        *self.0.lookup_cache.borrow_mut() = None;

        self.0
            .dependents
            .borrow_mut()
            .retain(|d| d.upgrade().is_some());
        let dependents = self
            .0
            .dependents
            .borrow()
            .iter()
            .filter_map(|d| d.upgrade())
            .collect::<Vec<Module>>();
        debug!(
            target: "mixin::module",
            module = %self.name(),
            dependents = dependents.len(),
            "resolving"
        );
        for dependent in &dependents {
            dependent.resolve()?;
        }
        self.compile_target()
    }

    /// Install every member of every ancestor onto this module's target, in
    /// linearization order, so the most-derived definition of each name is
    /// the one left standing.
    fn compile_target(&self) -> Result<(), ModelError> {
        for module in self.ancestors()? {
            let members = module
                .0
                .own_members
                .borrow()
                .iter()
                .map(|(name, member)| (name.to_string(), member.clone()))
                .collect::<Vec<(String, Member)>>();
            for (name, member) in members {
                let entry = match member {
                    Member::Method(def) => TargetEntry::Method(compile(&def, self)),
                    Member::Value(v) => TargetEntry::Value(v),
                };
                self.0.target.borrow_mut().install(&name, entry);
            }
        }
        Ok(())
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module({})", self.0.name)
    }
}
