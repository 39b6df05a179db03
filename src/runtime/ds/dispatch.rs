//! Dispatch tables and the super chain.
//!
//! Every method member is installed on its host's [`DispatchTable`] as a
//! [`Dispatcher`]: the definition plus the host it was compiled for. Calling a
//! dispatcher looks up all definitions of the name on the host *at call time*,
//! pushes a [`SuperFrame`] onto the receiver's super stack and runs the
//! most-derived definition. While that frame is on top of the stack,
//! `receiver.call_super(..)` steps one definition towards the least-derived:
//!
//! ```text
//!   lookup(host, f) = [A.f, B.f, C.f]
//!                              ^ index 2, running
//!   call_super()     -> index 1, run B.f, index back to 2
//!     B.f: call_super() -> index 0, run A.f, index back to 1
//!       A.f: call_super() -> TypeError, nothing less derived
//! ```
//!
//! Each outer call owns its frame. A method that calls a different method on
//! the same receiver pushes a second frame on top; it is popped when that
//! call returns, so the outer chain continues where it left off.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{info, trace};

use crate::runtime::config;
use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::method::MethodDef;
use crate::runtime::ds::module::{Module, WeakModule};
use crate::runtime::ds::object::Object;
use crate::runtime::ds::value::Value;

/// What a host's table holds for a name.
#[derive(Clone)]
pub enum TargetEntry {
    Method(Rc<Dispatcher>),
    Value(Value),
}
impl TargetEntry {
    fn same_as(&self, other: &TargetEntry) -> bool {
        match (self, other) {
            (TargetEntry::Method(a), TargetEntry::Method(b)) => a.same_as(b),
            (TargetEntry::Value(a), TargetEntry::Value(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_callable(&self) -> bool {
        match self {
            TargetEntry::Method(_) => true,
            TargetEntry::Value(Value::Function(_)) => true,
            _ => false,
        }
    }
}

/// Name-to-entry table a host's receivers resolve calls through.
pub struct DispatchTable {
    entries: BTreeMap<String, TargetEntry>,
}
impl DispatchTable {
    pub fn new() -> Self {
        DispatchTable {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<TargetEntry> {
        self.entries.get(name).cloned()
    }

    /// Store `entry` under `name` unless an equivalent entry is already there.
    /// Returns whether the table changed.
    pub fn install(&mut self, name: &str, entry: TargetEntry) -> bool {
        if let Some(current) = self.entries.get(name) {
            if current.same_as(&entry) {
                return false;
            }
        }
        self.entries.insert(name.to_string(), entry);
        true
    }

    pub fn callable_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_callable())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A method definition compiled for a specific host.
pub struct Dispatcher {
    host: WeakModule,
    name: String,
    head: Rc<MethodDef>,
}

pub fn compile(def: &Rc<MethodDef>, host: &Module) -> Rc<Dispatcher> {
    Rc::new(Dispatcher {
        host: host.downgrade(),
        name: def.name().to_string(),
        head: def.clone(),
    })
}

impl Dispatcher {
    fn same_as(&self, other: &Dispatcher) -> bool {
        Rc::ptr_eq(&self.head, &other.head)
            && match (self.host.upgrade(), other.host.upgrade()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &Rc<MethodDef> {
        &self.head
    }

    pub fn invoke(&self, receiver: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
        let host = self.host.upgrade().ok_or_else(|| {
            ModelError::Destroyed(format!("host of `{}` was dropped", self.name))
        })?;
        let frame = if self.head.calls_super() {
            let mut methods = host.lookup(&self.name)?;
            // A table left stale by a suppressed resolve may hold a head that
            // is no longer the last definition; the chain starts at the head.
            match methods.iter().rposition(|m| Rc::ptr_eq(m, &self.head)) {
                Some(at) => methods.truncate(at + 1),
                None => methods = vec![self.head.clone()],
            }
            if methods.len() > 1 {
                trace!(
                    target: "mixin::dispatch",
                    method = %self.name,
                    depth = methods.len(),
                    "entering super chain"
                );
                SuperFrame::chain(&self.name, methods, args.clone())
            } else {
                SuperFrame::terminal(&self.name)
            }
        } else {
            SuperFrame::terminal(&self.name)
        };

        let traced = self.is_traced(&host);
        if traced {
            info!(
                target: "mixin::trace",
                "{}#{}({}) on {}",
                self.head.owner_name(),
                self.name,
                render_args(&args),
                receiver
            );
        }

        let result = {
            let _active = receiver.enter(frame);
            self.head.call(receiver, args)
        };

        if traced {
            match &result {
                Ok(v) => info!(target: "mixin::trace", "{}#{} returned {}", self.head.owner_name(), self.name, v),
                Err(e) => info!(target: "mixin::trace", "{}#{} failed: {}", self.head.owner_name(), self.name, e),
            }
        }
        result
    }

    fn is_traced(&self, host: &Module) -> bool {
        host.is_traced()
            || self.head.owner().map(|m| m.is_traced()).unwrap_or(false)
            || config::trace_all()
    }
}

fn render_args(args: &[Value]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<String>>()
        .join(", ")
}

/// The state of one active dispatch, as seen by `call_super`.
pub struct SuperFrame {
    name: String,
    methods: Vec<Rc<MethodDef>>,
    index: Cell<usize>,
    params: Vec<Value>,
}
impl SuperFrame {
    /// A frame with nothing below it: calling super fails.
    pub fn terminal(name: &str) -> Self {
        SuperFrame {
            name: name.to_string(),
            methods: Vec::new(),
            index: Cell::new(0),
            params: Vec::new(),
        }
    }

    pub fn chain(name: &str, methods: Vec<Rc<MethodDef>>, params: Vec<Value>) -> Self {
        let index = methods.len().saturating_sub(1);
        SuperFrame {
            name: name.to_string(),
            methods,
            index: Cell::new(index),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the next less-derived definition with `args`, missing trailing
    /// positions taken from the arguments of the dispatched call.
    pub fn step(&self, receiver: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
        let index = self.index.get();
        if index == 0 {
            return Err(ModelError::not_callable(&format!(
                "super in `{}` (no less-derived definition)",
                self.name
            )));
        }
        let params = self.pad(args);
        self.index.set(index - 1);
        let result = self.methods[index - 1].call(receiver, params);
        self.index.set(index);
        result
    }

    fn pad(&self, mut args: Vec<Value>) -> Vec<Value> {
        if args.len() < self.params.len() {
            args.extend_from_slice(&self.params[args.len()..]);
        }
        args
    }
}
