//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use mixin_engine::runtime::{Members, ModelError, Module, Object, Value};

/// Route engine events to the test output. Safe to call from every test.
pub fn init_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Records which implementations ran, in order.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        CallLog::default()
    }

    pub fn record(&self, entry: &str) {
        self.0.borrow_mut().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub fn call(obj: &Object, name: &str) -> Result<Value, ModelError> {
    obj.call(name, Vec::new())
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|i| Value::from(*i)).collect()
}

pub fn names(modules: &[Module]) -> Vec<String> {
    modules.iter().map(|m| m.name()).collect()
}

/// A module whose `f` records `name` and, unless it is the bottom of a chain,
/// continues with super.
pub fn chain_link(name: &str, log: &CallLog, calls_super: bool) -> Members {
    let log = log.clone();
    let label = name.to_string();
    if calls_super {
        Members::new().super_method("f", move |this, _args| {
            log.record(&label);
            this.call_super(Vec::new())
        })
    } else {
        Members::new().method("f", move |_this, _args| {
            log.record(&label);
            Ok(Value::Undefined)
        })
    }
}
