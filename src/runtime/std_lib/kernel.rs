//! Kernel built-in.
//!
//! Provides the baseline capabilities every object answers to.

use std::rc::Rc;

use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::module::Module;
use crate::runtime::ds::object::Object;
use crate::runtime::ds::value::Value;

thread_local! {
    static KERNEL: Module = build();
}

/// The shared `Kernel` module of the current thread.
pub fn kernel() -> Module {
    KERNEL.with(|k| k.clone())
}

fn build() -> Module {
    let kernel = Module::new("Kernel");
    kernel.define_native("is_a", Rc::new(kernel_is_a));
    kernel.define_native("extend", Rc::new(kernel_extend));
    kernel.define_native("equals", Rc::new(kernel_equals));
    kernel.define_native("hash", Rc::new(kernel_hash));
    kernel.define_native("respond_to", Rc::new(kernel_respond_to));
    kernel.define_native("methods", Rc::new(kernel_methods));
    kernel.define_native("to_string", Rc::new(kernel_to_string));
    kernel
}

fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}

/// Kernel#is_a
fn kernel_is_a(this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
    match first_arg(args).as_module() {
        Some(m) => Ok(Value::Boolean(this.is_a(&m))),
        None => Err(ModelError::TypeError(
            "is_a expects a module or a class".to_string(),
        )),
    }
}

/// Kernel#extend
fn kernel_extend(this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
    match first_arg(args).as_module() {
        Some(m) => {
            this.extend(&m)?;
            Ok(Value::Object(this.clone()))
        }
        None => Err(ModelError::TypeError(
            "extend expects a module or a class".to_string(),
        )),
    }
}

/// Kernel#equals
fn kernel_equals(this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
    Ok(Value::Boolean(
        first_arg(args) == Value::Object(this.clone()),
    ))
}

/// Kernel#hash
fn kernel_hash(this: &Object, _args: Vec<Value>) -> Result<Value, ModelError> {
    Ok(Value::String(this.id().to_string()))
}

/// Kernel#respond_to
fn kernel_respond_to(this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
    match first_arg(args) {
        Value::String(name) => Ok(Value::Boolean(this.responds_to(&name))),
        other => Err(ModelError::TypeError(format!(
            "respond_to expects a method name, got {}",
            other.type_name()
        ))),
    }
}

/// Kernel#methods
fn kernel_methods(this: &Object, _args: Vec<Value>) -> Result<Value, ModelError> {
    Ok(Value::List(
        this.methods().into_iter().map(Value::String).collect(),
    ))
}

/// Kernel#to_string
fn kernel_to_string(this: &Object, _args: Vec<Value>) -> Result<Value, ModelError> {
    Ok(Value::String(this.to_string()))
}
