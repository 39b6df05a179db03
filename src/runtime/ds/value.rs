use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runtime::ds::class::Class;
use crate::runtime::ds::error::ModelError;
use crate::runtime::ds::module::Module;
use crate::runtime::ds::object::Object;

/// Signature shared by method implementations and plain callable members.
///
/// The first argument is the receiver the call was dispatched on; inside a
/// method declared with super support, `receiver.call_super(..)` reaches the
/// next less-derived definition.
pub type MethodFn = Rc<dyn Fn(&Object, Vec<Value>) -> Result<Value, ModelError>>;

/// A callable stored as a plain (non-dispatching) value.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: MethodFn,
}
impl NativeFunction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Object, Vec<Value>) -> Result<Value, ModelError> + 'static,
    {
        NativeFunction {
            name: name.to_string(),
            func: Rc::new(func),
        }
    }

    pub fn call(&self, this: &Object, args: Vec<Value>) -> Result<Value, ModelError> {
        (self.func)(this, args)
    }
}
impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(NumberType),
    List(Vec<Value>),
    Function(NativeFunction),
    Object(Object),
    Module(Module),
    Class(Class),
}
impl Value {
    pub fn is_undefined(&self) -> bool {
        match self {
            Value::Undefined => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Number(NumberType::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The module a value designates when used as an `is_a`/`extend` argument.
    pub fn as_module(&self) -> Option<Module> {
        match self {
            Value::Module(m) => Some(m.clone()),
            Value::Class(c) => Some(c.module().clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
            Value::Module(_) => "module",
            Value::Class(_) => "class",
        }
    }
}
impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Null => Value::Null,
            Value::Boolean(b) => Value::Boolean(*b),
            Value::String(s) => Value::String(s.to_string()),
            Value::Number(n) => Value::Number(n.clone()),
            Value::List(l) => Value::List(l.clone()),
            Value::Function(f) => Value::Function(f.clone()),
            Value::Object(o) => Value::Object(o.clone()),
            Value::Module(m) => Value::Module(m.clone()),
            Value::Class(c) => Value::Class(c.clone()),
        }
    }
}
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::List(l) => write!(
                f,
                "[{}]",
                l.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Value::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name),
            Value::Object(o) => write!(f, "{}", o),
            Value::Module(m) => write!(f, "{}", m.name()),
            Value::Class(c) => write!(f, "{}", c.name()),
        }
    }
}
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Null => write!(f, "Value::Null"),
            Value::Boolean(b) => write!(f, "Value::Boolean({})", b),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::Number(n) => write!(f, "Value::Number({:?})", n),
            Value::List(l) => write!(f, "Value::List({:?})", l),
            Value::Function(func) => write!(f, "Value::Function({})", func.name),
            Value::Object(o) => write!(f, "Value::Object({})", o),
            Value::Module(m) => write!(f, "Value::Module({})", m.name()),
            Value::Class(c) => write!(f, "Value::Class({})", c.name()),
        }
    }
}
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            _ => false,
        }
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(NumberType::Integer(i))
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(NumberType::Float(n))
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberType {
    Integer(i64),
    Float(f64),
}
impl Display for NumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NumberType::Integer(i) => write!(f, "{}", i),
            NumberType::Float(n) => write!(f, "{}", n),
        }
    }
}
