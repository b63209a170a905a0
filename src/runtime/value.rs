//! JavaScript value types
//!
//! This module defines the runtime representation of the values that flow
//! through the iterator helpers: primitives, plain objects, arrays, native
//! functions, promises and helper objects.

use super::async_iterator::AsyncIteratorHelper;
use super::promise::Promise;
use crate::error::{messages, Error, Result};
use rustc_hash::FxHashMap as HashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Property key standing in for `Symbol.iterator`
pub const SYMBOL_ITERATOR: &str = "@@iterator";
/// Property key standing in for `Symbol.asyncIterator`
pub const SYMBOL_ASYNC_ITERATOR: &str = "@@asyncIterator";

/// Type alias for native function implementations
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A JavaScript value
#[derive(Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Object (includes arrays, functions, promises, helpers)
    Object(Rc<RefCell<Object>>),
}

/// A heap object
pub struct Object {
    /// What kind of object this is
    pub kind: ObjectKind,
    /// Own properties
    pub properties: HashMap<String, Value>,
}

/// Object variants
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Array with its elements
    Array(Vec<Value>),
    /// Function implemented in Rust
    NativeFunction { name: String, func: NativeFn },
    /// Promise
    Promise(Promise),
    /// Object produced by map/filter/take/drop/flatMap/indexed
    AsyncIteratorHelper(AsyncIteratorHelper),
}

impl Object {
    /// Create an object of the given kind with no properties
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: HashMap::default(),
        }
    }
}

impl Value {
    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is nullish (null or undefined)
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if value can be called
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::NativeFunction { .. }),
            _ => false,
        }
    }

    /// Convert to boolean (truthiness)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Convert to number
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    match trimmed {
                        "Infinity" | "+Infinity" => f64::INFINITY,
                        "-Infinity" => f64::NEG_INFINITY,
                        _ => trimmed.parse().unwrap_or(f64::NAN),
                    }
                }
            }
            Value::Object(_) => f64::NAN,
        }
    }

    /// ToIntegerOrInfinity: truncate toward zero, NaN becomes 0
    pub fn to_integer_or_infinity(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else if n.is_infinite() {
            n
        } else {
            // `+ 0.0` folds -0 into +0
            n.trunc() + 0.0
        }
    }

    /// Convert to JavaScript string representation
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(true) => "true".to_string(),
            Value::Boolean(false) => "false".to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Array(arr) => {
                        let elements: Vec<String> = arr.iter().map(|v| v.to_js_string()).collect();
                        elements.join(",")
                    }
                    ObjectKind::NativeFunction { name, .. } => format!("[Native: {}]", name),
                    ObjectKind::Promise(_) => "[object Promise]".to_string(),
                    ObjectKind::AsyncIteratorHelper(_) => "[object Async Iterator Helper]".to_string(),
                    ObjectKind::Ordinary => "[object Object]".to_string(),
                }
            }
        }
    }

    /// Get the typeof string
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // Historical quirk
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) if self.is_callable() => "function",
            Value::Object(_) => "object",
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Create a new empty object
    pub fn new_object() -> Self {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Ordinary))))
    }

    /// Create a new object with the given properties
    pub fn new_object_with_properties(properties: HashMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(Object {
            kind: ObjectKind::Ordinary,
            properties,
        })))
    }

    /// Create a new array
    pub fn new_array(elements: Vec<Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::Array(elements)))))
    }

    /// Wrap a Rust closure as a callable value
    pub fn native_function(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Value::Object(Rc::new(RefCell::new(Object::new(ObjectKind::NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        }))))
    }

    /// Call this value as a function
    ///
    /// The object borrow is released before the native code runs, so the
    /// callee is free to touch the function object again.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let func = match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::NativeFunction { func, .. } => Some(func.clone()),
                _ => None,
            },
            _ => None,
        };
        match func {
            Some(func) => func(args),
            None => Err(Error::type_error(messages::not_a_function(&self.to_js_string()))),
        }
    }

    /// Read an own property; absent properties and primitives yield `undefined`
    pub fn get_property(&self, key: &str) -> Value {
        match self {
            Value::Object(obj) => obj.borrow().properties.get(key).cloned().unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        }
    }

    /// Write an own property (no-op on primitives)
    pub fn set_property(&self, key: &str, value: Value) {
        if let Value::Object(obj) = self {
            obj.borrow_mut().properties.insert(key.to_string(), value);
        }
    }

    /// The promise behind this value, if it is a promise object
    pub fn as_promise(&self) -> Option<Promise> {
        match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Promise(promise) => Some(promise.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The helper behind this value, if it is a helper object
    pub fn as_async_iterator_helper(&self) -> Option<AsyncIteratorHelper> {
        match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::AsyncIteratorHelper(helper) => Some(helper.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Snapshot of the elements, if this is an array
    pub fn array_elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Array(elements) => Some(elements.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Check if this is an array
    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Array(_)),
            _ => false,
        }
    }

    /// Convert to a JSON value for display and the CLI's `--json` output
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Array(elements) => {
                        serde_json::Value::Array(elements.iter().map(Value::to_json).collect())
                    }
                    ObjectKind::Ordinary => {
                        let map = obj
                            .properties
                            .iter()
                            .map(|(k, v)| (k.clone(), v.to_json()))
                            .collect::<serde_json::Map<_, _>>();
                        serde_json::Value::Object(map)
                    }
                    _ => serde_json::Value::String(self.to_js_string()),
                }
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
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

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        promise.to_value()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Object(obj) => {
                let obj = obj.borrow();
                match &obj.kind {
                    ObjectKind::Ordinary => {
                        let mut keys: Vec<_> = obj.properties.keys().collect();
                        keys.sort();
                        write!(f, "{{")?;
                        for (i, key) in keys.into_iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}: {:?}", key, obj.properties[key])?;
                        }
                        write!(f, "}}")
                    }
                    ObjectKind::Array(arr) => write!(f, "{:?}", arr),
                    ObjectKind::NativeFunction { name, .. } => write!(f, "[Native: {}]", name),
                    ObjectKind::Promise(promise) => write!(f, "Promise {{ {:?} }}", promise.state()),
                    ObjectKind::AsyncIteratorHelper(_) => write!(f, "[Async Iterator Helper]"),
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}
