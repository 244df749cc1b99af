//! Runtime values for the sandboxed interpreter

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::syntax::ast::{Param, Stmt};

/// A user function: parameters, body, and the verbatim source text it was
/// compiled from. The text is what the live/sync classification heuristic
/// inspects, mirroring the behavior of re-serializing the function.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub text: String,
}

/// The four runner primitives bound into every execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Task,
    Command,
    CommandLive,
    Runs,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Task => "task",
            Builtin::Command => "command",
            Builtin::CommandLive => "commandLive",
            Builtin::Runs => "runs",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Rc<FunctionValue>),
    Native(Builtin),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// String coercion used by template interpolation and `+`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Str(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(_) | Value::Native(_) => "[function]".to_string(),
        }
    }

    pub fn field(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        }
    }

    /// Strict equality: values of different types are never equal, and
    /// `null` / `undefined` are distinct.
    pub fn strictly_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Loose equality over the shapes config programs actually compare.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_the_source_language() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(!Value::Num(0.0).truthy());
        assert!(Value::Str("x".to_string()).truthy());
        assert!(Value::Object(Default::default()).truthy());
    }

    #[test]
    fn display_coercion_formats_whole_numbers_bare() {
        assert_eq!(Value::Num(3.0).to_display_string(), "3");
        assert_eq!(Value::Num(1.5).to_display_string(), "1.5");
    }

    #[test]
    fn strict_equality_requires_matching_types() {
        assert!(Value::Null.loosely_equals(&Value::Undefined));
        assert!(!Value::Null.strictly_equals(&Value::Undefined));
        assert!(!Value::Num(1.0).strictly_equals(&Value::Str("1".into())));
        assert!(Value::Str("a".into()).strictly_equals(&Value::Str("a".into())));
    }

    #[test]
    fn field_access_on_non_objects_is_undefined() {
        assert!(matches!(Value::Str("s".into()).field("x"), Value::Undefined));
    }
}
