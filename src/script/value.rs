//! Runtime values of the scripting language.

use crate::error::RuntimeError;
use crate::history::{HistoryEntry, SharedHistory};
use crate::registry::SharedRegistry;
use crate::script::builtin::BuiltinFunction;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// How many levels of nested lists equality and ordering will descend into.
pub const MAX_COMPARE_DEPTH: usize = 200;

/// A value bound in the shared namespace or produced by an expression.
///
/// Lists are reference types: two names bound to the same list observe each
/// other's mutations. `Players` and `History` are live views onto the session's
/// registry and log, not copies.
#[derive(Clone)]
pub enum Value {
    /// The "no value" sentinel. Submissions evaluating to it print nothing.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Builtin(&'static dyn BuiltinFunction),
    /// Names of the joined participants, in join order.
    Players(SharedRegistry),
    /// Every recorded submission, oldest first.
    History(SharedHistory),
    /// One history entry, exposing `author`, `code` and `time`.
    Entry(HistoryEntry),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Players(_) => "players",
            Value::History(_) => "history",
            Value::Entry(_) => "entry",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Builtin(_) | Value::Entry(_) => true,
            Value::Players(registry) => !registry.borrow().is_empty(),
            Value::History(history) => !history.borrow().is_empty(),
        }
    }

    /// Number of items for sized values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.borrow().len()),
            Value::Players(registry) => Some(registry.borrow().members().len()),
            Value::History(history) => Some(history.borrow().len()),
            _ => None,
        }
    }

    /// Snapshot of the items of an iterable value.
    pub fn iterate(&self) -> Result<Vec<Value>, RuntimeError> {
        match self {
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Players(registry) => Ok(registry
                .borrow()
                .members()
                .iter()
                .map(|name| Value::str(name.as_str()))
                .collect()),
            Value::History(history) => Ok(history
                .borrow()
                .entries()
                .iter()
                .cloned()
                .map(Value::Entry)
                .collect()),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Numeric view used by arithmetic; bools count as 0 and 1.
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    /// Loose equality: `1 == 1.0 == True`, lists compare element-wise.
    ///
    /// Lists nested past [`MAX_COMPARE_DEPTH`] compare unequal; use
    /// [`Value::try_equals`] to get the error instead.
    pub fn equals(&self, other: &Value) -> bool {
        self.try_equals(other).unwrap_or(false)
    }

    /// Equality that fails with [`RuntimeError::RecursionLimit`] on lists
    /// nested too deeply, including self-referencing ones.
    pub fn try_equals(&self, other: &Value) -> Result<bool, RuntimeError> {
        self.equals_at(other, 0)
    }

    fn equals_at(&self, other: &Value, depth: usize) -> Result<bool, RuntimeError> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            });
        }
        Ok(match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                if depth >= MAX_COMPARE_DEPTH {
                    return Err(RuntimeError::RecursionLimit);
                }
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals_at(y, depth + 1)? {
                        return Ok(false);
                    }
                }
                true
            }
            (Value::Builtin(a), Value::Builtin(b)) => a.name() == b.name(),
            (Value::Players(a), Value::Players(b)) => Rc::ptr_eq(a, b),
            (Value::History(a), Value::History(b)) => Rc::ptr_eq(a, b),
            (Value::Entry(a), Value::Entry(b)) => a == b,
            _ => false,
        })
    }

    /// Ordering for `<`, `<=`, `>`, `>=`, `min` and `max`.
    ///
    /// `Ok(None)` means the values are unordered (a NaN is involved); `op` only
    /// feeds the error message.
    pub fn try_cmp(&self, other: &Value, op: &str) -> Result<Option<Ordering>, RuntimeError> {
        self.cmp_at(other, op, 0)
    }

    fn cmp_at(
        &self,
        other: &Value,
        op: &str,
        depth: usize,
    ) -> Result<Option<Ordering>, RuntimeError> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
                _ => a.as_f64().partial_cmp(&b.as_f64()),
            });
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
            (Value::List(a), Value::List(b)) => {
                if depth >= MAX_COMPARE_DEPTH {
                    return Err(RuntimeError::RecursionLimit);
                }
                let (a, b) = (a.borrow(), b.borrow());
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals_at(y, depth + 1)? {
                        return x.cmp_at(y, op, depth + 1);
                    }
                }
                Ok(Some(a.len().cmp(&b.len())))
            }
            _ => Err(RuntimeError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op,
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// The representation shown inside containers and by `repr()`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<*const RefCell<Vec<Value>>>) {
        match self {
            Value::Str(s) => out.push_str(&quote(s)),
            Value::List(items) => {
                let ptr = Rc::as_ptr(items);
                if seen.contains(&ptr) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(ptr);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_repr(out, seen);
                }
                out.push(']');
                seen.pop();
            }
            Value::Players(registry) => {
                let names: Vec<String> =
                    registry.borrow().members().iter().map(|n| quote(n)).collect();
                out.push('[');
                out.push_str(&names.join(", "));
                out.push(']');
            }
            Value::History(history) => {
                let entries: Vec<String> = history
                    .borrow()
                    .entries()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                out.push('[');
                out.push_str(&entries.join(", "));
                out.push(']');
            }
            other => out.push_str(&other.to_string()),
        }
    }
}

/// Formats values the way `str()` and the session echo do: strings bare,
/// everything else as its representation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
            Value::Entry(entry) => write!(f, "{}", entry),
            Value::List(_) | Value::Players(_) | Value::History(_) => f.write_str(&self.repr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

/// `1.0` keeps its fractional part, non-finite values use lowercase names.
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let name = if x > 0.0 { "inf" } else { "-inf" };
        name.to_string()
    } else if x == x.trunc() && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Map a possibly negative index onto `0..len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}
