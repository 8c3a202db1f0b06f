use crate::error::RuntimeError;
use crate::script::eval::{MAX_ITEMS, binary_op};
use crate::script::parser::BinaryOp;
use crate::script::value::{Number, Value};
use std::cmp::Ordering;
use std::io::Write;

/// Functions available to every script without being bound in the namespace.
///
/// Builtins are looked up after the namespace, so a participant can shadow
/// `len` with their own binding and `del len` brings the builtin back.
pub trait BuiltinFunction: Sync {
    /// Canonical name of the function, e.g. "print" or "len".
    fn name(&self) -> &'static str;

    /// Calls the function. `out` is the session output stream.
    fn call(&self, args: Vec<Value>, out: &mut dyn Write) -> Result<Value, RuntimeError>;
}

static BUILTINS: &[&dyn BuiltinFunction] = &[
    &Print, &Len, &Str, &Repr, &Int, &Float, &Bool, &Type, &Abs, &Min, &Max, &Sum, &Round,
    &Range, &List,
];

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS
        .iter()
        .find(|b| b.name() == name)
        .map(|b| Value::Builtin(*b))
}

/// Names of all builtins, in declaration order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name())
}

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), RuntimeError> {
    let given = args.len();
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let expected = if min == max {
        format!("exactly {}", min)
    } else if given < min {
        format!("at least {}", min)
    } else {
        format!("at most {}", max)
    };
    let plural = if min == max && min == 1 { "" } else { "s" };
    Err(RuntimeError::type_error(format!(
        "{}() takes {} argument{} ({} given)",
        name, expected, plural, given
    )))
}

fn expect_int(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

/// Truncate a float towards zero, failing for values outside the i64 range.
pub(crate) fn float_to_int(x: f64) -> Result<i64, RuntimeError> {
    if !x.is_finite() {
        return Err(RuntimeError::Value(format!(
            "cannot convert float {} to integer",
            crate::script::value::format_float(x)
        )));
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(RuntimeError::Overflow);
    }
    Ok(truncated as i64)
}

/// Items for `min`/`max`: a single iterable argument or the arguments themselves.
fn candidates(name: &str, args: Vec<Value>) -> Result<Vec<Value>, RuntimeError> {
    let items = match args.len() {
        0 => {
            return Err(RuntimeError::type_error(format!(
                "{}() expected at least 1 argument, got 0",
                name
            )));
        }
        1 => args[0].iterate()?,
        _ => args,
    };
    if items.is_empty() {
        return Err(RuntimeError::Value(format!(
            "{}() arg is an empty sequence",
            name
        )));
    }
    Ok(items)
}

fn extreme(name: &str, args: Vec<Value>, keep: Ordering) -> Result<Value, RuntimeError> {
    let mut items = candidates(name, args)?.into_iter();
    let mut best = items.next().unwrap_or(Value::None);
    let op = if keep == Ordering::Less { "<" } else { ">" };
    for item in items {
        if item.try_cmp(&best, op)? == Some(keep) {
            best = item;
        }
    }
    Ok(best)
}

/// Write the arguments to the session output, separated by spaces.
pub struct Print;

impl BuiltinFunction for Print {
    fn name(&self) -> &'static str {
        "print"
    }

    fn call(&self, args: Vec<Value>, out: &mut dyn Write) -> Result<Value, RuntimeError> {
        let line = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{}", line).map_err(|e| RuntimeError::Output(e.to_string()))?;
        Ok(Value::None)
    }
}

pub struct Len;

impl BuiltinFunction for Len {
    fn name(&self) -> &'static str {
        "len"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 1)?;
        let len = args[0].len().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                args[0].type_name()
            ))
        })?;
        i64::try_from(len)
            .map(Value::Int)
            .map_err(|_| RuntimeError::Overflow)
    }
}

pub struct Str;

impl BuiltinFunction for Str {
    fn name(&self) -> &'static str {
        "str"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 0, 1)?;
        Ok(Value::Str(
            args.first().map(ToString::to_string).unwrap_or_default(),
        ))
    }
}

pub struct Repr;

impl BuiltinFunction for Repr {
    fn name(&self) -> &'static str {
        "repr"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 1)?;
        Ok(Value::Str(args[0].repr()))
    }
}

pub struct Int;

impl BuiltinFunction for Int {
    fn name(&self) -> &'static str {
        "int"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 0, 1)?;
        let Some(value) = args.first() else {
            return Ok(Value::Int(0));
        };
        match value {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(x) => float_to_int(*x).map(Value::Int),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                RuntimeError::Value(format!(
                    "invalid literal for int() with base 10: {}",
                    value.repr()
                ))
            }),
            other => Err(RuntimeError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        }
    }
}

pub struct Float;

impl BuiltinFunction for Float {
    fn name(&self) -> &'static str {
        "float"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 0, 1)?;
        let Some(value) = args.first() else {
            return Ok(Value::Float(0.0));
        };
        if let Some(number) = value.as_number() {
            return Ok(Value::Float(number.as_f64()));
        }
        match value {
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                RuntimeError::Value(format!(
                    "could not convert string to float: {}",
                    value.repr()
                ))
            }),
            other => Err(RuntimeError::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        }
    }
}

pub struct Bool;

impl BuiltinFunction for Bool {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 0, 1)?;
        Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
    }
}

pub struct Type;

impl BuiltinFunction for Type {
    fn name(&self) -> &'static str {
        "type"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 1)?;
        Ok(Value::Str(format!("<class '{}'>", args[0].type_name())))
    }
}

pub struct Abs;

impl BuiltinFunction for Abs {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 1)?;
        match args[0].as_number() {
            Some(Number::Int(i)) => i
                .checked_abs()
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow),
            Some(Number::Float(x)) => Ok(Value::Float(x.abs())),
            None => Err(RuntimeError::type_error(format!(
                "bad operand type for abs(): '{}'",
                args[0].type_name()
            ))),
        }
    }
}

pub struct Min;

impl BuiltinFunction for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        extreme(self.name(), args, Ordering::Less)
    }
}

pub struct Max;

impl BuiltinFunction for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        extreme(self.name(), args, Ordering::Greater)
    }
}

/// `sum(iterable, start=0)`
pub struct Sum;

impl BuiltinFunction for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 2)?;
        let start = args.get(1).cloned().unwrap_or(Value::Int(0));
        if let Value::Str(_) = start {
            return Err(RuntimeError::type_error(
                "sum() can't sum strings [use ''.join(seq) instead]",
            ));
        }
        args[0]
            .iterate()?
            .into_iter()
            .try_fold(start, |acc, item| binary_op(BinaryOp::Add, &acc, &item))
    }
}

/// `round(x)` gives an int, `round(x, ndigits)` keeps the type of `x`.
/// Halves round to even.
pub struct Round;

impl BuiltinFunction for Round {
    fn name(&self) -> &'static str {
        "round"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 2)?;
        let number = args[0].as_number().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "type {} doesn't define __round__ method",
                args[0].type_name()
            ))
        })?;
        let ndigits = match args.get(1) {
            None | Some(Value::None) => None,
            Some(v) => Some(expect_int(v)?),
        };
        match (number, ndigits) {
            (Number::Int(i), None) => Ok(Value::Int(i)),
            (Number::Float(x), None) => float_to_int(x.round_ties_even()).map(Value::Int),
            (Number::Int(i), Some(n)) if n >= 0 => Ok(Value::Int(i)),
            (number, Some(n)) => {
                let rounded = round_to_digits(number.as_f64(), n);
                match number {
                    Number::Int(_) => float_to_int(rounded).map(Value::Int),
                    Number::Float(_) => Ok(Value::Float(rounded)),
                }
            }
        }
    }
}

fn round_to_digits(x: f64, ndigits: i64) -> f64 {
    // beyond this, 10^n is not representable and x is returned unchanged
    let exp = ndigits.clamp(-308, 308) as i32;
    if exp >= 0 {
        let scale = 10f64.powi(exp);
        let scaled = x * scale;
        if !scaled.is_finite() {
            return x;
        }
        scaled.round_ties_even() / scale
    } else {
        let scale = 10f64.powi(-exp);
        (x / scale).round_ties_even() * scale
    }
}

/// `range(stop)`, `range(start, stop[, step])`, materialized as a list.
pub struct Range;

impl BuiltinFunction for Range {
    fn name(&self) -> &'static str {
        "range"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 1, 3)?;
        let ints = args.iter().map(expect_int).collect::<Result<Vec<_>, _>>()?;
        let (start, stop, step) = match ints.as_slice() {
            [stop] => (0, *stop, 1),
            [start, stop] => (*start, *stop, 1),
            [start, stop, step] => (*start, *stop, *step),
            _ => unreachable!("arity checked above"),
        };
        if step == 0 {
            return Err(RuntimeError::Value(
                "range() arg 3 must not be zero".to_string(),
            ));
        }

        let span = if step > 0 {
            i128::from(stop) - i128::from(start)
        } else {
            i128::from(start) - i128::from(stop)
        };
        let count = (span.max(0) + i128::from(step).abs() - 1) / i128::from(step).abs();
        if count > MAX_ITEMS as i128 {
            return Err(RuntimeError::TooLarge);
        }

        let mut items = Vec::with_capacity(count as usize);
        let mut current = start;
        while (step > 0 && current < stop) || (step < 0 && current > stop) {
            items.push(Value::Int(current));
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(Value::list(items))
    }
}

pub struct List;

impl BuiltinFunction for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn call(&self, args: Vec<Value>, _out: &mut dyn Write) -> Result<Value, RuntimeError> {
        check_arity(self.name(), &args, 0, 1)?;
        match args.first() {
            Some(iterable) => Ok(Value::list(iterable.iterate()?)),
            None => Ok(Value::list(Vec::new())),
        }
    }
}
