//! Tree-walking evaluation of parsed programs against the shared namespace.

use crate::error::RuntimeError;
use crate::script::builtin;
use crate::script::parser::{BinaryOp, CompareOp, Expr, LogicalOp, Stmt, Target, UnaryOp};
use crate::script::value::{Number, Value, normalize_index};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;

/// Upper bound on list length produced by `range` or `*`.
pub(crate) const MAX_ITEMS: usize = 1 << 24;
/// Upper bound on string length, in bytes, produced by `*`.
const MAX_STR_BYTES: usize = 1 << 28;

pub struct Evaluator<'a> {
    vars: &'a mut HashMap<String, Value>,
    out: &'a mut dyn Write,
}

impl<'a> Evaluator<'a> {
    pub fn new(vars: &'a mut HashMap<String, Value>, out: &'a mut dyn Write) -> Self {
        Self { vars, out }
    }

    /// Execute statements in order, stopping at the first fault. Bindings made
    /// before the fault are kept.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in program {
            self.exec(stmt)?;
        }
        Ok(())
    }

    pub fn exec(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
            }
            Stmt::AugAssign { target, op, value } => match target {
                Target::Name(name) => {
                    let current = self.lookup(name)?;
                    let rhs = self.eval(value)?;
                    let updated = binary_op(*op, &current, &rhs)?;
                    self.vars.insert(name.clone(), updated);
                }
                Target::Index { target, index } => {
                    let container = self.eval(target)?;
                    let index = self.eval(index)?;
                    let current = index_value(&container, &index)?;
                    let rhs = self.eval(value)?;
                    let updated = binary_op(*op, &current, &rhs)?;
                    set_item(&container, &index, updated)?;
                }
            },
            Stmt::Delete(name) => {
                if self.vars.remove(name).is_none() {
                    return Err(RuntimeError::UndefinedName(name.clone()));
                }
            }
            Stmt::Pass => {}
        }
        Ok(())
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::str(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::NoneLit => Ok(Value::None),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                unary_op(*op, &operand)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary_op(*op, &lhs, &rhs)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let short_circuit = match op {
                    LogicalOp::And => !lhs.is_truthy(),
                    LogicalOp::Or => lhs.is_truthy(),
                };
                if short_circuit { Ok(lhs) } else { self.eval(rhs) }
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match callee {
                    Value::Builtin(function) => function.call(args, &mut *self.out),
                    other => Err(RuntimeError::type_error(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_value(&target, &index)
            }
            Expr::Attribute { target, name } => {
                let target = self.eval(target)?;
                attribute(&target, name)
            }
        }
    }

    /// Namespace first, then builtins.
    fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| builtin::lookup(name))
            .ok_or_else(|| RuntimeError::UndefinedName(name.to_string()))
    }

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                self.vars.insert(name.clone(), value);
                Ok(())
            }
            Target::Index { target, index } => {
                let container = self.eval(target)?;
                let index = self.eval(index)?;
                set_item(&container, &index, value)
            }
        }
    }
}

fn unary_op(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!operand.is_truthy()));
    }
    let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
    match (op, operand.as_number()) {
        (UnaryOp::Neg, Some(Number::Int(i))) => {
            i.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow)
        }
        (UnaryOp::Neg, Some(Number::Float(x))) => Ok(Value::Float(-x)),
        (_, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (_, Some(Number::Float(x))) => Ok(Value::Float(x)),
        (_, None) => Err(RuntimeError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ))),
    }
}

/// Arithmetic shared by expressions, augmented assignment and `sum()`.
pub(crate) fn binary_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => int_op(op, x, y),
            _ => float_op(op, a.as_f64(), b.as_f64()),
        };
    }

    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::Str(joined))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinaryOp::Mul, Value::Str(s), count) | (BinaryOp::Mul, count, Value::Str(s))
            if repeat_count(count).is_some() =>
        {
            let times = repeat_count(count).unwrap_or(0);
            if s.is_empty() || times == 0 {
                return Ok(Value::str(""));
            }
            if s.len().saturating_mul(times) > MAX_STR_BYTES {
                return Err(RuntimeError::TooLarge);
            }
            Ok(Value::Str(s.repeat(times)))
        }
        (BinaryOp::Mul, Value::List(items), count) | (BinaryOp::Mul, count, Value::List(items))
            if repeat_count(count).is_some() =>
        {
            let times = repeat_count(count).unwrap_or(0);
            let items = items.borrow();
            if items.is_empty() || times == 0 {
                return Ok(Value::list(Vec::new()));
            }
            if items.len().saturating_mul(times) > MAX_ITEMS {
                return Err(RuntimeError::TooLarge);
            }
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::list(repeated))
        }
        _ => Err(RuntimeError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

/// Repetition count for `*` on sequences; negative counts repeat zero times.
fn repeat_count(value: &Value) -> Option<usize> {
    match value {
        Value::Int(i) => Some(usize::try_from(*i).unwrap_or(0)),
        Value::Bool(b) => Some(usize::from(*b)),
        _ => None,
    }
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> Result<Value, RuntimeError> {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or(RuntimeError::Overflow);
    match op {
        BinaryOp::Add => checked(x.checked_add(y)),
        BinaryOp::Sub => checked(x.checked_sub(y)),
        BinaryOp::Mul => checked(x.checked_mul(y)),
        BinaryOp::Div => {
            if y == 0 {
                return Err(RuntimeError::ZeroDivision);
            }
            Ok(Value::Float(x as f64 / y as f64))
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(RuntimeError::ZeroDivision);
            }
            let quotient = x.checked_div(y).ok_or(RuntimeError::Overflow)?;
            // round towards negative infinity
            if x % y != 0 && ((x < 0) != (y < 0)) {
                Ok(Value::Int(quotient - 1))
            } else {
                Ok(Value::Int(quotient))
            }
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(RuntimeError::ZeroDivision);
            }
            let remainder = x.wrapping_rem(y);
            // result takes the sign of the divisor
            if remainder != 0 && ((remainder < 0) != (y < 0)) {
                Ok(Value::Int(remainder + y))
            } else {
                Ok(Value::Int(remainder))
            }
        }
        BinaryOp::Pow => {
            // bases whose powers never grow take any exponent
            match x {
                1 if y >= 0 => return Ok(Value::Int(1)),
                0 if y > 0 => return Ok(Value::Int(0)),
                -1 if y >= 0 => return Ok(Value::Int(if y % 2 == 0 { 1 } else { -1 })),
                _ => {}
            }
            if y >= 0 {
                let exp = u32::try_from(y).map_err(|_| RuntimeError::Overflow)?;
                checked(x.checked_pow(exp))
            } else if x == 0 {
                Err(RuntimeError::ZeroDivision)
            } else {
                Ok(Value::Float((x as f64).powf(y as f64)))
            }
        }
    }
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> Result<Value, RuntimeError> {
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if y == 0.0 => {
            return Err(RuntimeError::ZeroDivision);
        }
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => {
            let remainder = x % y;
            if remainder != 0.0 && ((remainder < 0.0) != (y < 0.0)) {
                remainder + y
            } else {
                remainder
            }
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(RuntimeError::ZeroDivision);
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    let ordering = |lhs: &Value, rhs: &Value| lhs.try_cmp(rhs, op.symbol());
    Ok(match op {
        CompareOp::Eq => lhs.try_equals(rhs)?,
        CompareOp::NotEq => !lhs.try_equals(rhs)?,
        CompareOp::Lt => ordering(lhs, rhs)? == Some(Ordering::Less),
        CompareOp::LtEq => matches!(
            ordering(lhs, rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => ordering(lhs, rhs)? == Some(Ordering::Greater),
        CompareOp::GtEq => matches!(
            ordering(lhs, rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::In => contains(rhs, lhs)?,
        CompareOp::NotIn => !contains(rhs, lhs)?,
    })
}

fn contains(container: &Value, item: &Value) -> Result<bool, RuntimeError> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), other) => Err(RuntimeError::type_error(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::List(items), _) => {
            for x in items.borrow().iter() {
                if x.try_equals(item)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        (Value::Players(registry), Value::Str(name)) => Ok(registry.borrow().is_member(name)),
        (Value::Players(_), _) => Ok(false),
        (Value::History(history), Value::Entry(entry)) => {
            Ok(history.borrow().entries().contains(entry))
        }
        (Value::History(_), _) => Ok(false),
        (other, _) => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn expect_index(container: &Value, index: &Value) -> Result<i64, RuntimeError> {
    match index {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(RuntimeError::type_error(format!(
            "{} indices must be integers, not '{}'",
            container.type_name(),
            other.type_name()
        ))),
    }
}

fn out_of_range(container: &Value) -> RuntimeError {
    RuntimeError::Index(format!("{} index out of range", container.type_name()))
}

fn index_value(container: &Value, index: &Value) -> Result<Value, RuntimeError> {
    let len = match container.len() {
        Some(len) => len,
        None => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                container.type_name()
            )));
        }
    };
    let position = normalize_index(expect_index(container, index)?, len)
        .ok_or_else(|| out_of_range(container))?;

    let item = match container {
        Value::Str(s) => s.chars().nth(position).map(|c| Value::Str(c.to_string())),
        Value::List(items) => items.borrow().get(position).cloned(),
        Value::Players(registry) => registry
            .borrow()
            .members()
            .get(position)
            .map(|name| Value::str(name.as_str())),
        Value::History(history) => history.borrow().get(position).cloned().map(Value::Entry),
        _ => None,
    };
    item.ok_or_else(|| out_of_range(container))
}

fn set_item(container: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
    let Value::List(items) = container else {
        return Err(RuntimeError::type_error(format!(
            "'{}' object does not support item assignment",
            container.type_name()
        )));
    };
    let index = expect_index(container, index)?;
    let mut items = items.borrow_mut();
    let position = normalize_index(index, items.len())
        .ok_or_else(|| RuntimeError::Index("list assignment index out of range".to_string()))?;
    items[position] = value;
    Ok(())
}

fn attribute(target: &Value, name: &str) -> Result<Value, RuntimeError> {
    match (target, name) {
        (Value::Entry(entry), "author") => Ok(Value::str(entry.author.as_str())),
        (Value::Entry(entry), "code") => Ok(Value::str(entry.code.as_str())),
        (Value::Entry(entry), "time") => Ok(Value::Str(entry.time())),
        _ => Err(RuntimeError::Attribute(format!(
            "'{}' object has no attribute '{}'",
            target.type_name(),
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryLog;
    use crate::registry::ParticipantRegistry;
    use crate::script::lexer::split_into_tokens;
    use crate::script::parser::{construct_expression, construct_program};
    use pretty_assertions::assert_eq;

    fn run_in(vars: &mut HashMap<String, Value>, source: &str) -> Result<String, RuntimeError> {
        let tokens = split_into_tokens(source).unwrap();
        let program = construct_program(tokens).unwrap();
        let mut out = Vec::new();
        Evaluator::new(vars, &mut out).run(&program)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn eval_in(vars: &mut HashMap<String, Value>, source: &str) -> Result<Value, RuntimeError> {
        let tokens = split_into_tokens(source).unwrap();
        let expr = construct_expression(tokens).unwrap();
        let mut out = Vec::new();
        Evaluator::new(vars, &mut out).eval(&expr)
    }

    fn eval(source: &str) -> Result<Value, RuntimeError> {
        eval_in(&mut HashMap::new(), source)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval("2 + 2").unwrap(), Value::Int(4));
        assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Int(14));
        assert_eq!(eval("2 ** 10").unwrap(), Value::Int(1024));
        assert_eq!(eval("-2 ** 2").unwrap(), Value::Int(-4));
    }

    #[test]
    fn test_division_follows_floor_semantics() {
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("7 // 2").unwrap(), Value::Int(3));
        assert_eq!(eval("-7 // 2").unwrap(), Value::Int(-4));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Int(2));
        assert_eq!(eval("7 % -3").unwrap(), Value::Int(-2));
        assert_eq!(eval("-7.5 // 2").unwrap(), Value::Float(-4.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0").unwrap_err(), RuntimeError::ZeroDivision);
        assert_eq!(eval("1 % 0").unwrap_err(), RuntimeError::ZeroDivision);
        assert_eq!(eval("1.0 // 0").unwrap_err(), RuntimeError::ZeroDivision);
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(eval("9223372036854775807 + 1").unwrap_err(), RuntimeError::Overflow);
        assert_eq!(eval("2 ** 64").unwrap_err(), RuntimeError::Overflow);
    }

    #[test]
    fn test_negative_power_gives_float() {
        assert_eq!(eval("2 ** -1").unwrap(), Value::Float(0.5));
        assert_eq!(eval("(-1) ** -1").unwrap(), Value::Float(-1.0));
        assert_eq!(eval("0 ** -1").unwrap_err(), RuntimeError::ZeroDivision);
    }

    #[test]
    fn test_huge_exponents_on_unit_bases() {
        assert_eq!(eval("1 ** 5000000000").unwrap(), Value::Int(1));
        assert_eq!(eval("0 ** 5000000000").unwrap(), Value::Int(0));
        assert_eq!(eval("0 ** 0").unwrap(), Value::Int(1));
        assert_eq!(eval("(-1) ** 5000000000").unwrap(), Value::Int(1));
        assert_eq!(eval("(-1) ** 5000000001").unwrap(), Value::Int(-1));
        assert_eq!(eval("2 ** 5000000000").unwrap_err(), RuntimeError::Overflow);
    }

    #[test]
    fn test_sequence_operators() {
        assert_eq!(eval("'ab' + 'cd'").unwrap(), Value::str("abcd"));
        assert_eq!(eval("'ab' * 3").unwrap(), Value::str("ababab"));
        assert_eq!(eval("2 * [0]").unwrap().to_string(), "[0, 0]");
        assert_eq!(eval("[1] + [2, 3]").unwrap().to_string(), "[1, 2, 3]");
        assert_eq!(eval("'x' * -1").unwrap(), Value::str(""));
        assert_eq!(eval("'x' * 999999999999").unwrap_err(), RuntimeError::TooLarge);
    }

    #[test]
    fn test_repeating_empty_sequences_is_instant() {
        assert_eq!(eval("[] * 1000000000000").unwrap().to_string(), "[]");
        assert_eq!(eval("1000000000000 * []").unwrap().to_string(), "[]");
        assert_eq!(eval("'' * 1000000000000").unwrap(), Value::str(""));
        assert_eq!(eval("[1, 2] * 0").unwrap().to_string(), "[]");
    }

    #[test]
    fn test_mixed_types_fail() {
        assert_eq!(
            eval("1 + 'a'").unwrap_err().to_string(),
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
        assert_eq!(
            eval("1 < 'a'").unwrap_err().to_string(),
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_comparison_chains() {
        assert_eq!(eval("1 < 2 < 3").unwrap(), Value::Bool(true));
        assert_eq!(eval("1 < 3 < 2").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 == 1.0").unwrap(), Value::Bool(true));
        assert_eq!(eval("'b' >= 'a'").unwrap(), Value::Bool(true));
        assert_eq!(eval("[1, 2] < [1, 3]").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_membership() {
        assert_eq!(eval("2 in [1, 2]").unwrap(), Value::Bool(true));
        assert_eq!(eval("'ell' in 'hello'").unwrap(), Value::Bool(true));
        assert_eq!(eval("3 not in [1, 2]").unwrap(), Value::Bool(true));
        assert!(eval("1 in 'abc'").is_err());
        assert!(eval("1 in 5").is_err());
    }

    #[test]
    fn test_cyclic_lists_fail_to_compare() {
        let mut vars = HashMap::new();
        run_in(&mut vars, "a = [0]\na[0] = a\nb = [0]\nb[0] = b").unwrap();

        assert_eq!(eval_in(&mut vars, "a == a").unwrap(), Value::Bool(true));
        assert_eq!(eval_in(&mut vars, "a in [a]").unwrap(), Value::Bool(true));
        for source in ["a == b", "a != b", "a < b", "a in [b]", "max(a, b)"] {
            assert_eq!(
                eval_in(&mut vars, source).unwrap_err(),
                RuntimeError::RecursionLimit,
                "{source}"
            );
        }
        assert_eq!(
            RuntimeError::RecursionLimit.to_string(),
            "maximum recursion depth exceeded in comparison"
        );
    }

    #[test]
    fn test_logical_short_circuit() {
        // the right-hand side would fail if evaluated
        assert_eq!(eval("0 and undefined").unwrap(), Value::Int(0));
        assert_eq!(eval("'x' or undefined").unwrap(), Value::str("x"));
        assert_eq!(eval("None or 5").unwrap(), Value::Int(5));
        assert_eq!(eval("not []").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_undefined_name() {
        assert_eq!(
            eval("missing").unwrap_err().to_string(),
            "name 'missing' is not defined"
        );
    }

    #[test]
    fn test_assignment_persists_in_namespace() {
        let mut vars = HashMap::new();
        run_in(&mut vars, "x = 5\ny = x * 2").unwrap();
        assert_eq!(vars["y"], Value::Int(10));

        run_in(&mut vars, "y += 1").unwrap();
        assert_eq!(vars["y"], Value::Int(11));
    }

    #[test]
    fn test_bindings_before_fault_are_kept() {
        let mut vars = HashMap::new();
        let err = run_in(&mut vars, "a = 1; b = 1 / 0; c = 3").unwrap_err();
        assert_eq!(err, RuntimeError::ZeroDivision);
        assert!(vars.contains_key("a"));
        assert!(!vars.contains_key("c"));
    }

    #[test]
    fn test_lists_are_shared_references() {
        let mut vars = HashMap::new();
        run_in(&mut vars, "a = [1, 2]\nb = a\nb[0] = 9\na[-1] += 1").unwrap();
        assert_eq!(vars["a"].to_string(), "[9, 3]");
        assert_eq!(vars["b"].to_string(), "[9, 3]");
    }

    #[test]
    fn test_indexing() {
        assert_eq!(eval("[1, 2, 3][-1]").unwrap(), Value::Int(3));
        assert_eq!(eval("'héllo'[1]").unwrap(), Value::str("é"));
        assert_eq!(
            eval("[1][5]").unwrap_err().to_string(),
            "list index out of range"
        );
        assert_eq!(
            eval("5[0]").unwrap_err().to_string(),
            "'int' object is not subscriptable"
        );
        assert_eq!(
            eval("[1]['a']").unwrap_err().to_string(),
            "list indices must be integers, not 'str'"
        );
    }

    #[test]
    fn test_item_assignment_on_str_fails() {
        let mut vars = HashMap::new();
        let err = run_in(&mut vars, "s = 'ab'\ns[0] = 'x'").unwrap_err();
        assert_eq!(err.to_string(), "'str' object does not support item assignment");
    }

    #[test]
    fn test_delete() {
        let mut vars = HashMap::new();
        run_in(&mut vars, "x = 1\ndel x").unwrap();
        assert!(!vars.contains_key("x"));
        assert_eq!(
            run_in(&mut vars, "del x").unwrap_err(),
            RuntimeError::UndefinedName("x".to_string())
        );
    }

    #[test]
    fn test_shadowed_builtin_comes_back_after_del() {
        let mut vars = HashMap::new();
        run_in(&mut vars, "len = 3").unwrap();
        assert_eq!(eval_in(&mut vars, "len").unwrap(), Value::Int(3));
        run_in(&mut vars, "del len").unwrap();
        assert_eq!(eval_in(&mut vars, "len([1])").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_print_writes_to_output() {
        let mut vars = HashMap::new();
        let out = run_in(&mut vars, "x = 3\nprint('x is', x)").unwrap();
        assert_eq!(out, "x is 3\n");
    }

    #[test]
    fn test_calling_non_function() {
        assert_eq!(
            eval("3(1)").unwrap_err().to_string(),
            "'int' object is not callable"
        );
    }

    #[test]
    fn test_players_and_history_views() {
        let registry = ParticipantRegistry::shared();
        let history = HistoryLog::shared();
        registry.borrow_mut().join("Ada");
        registry.borrow_mut().join("Grace");
        history.borrow_mut().record("Ada", "x = 1");

        let mut vars = HashMap::new();
        vars.insert("joined".to_string(), Value::Players(registry.clone()));
        vars.insert("history".to_string(), Value::History(history.clone()));

        assert_eq!(eval_in(&mut vars, "joined[1]").unwrap(), Value::str("Grace"));
        assert_eq!(eval_in(&mut vars, "'Ada' in joined").unwrap(), Value::Bool(true));
        assert_eq!(eval_in(&mut vars, "history[0].author").unwrap(), Value::str("Ada"));
        assert_eq!(eval_in(&mut vars, "history[-1].code").unwrap(), Value::str("x = 1"));
        assert_eq!(
            eval_in(&mut vars, "history[0].nope").unwrap_err().to_string(),
            "'entry' object has no attribute 'nope'"
        );

        registry.borrow_mut().leave("Ada");
        assert_eq!(eval_in(&mut vars, "len(joined)").unwrap(), Value::Int(1));
        assert!(run_in(&mut vars, "joined[0] = 'x'").is_err());
    }
}
