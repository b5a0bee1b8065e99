use crate::stream::ScriptStream;
use crate::variable::{value_is_numeric, VariableStore};
use crate::ScriptError;

/// Index into a storage device's expression arena. Parent links between
/// nested `IF` blocks are arena indices, never owned references: ownership
/// flows strictly from the storage device to its expressions.
pub type ExprId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Assign,
    PlusAssign,
    MinusAssign,
}

impl ExprOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => ExprOp::Equal,
            "!=" => ExprOp::NotEqual,
            "<" => ExprOp::Less,
            "<=" => ExprOp::LessEqual,
            ">" => ExprOp::Greater,
            ">=" => ExprOp::GreaterEqual,
            "+" => ExprOp::Plus,
            "-" => ExprOp::Minus,
            "*" => ExprOp::Multiply,
            "/" => ExprOp::Divide,
            "%" => ExprOp::Modulo,
            "=" => ExprOp::Assign,
            "+=" => ExprOp::PlusAssign,
            "-=" => ExprOp::MinusAssign,
            _ => return None,
        })
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            ExprOp::Equal
                | ExprOp::NotEqual
                | ExprOp::Less
                | ExprOp::LessEqual
                | ExprOp::Greater
                | ExprOp::GreaterEqual
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            ExprOp::Plus | ExprOp::Minus | ExprOp::Multiply | ExprOp::Divide | ExprOp::Modulo
        )
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self, ExprOp::Assign | ExprOp::PlusAssign | ExprOp::MinusAssign)
    }
}

/// A term resolves against the store when a variable of that name exists,
/// otherwise it reads as literal text.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Num(i64),
    Text(String),
}

fn resolve(term: &str, vars: &VariableStore) -> Value {
    if let Some(var) = vars.get(term) {
        if var.is_random() {
            return Value::Num(vars.num_value(term).unwrap_or(0));
        }
        if var.is_numeric() {
            return Value::Num(var.num_value());
        }
        return Value::Text(var.value().to_string());
    }
    if value_is_numeric(term) {
        return Value::Num(term.parse().unwrap_or(0));
    }
    Value::Text(term.to_string())
}

fn as_num(value: &Value) -> i64 {
    match value {
        Value::Num(n) => *n,
        Value::Text(_) => 0,
    }
}

fn compare(lhs: &Value, op: ExprOp, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => match op {
            ExprOp::Equal => a == b,
            ExprOp::NotEqual => a != b,
            ExprOp::Less => a < b,
            ExprOp::LessEqual => a <= b,
            ExprOp::Greater => a > b,
            ExprOp::GreaterEqual => a >= b,
            _ => false,
        },
        _ => {
            let (a, b) = (as_num(lhs), as_num(rhs));
            match op {
                ExprOp::Equal => a == b,
                ExprOp::NotEqual => a != b,
                ExprOp::Less => a < b,
                ExprOp::LessEqual => a <= b,
                ExprOp::Greater => a > b,
                ExprOp::GreaterEqual => a >= b,
                _ => false,
            }
        }
    }
}

fn arithmetic(lhs: i64, op: ExprOp, rhs: i64) -> i64 {
    match op {
        ExprOp::Plus => lhs.wrapping_add(rhs),
        ExprOp::Minus => lhs.wrapping_sub(rhs),
        ExprOp::Multiply => lhs.wrapping_mul(rhs),
        ExprOp::Divide => {
            if rhs == 0 {
                0
            } else {
                lhs / rhs
            }
        }
        ExprOp::Modulo => {
            if rhs == 0 {
                0
            } else {
                lhs % rhs
            }
        }
        _ => lhs,
    }
}

/// One node of a condition tree: a flat sequence of terms and operators
/// evaluated strictly left to right, an optional `NOT`, a parent link for
/// nested `IF` blocks and the captured negation state of the enclosing
/// block at the time this node was opened (so `ELSE` branches invert
/// correctly through the whole chain).
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    terms: Vec<String>,
    ops: Vec<ExprOp>,
    negated: bool,
    parent: Option<ExprId>,
    prev_negative: bool,
}

impl Expression {
    /// Parse one parenthesized condition: `( [NOT] term (op term)* )`.
    pub fn parse(
        stream: &mut ScriptStream<'_>,
        parent: Option<ExprId>,
        prev_negative: bool,
    ) -> Result<Self, ScriptError> {
        stream.eat_white();
        if stream.peek() != Some('(') {
            return Err(ScriptError::MissingParen { line: stream.line() });
        }
        stream.get();

        let mut expr = Expression {
            terms: Vec::new(),
            ops: Vec::new(),
            negated: false,
            parent,
            prev_negative,
        };

        loop {
            stream.eat_white();
            match stream.peek() {
                Some(')') => {
                    stream.get();
                    break;
                }
                None => {
                    return Err(ScriptError::UnexpectedEof { line: stream.line() });
                }
                _ => {}
            }

            if expr.terms.len() == expr.ops.len() {
                // Expecting a term.
                let token = stream.read_quoted_or_word();
                if token.is_empty() {
                    return Err(ScriptError::MalformedLiteral {
                        what: "expression term",
                        line: stream.line(),
                        found: stream.peek().map(String::from).unwrap_or_default(),
                    });
                }
                if expr.terms.is_empty() && !expr.negated && token.eq_ignore_ascii_case("NOT") {
                    expr.negated = true;
                    continue;
                }
                expr.terms.push(token);
            } else {
                let token = read_operator(stream);
                let op = ExprOp::from_token(&token).ok_or_else(|| ScriptError::UnknownOperator {
                    found: token,
                    line: stream.line(),
                })?;
                expr.ops.push(op);
            }
        }

        if expr.terms.len() != expr.ops.len() + 1 || expr.terms.is_empty() {
            return Err(ScriptError::MalformedLiteral {
                what: "expression",
                line: stream.line(),
                found: expr.terms.join(" "),
            });
        }
        Ok(expr)
    }

    pub fn parent(&self) -> Option<ExprId> {
        self.parent
    }

    pub fn prev_negative(&self) -> bool {
        self.prev_negative
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Mutating left-to-right walk used by `execute`. Arithmetic folds into
    /// the left accumulator; a relational operator compares the accumulator
    /// against the right term, ANDs the outcome into the result, and
    /// restarts the accumulator on the right term. Assignments write
    /// through to the store.
    fn walk_mut(&self, vars: &mut VariableStore) -> bool {
        let Some(first) = self.terms.first() else {
            return false;
        };
        let mut acc = resolve(first, vars);
        let mut acc_name = first.clone();
        let mut result = true;
        let mut compared = false;

        for (op, term) in self.ops.iter().zip(self.terms.iter().skip(1)) {
            let rhs = resolve(term, vars);
            if op.is_arithmetic() {
                acc = Value::Num(arithmetic(as_num(&acc), *op, as_num(&rhs)));
            } else if op.is_relational() {
                result = result && compare(&acc, *op, &rhs);
                compared = true;
                acc = rhs;
                acc_name = term.clone();
            } else {
                // Assignment: write the folded right-hand value into the
                // variable currently in the accumulator position.
                let new_value = match op {
                    ExprOp::Assign => rhs.clone(),
                    ExprOp::PlusAssign => Value::Num(as_num(&acc).wrapping_add(as_num(&rhs))),
                    ExprOp::MinusAssign => Value::Num(as_num(&acc).wrapping_sub(as_num(&rhs))),
                    _ => rhs.clone(),
                };
                let text = match &new_value {
                    Value::Num(n) => n.to_string(),
                    Value::Text(t) => t.clone(),
                };
                // Writes to constants are dropped, not fatal.
                let _ = vars.set_or_add(&acc_name, text);
                acc = new_value;
            }
        }

        if compared {
            result
        } else {
            // A bare term (or pure arithmetic/assignment) is truthy when it
            // folds to a non-zero number or non-empty text.
            match acc {
                Value::Num(n) => n != 0,
                Value::Text(t) => !t.is_empty(),
            }
        }
    }

    fn evaluate_local(&self, vars: &VariableStore, negate: bool) -> bool {
        let mut inner = self.walk_pure(vars);
        if self.negated {
            inner = !inner;
        }
        if negate {
            inner = !inner;
        }
        inner
    }

    /// Read-only twin of `walk`. Assignment operators are inert here: they
    /// fold the would-be value into the accumulator without writing.
    fn walk_pure(&self, vars: &VariableStore) -> bool {
        let Some(first) = self.terms.first() else {
            return false;
        };
        let mut acc = resolve(first, vars);
        let mut result = true;
        let mut compared = false;

        for (op, term) in self.ops.iter().zip(self.terms.iter().skip(1)) {
            let rhs = resolve(term, vars);
            if op.is_arithmetic() {
                acc = Value::Num(arithmetic(as_num(&acc), *op, as_num(&rhs)));
            } else if op.is_relational() {
                result = result && compare(&acc, *op, &rhs);
                compared = true;
                acc = rhs;
            } else {
                acc = match op {
                    ExprOp::Assign => rhs,
                    ExprOp::PlusAssign => Value::Num(as_num(&acc).wrapping_add(as_num(&rhs))),
                    ExprOp::MinusAssign => Value::Num(as_num(&acc).wrapping_sub(as_num(&rhs))),
                    _ => rhs,
                };
            }
        }

        if compared {
            result
        } else {
            match acc {
                Value::Num(n) => n != 0,
                Value::Text(t) => !t.is_empty(),
            }
        }
    }

    pub fn has_assignment(&self) -> bool {
        self.ops.iter().any(ExprOp::is_assignment)
    }
}

/// Evaluate an expression node within its arena. `negate` is the caller's
/// inversion (an object's negative flag); each parent in the chain is
/// evaluated with the negation state its child captured at parse time, and
/// the results AND together. Side-effect-free apart from random reads.
pub fn evaluate(arena: &[Expression], id: ExprId, vars: &VariableStore, negate: bool) -> bool {
    let Some(expr) = arena.get(id) else {
        return false;
    };
    let mut result = expr.evaluate_local(vars, negate);
    if let Some(parent) = expr.parent {
        result = result && evaluate(arena, parent, vars, expr.prev_negative);
    }
    result
}

/// The mutating variant used by `EXPR` objects: assignments write through
/// to the store. The parent chain (pure conditions) still gates the result.
pub fn execute(arena: &[Expression], id: ExprId, vars: &mut VariableStore, negate: bool) -> bool {
    let Some(expr) = arena.get(id) else {
        return false;
    };
    let mut inner = expr.walk_mut(vars);
    if expr.negated {
        inner = !inner;
    }
    if negate {
        inner = !inner;
    }
    let mut result = inner;
    if let Some(parent) = expr.parent {
        result = result && evaluate(arena, parent, vars, expr.prev_negative);
    }
    result
}

/// Operator token read: a maximal run of operator characters. Kept apart
/// from the word tokenizer so `>=`/`+=` read whole and `-` is not folded
/// into an identifier.
fn read_operator(stream: &mut ScriptStream<'_>) -> String {
    stream.eat_white();
    let mut out = String::new();
    while let Some(ch) = stream.peek() {
        if matches!(ch, '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%') {
            out.push(stream.get().unwrap_or_default());
        } else {
            break;
        }
    }
    out
}
