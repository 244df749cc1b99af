//! Tree-walking evaluator for the isolated execution context
//!
//! The scope chain is rooted at a global scope containing exactly the four
//! runner primitives; nothing else from the host is reachable. Evaluation
//! is synchronous and single-threaded, and any error propagates straight
//! to the `run_program` boundary.

use std::collections::HashMap;

use crate::sandbox::process::ProcessRunner;
use crate::sandbox::runtime::RunTotals;
use crate::sandbox::value::{Builtin, FunctionValue, Value};
use crate::syntax::ast::*;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct EvalError(pub String);

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub(crate) enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'a> {
    pub(crate) source: &'a str,
    pub(crate) runner: &'a dyn ProcessRunner,
    pub(crate) totals: RunTotals,
    scopes: Vec<HashMap<String, Value>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(source: &'a str, runner: &'a dyn ProcessRunner) -> Self {
        let mut globals = HashMap::new();
        for builtin in [
            Builtin::Task,
            Builtin::Command,
            Builtin::CommandLive,
            Builtin::Runs,
        ] {
            globals.insert(builtin.name().to_string(), Value::Native(builtin));
        }
        Self {
            source,
            runner,
            totals: RunTotals::default(),
            scopes: vec![globals, HashMap::new()],
        }
    }

    pub fn run(&mut self, module: &Module) -> Result<RunTotals, EvalError> {
        for stmt in &module.body {
            self.exec_stmt(stmt)?;
        }
        Ok(self.totals)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Assign to the nearest scope already holding `name`; an undeclared
    /// assignment creates a module-level binding.
    fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(scope) = self.scopes.get_mut(1) {
            scope.insert(name.to_string(), value);
        }
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match &stmt.kind {
            StmtKind::Import(_) => Err(EvalError::new(
                "import statements are not available in the execution context",
            )),
            StmtKind::VarDecl(decl) => {
                let value = match &decl.init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::Undefined,
                };
                self.declare(&decl.name, value);
                Ok(Flow::Normal)
            }
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(cond)?.truthy() {
                    self.exec_body(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_body(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::Block(body) => self.exec_body(body),
            StmtKind::Empty => Ok(Flow::Normal),
        }
    }

    fn exec_body(&mut self, body: &[Stmt]) -> Result<Flow, EvalError> {
        for stmt in body {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Str(value) => Ok(Value::Str(value.clone())),
            ExprKind::Num(value) => Ok(Value::Num(*value)),
            ExprKind::Bool(value) => Ok(Value::Bool(*value)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Undefined => Ok(Value::Undefined),
            ExprKind::Ident(name) => self
                .lookup(name)
                .ok_or_else(|| EvalError::new(format!("{} is not defined", name))),
            ExprKind::Template(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(t) => text.push_str(t),
                        TemplatePart::Expr(inner) => {
                            text.push_str(&self.eval_expr(inner)?.to_display_string());
                        }
                    }
                }
                Ok(Value::Str(text))
            }
            ExprKind::Object(props) => {
                let mut map = std::collections::BTreeMap::new();
                for (key, value) in props {
                    map.insert(key.clone(), self.eval_expr(value)?);
                }
                Ok(Value::Object(map))
            }
            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::Array(values))
            }
            ExprKind::Arrow { params, body } => {
                let body = match body {
                    FnBody::Block(stmts) => stmts.clone(),
                    FnBody::Expr(inner) => vec![Stmt {
                        span: inner.span,
                        line: 0,
                        kind: StmtKind::Return(Some((**inner).clone())),
                    }],
                };
                Ok(self.make_function(params.clone(), body, expr.span))
            }
            ExprKind::Function { params, body, .. } => {
                Ok(self.make_function(params.clone(), body.clone(), expr.span))
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                self.call_value(&callee, values)
            }
            ExprKind::Member { object, property } => {
                Ok(self.eval_expr(object)?.field(property))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => match value {
                        Value::Num(n) => Ok(Value::Num(-n)),
                        other => Err(EvalError::new(format!(
                            "cannot negate a {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            ExprKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign(target, value.clone());
                Ok(value)
            }
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    fn make_function(&self, params: Vec<Param>, body: Vec<Stmt>, span: crate::syntax::Span) -> Value {
        Value::Function(std::rc::Rc::new(FunctionValue {
            params,
            body,
            text: span.slice(self.source).to_string(),
        }))
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        // Short-circuit operators return one of their operand values.
        if op == BinaryOp::And {
            let left = self.eval_expr(lhs)?;
            return if left.truthy() {
                self.eval_expr(rhs)
            } else {
                Ok(left)
            };
        }
        if op == BinaryOp::Or {
            let left = self.eval_expr(lhs)?;
            return if left.truthy() {
                Ok(left)
            } else {
                self.eval_expr(rhs)
            };
        }

        let left = self.eval_expr(lhs)?;
        let right = self.eval_expr(rhs)?;
        match op {
            BinaryOp::Add => match (&left, &right) {
                (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
                (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!(
                    "{}{}",
                    left.to_display_string(),
                    right.to_display_string()
                ))),
                _ => Err(EvalError::new(format!(
                    "cannot add {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let (Value::Num(a), Value::Num(b)) = (&left, &right) else {
                    return Err(EvalError::new(format!(
                        "arithmetic needs numbers, got {} and {}",
                        left.type_name(),
                        right.type_name()
                    )));
                };
                Ok(Value::Num(match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&left, &right) {
                    (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => None,
                };
                let Some(ordering) = ordering else {
                    return Err(EvalError::new(format!(
                        "cannot compare {} and {}",
                        left.type_name(),
                        right.type_name()
                    )));
                };
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            BinaryOp::Eq => Ok(Value::Bool(left.loosely_equals(&right))),
            BinaryOp::Ne => Ok(Value::Bool(!left.loosely_equals(&right))),
            BinaryOp::StrictEq => Ok(Value::Bool(left.strictly_equals(&right))),
            BinaryOp::StrictNe => Ok(Value::Bool(!left.strictly_equals(&right))),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    /// Invoke a callable value with already-evaluated arguments.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match callee {
            Value::Native(builtin) => self.call_builtin(*builtin, args),
            Value::Function(func) => self.call_function(func.clone(), args),
            other => Err(EvalError::new(format!(
                "{} is not callable",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        func: std::rc::Rc<FunctionValue>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let mut scope = HashMap::new();
        let mut args = args.into_iter();
        for param in &func.params {
            scope.insert(param.name.clone(), args.next().unwrap_or(Value::Undefined));
        }
        self.scopes.push(scope);
        let result = self.exec_body(&func.body);
        self.scopes.pop();
        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Undefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::tests::FakeRunner;
    use crate::syntax::parse_module;

    fn eval_in(source: &str) -> Result<RunTotals, EvalError> {
        let module = parse_module(source).expect("parses");
        let runner = FakeRunner::default();
        Interpreter::new(source, &runner).run(&module)
    }

    #[test]
    fn only_the_four_primitives_are_bound() {
        assert!(eval_in("var x = task && command && commandLive && runs;").is_ok());
        let err = eval_in("console.log(\"hi\");").expect_err("console is not bound");
        assert!(err.to_string().contains("console is not defined"));
        assert!(eval_in("require(\"fs\");").is_err());
        assert!(eval_in("process.exit(1);").is_err());
    }

    #[test]
    fn import_statements_are_rejected_inside_the_context() {
        assert!(eval_in("import { task } from \"plow\";").is_err());
    }

    #[test]
    fn function_calls_bind_parameters_and_return() {
        // Totals stay zero; this just exercises calls through `runs`-free code.
        assert!(eval_in("var f = function (a, b) { return a + b; };\nvar s = f(\"x\", \"y\");").is_ok());
    }

    #[test]
    fn short_circuit_operators_do_not_evaluate_the_other_side() {
        assert!(eval_in("var a = false && missing;").is_ok());
        assert!(eval_in("var b = true || missing;").is_ok());
        assert!(eval_in("var c = true && missing;").is_err());
    }

    #[test]
    fn template_interpolation_coerces_values() {
        assert!(eval_in("var n = 2;\nvar s = `got ${n}`;").is_ok());
    }

    #[test]
    fn strict_equality_distinguishes_null_from_undefined() {
        // The then-branch only evaluates (and errors on `missing`) if the
        // comparison goes the wrong way.
        assert!(eval_in("if (null === undefined) { missing; }").is_ok());
        assert!(eval_in("if (null == undefined) {} else { missing; }").is_ok());
        assert!(eval_in("if (1 !== \"1\") {} else { missing; }").is_ok());
    }

    #[test]
    fn assignment_updates_bindings_and_creates_module_ones() {
        assert!(eval_in("var a = 1;\na = 2;").is_ok());
        assert!(eval_in("fresh = 3;\nvar b = fresh + 1;").is_ok());
    }

    #[test]
    fn member_access_on_objects_reads_fields() {
        assert!(eval_in("var o = { a: 1 };\nvar v = o.a;").is_ok());
        // Missing fields read as undefined rather than erroring.
        assert!(eval_in("var o = {};\nvar v = o.missing;").is_ok());
    }
}
