//! Portability Transform
//!
//! Downgrades the synthesized program to a baseline every supported
//! execution context can run: arrow functions become `function`
//! expressions, `const`/`let` become `var`, template literals become
//! string concatenation, and type annotations are already gone after
//! parsing. The lowered tree is re-serialized with line numbers preserved
//! best-effort, then re-parsed as a sanity check. Failures here are fatal;
//! an unrunnable program is never handed to the sandbox.

use crate::syntax::ast::*;
use crate::syntax::{parse_module, print_module_retain_lines};
use crate::types::{PlowError, PlowResult};

/// Lower the intermediate program text to final executable source text.
pub fn lower(source: &str) -> PlowResult<String> {
    let module = parse_module(source)
        .map_err(|e| PlowError::Transform(format!("cannot parse synthesized program: {}", e)))?;
    let lowered = lower_module(module);
    let text = print_module_retain_lines(&lowered);
    parse_module(&text)
        .map_err(|e| PlowError::Transform(format!("lowered program does not re-parse: {}", e)))?;
    Ok(text)
}

fn lower_module(module: Module) -> Module {
    Module {
        body: module.body.into_iter().map(lower_stmt).collect(),
    }
}

fn lower_stmt(stmt: Stmt) -> Stmt {
    let kind = match stmt.kind {
        StmtKind::VarDecl(decl) => StmtKind::VarDecl(VarDecl {
            kind: DeclKind::Var,
            name: decl.name,
            init: decl.init.map(lower_expr),
        }),
        StmtKind::Expr(expr) => StmtKind::Expr(lower_expr(expr)),
        StmtKind::Return(value) => StmtKind::Return(value.map(lower_expr)),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => StmtKind::If {
            cond: lower_expr(cond),
            then_branch: then_branch.into_iter().map(lower_stmt).collect(),
            else_branch: else_branch.map(|b| b.into_iter().map(lower_stmt).collect()),
        },
        StmtKind::Block(body) => StmtKind::Block(body.into_iter().map(lower_stmt).collect()),
        other @ (StmtKind::Import(_) | StmtKind::Empty) => other,
    };
    Stmt { kind, ..stmt }
}

fn lower_expr(expr: Expr) -> Expr {
    let span = expr.span;
    let kind = match expr.kind {
        ExprKind::Arrow { params, body } => {
            let body = match body {
                FnBody::Block(stmts) => stmts.into_iter().map(lower_stmt).collect(),
                // Expression-bodied arrows return their expression.
                FnBody::Expr(inner) => vec![Stmt {
                    span: inner.span,
                    line: 0,
                    kind: StmtKind::Return(Some(lower_expr(*inner))),
                }],
            };
            ExprKind::Function {
                name: None,
                params,
                body,
            }
        }
        ExprKind::Template(parts) => lower_template(parts),
        ExprKind::Function { name, params, body } => ExprKind::Function {
            name,
            params,
            body: body.into_iter().map(lower_stmt).collect(),
        },
        ExprKind::Object(props) => ExprKind::Object(
            props
                .into_iter()
                .map(|(key, value)| (key, lower_expr(value)))
                .collect(),
        ),
        ExprKind::Array(items) => ExprKind::Array(items.into_iter().map(lower_expr).collect()),
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee: Box::new(lower_expr(*callee)),
            args: args.into_iter().map(lower_expr).collect(),
        },
        ExprKind::Member { object, property } => ExprKind::Member {
            object: Box::new(lower_expr(*object)),
            property,
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: Box::new(lower_expr(*operand)),
        },
        ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
            op,
            lhs: Box::new(lower_expr(*lhs)),
            rhs: Box::new(lower_expr(*rhs)),
        },
        ExprKind::Assign { target, value } => ExprKind::Assign {
            target,
            value: Box::new(lower_expr(*value)),
        },
        ExprKind::Paren(inner) => ExprKind::Paren(Box::new(lower_expr(*inner))),
        literal => literal,
    };
    Expr { kind, span }
}

/// Rewrite `` `a ${x} b` `` as `"a" + (x) + " b"`. A leading empty string
/// forces string concatenation when the template starts with an expression.
fn lower_template(parts: Vec<TemplatePart>) -> ExprKind {
    if parts.is_empty() {
        return ExprKind::Str(String::new());
    }

    let mut pieces = parts.into_iter().map(|part| match part {
        TemplatePart::Text(text) => Expr {
            span: crate::syntax::Span::default(),
            kind: ExprKind::Str(text),
        },
        TemplatePart::Expr(inner) => {
            let span = inner.span;
            Expr {
                span,
                kind: ExprKind::Paren(Box::new(lower_expr(inner))),
            }
        }
    });

    let first = pieces.next().unwrap_or(Expr {
        span: crate::syntax::Span::default(),
        kind: ExprKind::Str(String::new()),
    });
    let mut acc = if matches!(first.kind, ExprKind::Str(_)) {
        first
    } else {
        Expr {
            span: first.span,
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr {
                    span: crate::syntax::Span::default(),
                    kind: ExprKind::Str(String::new()),
                }),
                rhs: Box::new(first),
            },
        }
    };

    for piece in pieces {
        acc = Expr {
            span: piece.span,
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(acc),
                rhs: Box::new(piece),
            },
        };
    }
    acc.kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::synth::synthesize;

    #[test]
    fn arrows_become_function_expressions() {
        let lowered = lower("const f = () => { command(\"exit 0\"); };").expect("lowers");
        assert!(lowered.contains("function ()"));
        assert!(!lowered.contains("=>"));
    }

    #[test]
    fn expression_bodied_arrows_gain_a_return() {
        let lowered = lower("const f = (x) => x + 1;").expect("lowers");
        assert!(lowered.contains("return x + 1;"));
    }

    #[test]
    fn declarations_downgrade_to_var() {
        let lowered = lower("const a = 1;\nlet b = 2;").expect("lowers");
        assert!(lowered.contains("var a = 1;"));
        assert!(lowered.contains("var b = 2;"));
        assert!(!lowered.contains("const"));
        assert!(!lowered.contains("let "));
    }

    #[test]
    fn templates_become_concatenation() {
        let lowered = lower("const s = `run ${name} now`;").expect("lowers");
        assert!(lowered.contains("\"run \" + (name) + \" now\""));
        assert!(!lowered.contains('`'));
    }

    #[test]
    fn lowered_output_reparses() {
        let src = r#"task("t", () => {}, [runs("r", () => { command("exit 0"); })], options);"#;
        let lowered = lower(src).expect("lowers");
        assert!(crate::syntax::parse_module(&lowered).is_ok());
    }

    #[test]
    fn top_level_statement_lines_are_preserved() {
        let extracted = extract("const options = { silent: true };\n\ntask(\"t\", () => {}, []);");
        let program = synthesize(&extracted.options, &extracted.tasks);
        let task_line_before = program
            .lines()
            .position(|l| l.contains("task("))
            .expect("task line");
        let lowered = lower(&program).expect("lowers");
        let task_line_after = lowered
            .lines()
            .position(|l| l.contains("task("))
            .expect("task line");
        assert_eq!(task_line_before, task_line_after);
    }

    #[test]
    fn unparsable_input_is_a_fatal_transform_error() {
        assert!(lower("task(\"t\", () => {").is_err());
    }
}
