//! Re-serialization of syntax trees to source text
//!
//! Two modes: a canonical print, and a retain-lines print that pads the
//! output with blank lines so each top-level statement lands on (or near)
//! its recorded source line. The latter is best-effort and exists to keep
//! line numbers meaningful in errors reported against transformed programs.

use super::ast::*;

pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    for stmt in &module.body {
        print_stmt(stmt, 0, &mut out);
        out.push('\n');
    }
    out
}

/// Print, padding with newlines so statements keep their original lines
/// where feasible.
pub fn print_module_retain_lines(module: &Module) -> String {
    let mut out = String::new();
    let mut line = 1u32;
    for stmt in &module.body {
        while line < stmt.line {
            out.push('\n');
            line += 1;
        }
        let mut text = String::new();
        print_stmt(stmt, 0, &mut text);
        line += text.matches('\n').count() as u32 + 1;
        out.push_str(&text);
        out.push('\n');
    }
    out
}

pub fn print_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match &stmt.kind {
        StmtKind::Import(decl) => {
            out.push_str(&pad);
            print_import(decl, out);
        }
        StmtKind::VarDecl(decl) => {
            out.push_str(&pad);
            out.push_str(decl.kind.keyword());
            out.push(' ');
            out.push_str(&decl.name);
            if let Some(init) = &decl.init {
                out.push_str(" = ");
                print_expr(init, indent, out);
            }
            out.push(';');
        }
        StmtKind::Expr(expr) => {
            out.push_str(&pad);
            print_expr(expr, indent, out);
            out.push(';');
        }
        StmtKind::Return(value) => {
            out.push_str(&pad);
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                print_expr(value, indent, out);
            }
            out.push(';');
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str(&pad);
            out.push_str("if (");
            print_expr(cond, indent, out);
            out.push_str(") ");
            print_block(then_branch, indent, out);
            if let Some(else_branch) = else_branch {
                out.push_str(" else ");
                print_block(else_branch, indent, out);
            }
        }
        StmtKind::Block(body) => {
            out.push_str(&pad);
            print_block(body, indent, out);
        }
        StmtKind::Empty => {
            out.push_str(&pad);
            out.push(';');
        }
    }
}

fn print_import(decl: &ImportDecl, out: &mut String) {
    out.push_str("import ");
    let mut clauses = false;
    if let Some(default) = &decl.default {
        out.push_str(default);
        clauses = true;
    }
    if let Some(namespace) = &decl.namespace {
        out.push_str("* as ");
        out.push_str(namespace);
        clauses = true;
    }
    if !decl.named.is_empty() {
        if decl.default.is_some() {
            out.push_str(", ");
        }
        out.push_str("{ ");
        out.push_str(&decl.named.join(", "));
        out.push_str(" }");
        clauses = true;
    }
    if clauses {
        out.push_str(" from ");
    }
    out.push('"');
    out.push_str(&decl.source);
    out.push_str("\";");
}

fn print_block(body: &[Stmt], indent: usize, out: &mut String) {
    if body.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for stmt in body {
        print_stmt(stmt, indent + 1, out);
        out.push('\n');
    }
    out.push_str(&"  ".repeat(indent));
    out.push('}');
}

pub fn print_expr(expr: &Expr, indent: usize, out: &mut String) {
    match &expr.kind {
        ExprKind::Str(value) => print_str(value, out),
        ExprKind::Num(value) => {
            if value.fract() == 0.0 && value.abs() < 1e15 {
                out.push_str(&format!("{}", *value as i64));
            } else {
                out.push_str(&format!("{}", value));
            }
        }
        ExprKind::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        ExprKind::Null => out.push_str("null"),
        ExprKind::Undefined => out.push_str("undefined"),
        ExprKind::Ident(name) => out.push_str(name),
        ExprKind::Template(parts) => {
            out.push('`');
            for part in parts {
                match part {
                    TemplatePart::Text(text) => {
                        for c in text.chars() {
                            match c {
                                '`' => out.push_str("\\`"),
                                '\\' => out.push_str("\\\\"),
                                '$' => out.push_str("\\$"),
                                other => out.push(other),
                            }
                        }
                    }
                    TemplatePart::Expr(inner) => {
                        out.push_str("${");
                        print_expr(inner, indent, out);
                        out.push('}');
                    }
                }
            }
            out.push('`');
        }
        ExprKind::Object(props) => {
            if props.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, value)) in props.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_valid_ident(key) {
                    out.push_str(key);
                } else {
                    print_str(key, out);
                }
                out.push_str(": ");
                print_expr(value, indent, out);
            }
            out.push_str(" }");
        }
        ExprKind::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(item, indent, out);
            }
            out.push(']');
        }
        ExprKind::Arrow { params, body } => {
            print_params(params, out);
            out.push_str(" => ");
            match body {
                FnBody::Expr(inner) => print_expr(inner, indent, out),
                FnBody::Block(stmts) => print_block(stmts, indent, out),
            }
        }
        ExprKind::Function { name, params, body } => {
            out.push_str("function ");
            if let Some(name) = name {
                out.push_str(name);
            }
            print_params(params, out);
            out.push(' ');
            print_block(body, indent, out);
        }
        ExprKind::Call { callee, args } => {
            print_expr(callee, indent, out);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(arg, indent, out);
            }
            out.push(')');
        }
        ExprKind::Member { object, property } => {
            print_expr(object, indent, out);
            out.push('.');
            out.push_str(property);
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.symbol());
            let needs_parens = matches!(operand.kind, ExprKind::Binary { .. });
            if needs_parens {
                out.push('(');
            }
            print_expr(operand, indent, out);
            if needs_parens {
                out.push(')');
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            print_operand(lhs, op.precedence(), false, indent, out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            print_operand(rhs, op.precedence(), true, indent, out);
        }
        ExprKind::Assign { target, value } => {
            out.push_str(target);
            out.push_str(" = ");
            print_expr(value, indent, out);
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            print_expr(inner, indent, out);
            out.push(')');
        }
    }
}

/// Parenthesize a binary operand when re-parsing it flat would change the
/// grouping (left-associative operators).
fn print_operand(expr: &Expr, parent_prec: u8, is_rhs: bool, indent: usize, out: &mut String) {
    let needs_parens = match &expr.kind {
        ExprKind::Binary { op, .. } => {
            let prec = op.precedence();
            prec < parent_prec || (is_rhs && prec == parent_prec)
        }
        ExprKind::Arrow { .. } | ExprKind::Function { .. } | ExprKind::Assign { .. } => true,
        _ => false,
    };
    if needs_parens {
        out.push('(');
        print_expr(expr, indent, out);
        out.push(')');
    } else {
        print_expr(expr, indent, out);
    }
}

fn print_params(params: &[Param], out: &mut String) {
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.name);
    }
    out.push(')');
}

fn print_str(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn is_valid_ident(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;

    fn reprint(source: &str) -> String {
        print_module(&parse_module(source).expect("parses"))
    }

    #[test]
    fn printed_output_reparses() {
        let src = r#"task("run", () => {}, [runs("r", () => { command("exit 0"); })], options);"#;
        let printed = reprint(src);
        let reparsed = parse_module(&printed).expect("printed source parses");
        assert_eq!(reparsed.body.len(), 1);
    }

    #[test]
    fn retain_lines_pads_to_source_lines() {
        let src = "const a = 1;\n\n\nconst b = 2;";
        let module = parse_module(src).expect("parses");
        let printed = print_module_retain_lines(&module);
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "const a = 1;");
        assert_eq!(lines[3], "const b = 2;");
    }

    #[test]
    fn binary_grouping_survives_a_round_trip() {
        let printed = reprint("const a = (1 + 2) * 3;");
        assert!(printed.contains("(1 + 2) * 3"));
    }

    #[test]
    fn string_escapes_are_preserved() {
        let printed = reprint(r#"const s = "a \"quoted\" word";"#);
        assert!(printed.contains(r#""a \"quoted\" word""#));
    }
}
