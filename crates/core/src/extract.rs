//! Source Extractor
//!
//! Parses a config source file and statically locates the pieces the rest
//! of the pipeline needs: the single top-level `options` binding, the
//! import statements, and the list of top-level task invocations. Only the
//! top-level statement list is inspected; the file is never evaluated as a
//! program. On any parse failure the extractor returns an empty result
//! instead of raising, and callers treat "no tasks found" as the
//! user-facing condition.

use crate::config::TaskOptions;
use crate::syntax::ast::{Expr, ExprKind, Module, Stmt, StmtKind, UnaryOp};
use crate::syntax::parse_module;

/// One top-level task invocation, in source order. `text` is the verbatim
/// slice of the original source covered by the statement, so re-serializing
/// the task into a synthesized program is byte-identical by construction.
#[derive(Debug, Clone)]
pub struct TaskDecl {
    pub name: String,
    pub node: Stmt,
    pub text: String,
}

/// Everything the extractor recovers from one config file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedConfig {
    pub options: TaskOptions,
    pub imports: Vec<String>,
    pub tasks: Vec<TaskDecl>,
}

/// Statically extract options, imports, and tasks from config source text.
pub fn extract(source: &str) -> ExtractedConfig {
    let Ok(module) = parse_module(source) else {
        return ExtractedConfig::default();
    };
    extract_from_module(&module, source)
}

fn extract_from_module(module: &Module, source: &str) -> ExtractedConfig {
    let mut extracted = ExtractedConfig::default();

    for stmt in &module.body {
        match &stmt.kind {
            StmtKind::Import(_) => {
                extracted.imports.push(stmt.span.slice(source).to_string());
            }
            StmtKind::VarDecl(decl) if decl.name == "options" => {
                // Best-effort: a non-literal initializer leaves the
                // defaults in place without aborting extraction.
                if let Some(value) = decl.init.as_ref().and_then(literal_value) {
                    extracted.options = TaskOptions::from_value(value);
                }
            }
            // A bare `options = {...}` assignment counts the same as the
            // declaration form.
            StmtKind::Expr(Expr {
                kind: ExprKind::Assign { target, value },
                ..
            }) if target == "options" => {
                if let Some(value) = literal_value(value) {
                    extracted.options = TaskOptions::from_value(value);
                }
            }
            StmtKind::Expr(expr) => {
                if let Some(task) = task_invocation(expr, stmt, source) {
                    extracted.tasks.push(task);
                }
            }
            _ => {}
        }
    }

    extracted
}

/// A top-level expression statement whose callee has a name is a task
/// invocation; the literal value of its first argument is the task name.
fn task_invocation(expr: &Expr, stmt: &Stmt, source: &str) -> Option<TaskDecl> {
    let ExprKind::Call { callee, args } = &expr.kind else {
        return None;
    };
    let ExprKind::Ident(_) = &callee.kind else {
        return None;
    };
    let name = match args.first().map(|arg| &arg.kind) {
        Some(ExprKind::Str(value)) => value.clone(),
        Some(ExprKind::Num(value)) => format!("{}", value),
        _ => String::new(),
    };
    Some(TaskDecl {
        name,
        node: stmt.clone(),
        text: stmt.span.slice(source).to_string(),
    })
}

/// Evaluate a pure literal expression to a JSON value. Returns `None` for
/// anything that would need runtime evaluation.
pub(crate) fn literal_value(expr: &Expr) -> Option<serde_json::Value> {
    use serde_json::Value;
    match &expr.kind {
        ExprKind::Str(value) => Some(Value::String(value.clone())),
        ExprKind::Num(value) => serde_json::Number::from_f64(*value).map(Value::Number),
        ExprKind::Bool(value) => Some(Value::Bool(*value)),
        ExprKind::Null => Some(Value::Null),
        ExprKind::Object(props) => {
            let mut map = serde_json::Map::new();
            for (key, value) in props {
                map.insert(key.clone(), literal_value(value)?);
            }
            Some(Value::Object(map))
        }
        ExprKind::Array(items) => items
            .iter()
            .map(literal_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        ExprKind::Paren(inner) => literal_value(inner),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match literal_value(operand)? {
            Value::Number(n) => n
                .as_f64()
                .and_then(|n| serde_json::Number::from_f64(-n))
                .map(Value::Number),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Exclude;

    const SAMPLE: &str = r#"
import { task, command, runs, commandLive } from "plow";

const options = { silent: false, exclude: "none" };

task(
  "run",
  () => {},
  [
    runs("a run passing command", () => {
      command("exit 0");
    }),
  ],
  options
);

task("build", () => {}, [], options);
"#;

    #[test]
    fn finds_all_tasks_in_source_order() {
        let extracted = extract(SAMPLE);
        let names: Vec<&str> = extracted.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["run", "build"]);
    }

    #[test]
    fn task_text_is_the_verbatim_source_slice() {
        let extracted = extract(SAMPLE);
        assert!(extracted.tasks[0].text.starts_with("task(\n  \"run\","));
        assert!(SAMPLE.contains(&extracted.tasks[0].text));
    }

    #[test]
    fn collects_imports_and_options() {
        let extracted = extract(SAMPLE);
        assert_eq!(extracted.imports.len(), 1);
        assert_eq!(extracted.options.silent, Some(false));
        assert_eq!(extracted.options.exclude, Some(Exclude::None));
    }

    #[test]
    fn interleaved_unrelated_statements_do_not_affect_task_count() {
        let src = "const a = 1;\ntask(\"one\", () => {}, []);\nconst b = 2;\ntask(\"two\", () => {}, []);\nconsole.log(\"hi\");";
        let extracted = extract(src);
        // `console.log(...)` has a member callee, not a named one.
        let names: Vec<&str> = extracted.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn duplicate_task_names_are_preserved_in_order() {
        let src = "task(\"t\", () => {}, []);\ntask(\"t\", () => {}, []);";
        let extracted = extract(src);
        assert_eq!(extracted.tasks.len(), 2);
    }

    #[test]
    fn missing_options_binding_defaults_to_empty() {
        let extracted = extract("task(\"t\", () => {}, []);");
        assert_eq!(extracted.options, TaskOptions::default());
    }

    #[test]
    fn non_literal_options_fall_back_without_losing_tasks() {
        let src = "const options = buildOptions();\ntask(\"t\", () => {}, []);";
        let extracted = extract(src);
        assert_eq!(extracted.options, TaskOptions::default());
        assert_eq!(extracted.tasks.len(), 1);
    }

    #[test]
    fn nested_task_calls_are_not_extracted() {
        let src = "const f = () => { task(\"inner\", () => {}, []); };";
        let extracted = extract(src);
        assert!(extracted.tasks.is_empty());
    }

    #[test]
    fn malformed_source_yields_the_empty_result() {
        let extracted = extract("task(\"t\", () => {");
        assert!(extracted.tasks.is_empty());
        assert!(extracted.imports.is_empty());
        assert_eq!(extracted.options, TaskOptions::default());
    }

    #[test]
    fn bare_options_assignment_binds_options() {
        let src = "options = { silent: true, exclude: \"none\" };\ntask(\"t\", () => {}, [runs(\"r\", () => { command(\"exit 0\"); })]);";
        let extracted = extract(src);
        assert_eq!(extracted.tasks.len(), 1);
        assert_eq!(extracted.options.silent, Some(true));
        assert_eq!(extracted.options.exclude, Some(Exclude::None));
    }

    #[test]
    fn typed_options_binding_extracts_identically() {
        let src = "const options: TaskConfig = { silent: true };\ntask(\"t\", () => {}, []);";
        let extracted = extract(src);
        assert_eq!(extracted.options.silent, Some(true));
    }
}
