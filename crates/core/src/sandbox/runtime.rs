//! The four runner primitives bound into the execution context
//!
//! `command` / `commandLive` wrap the injected process capability, `runs`
//! registers a run (inserting an implicit return when the body ends with a
//! bare command call), and `task` orchestrates a task's runs: sync group
//! first, then live group, with per-task exclusion and a timed summary.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use colored::*;

use crate::config::Exclude;
use crate::sandbox::interp::{EvalError, Interpreter};
use crate::sandbox::value::{Builtin, FunctionValue, Value};
use crate::syntax::ast::{Expr, ExprKind, Stmt, StmtKind};

/// Aggregate pass/fail counts across every task executed in one program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub passed: u32,
    pub errors: u32,
}

/// A run that failed, kept for the end-of-task report.
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub name: String,
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Sync,
    Live,
}

struct RunDescriptor {
    name: String,
    func: Rc<FunctionValue>,
    kind: RunKind,
    forced_silent: bool,
}

fn pink(text: &str) -> ColoredString {
    text.truecolor(255, 192, 203)
}

fn run_result(output: String, silent: bool, is_error: bool) -> Value {
    let mut map = BTreeMap::new();
    map.insert("output".to_string(), Value::Str(output));
    map.insert("silent".to_string(), Value::Bool(silent));
    map.insert("isError".to_string(), Value::Bool(is_error));
    Value::Object(map)
}

impl<'a> Interpreter<'a> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match builtin {
            Builtin::Command => Ok(self.builtin_command(&args)),
            Builtin::CommandLive => self.builtin_command_live(&args),
            Builtin::Runs => builtin_runs(&args),
            Builtin::Task => self.builtin_task(args),
        }
    }

    /// `command(cmd, silent = true)`: captured execution, never throws.
    fn builtin_command(&mut self, args: &[Value]) -> Value {
        let silent = args.get(1).map(Value::truthy).unwrap_or(true);
        let Some(Value::Str(cmd)) = args.first() else {
            return run_result(String::new(), silent, true);
        };
        match self.runner.run_captured(cmd) {
            Ok(captured) if captured.success => run_result(captured.output, silent, false),
            _ => run_result(String::new(), silent, true),
        }
    }

    /// `commandLive(cmd, silent = false)`: inherited stdio, throws on a
    /// missing command or spawn failure.
    fn builtin_command_live(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let silent = args.get(1).map(Value::truthy).unwrap_or(false);
        let cmd = match args.first() {
            Some(Value::Str(cmd)) if !cmd.is_empty() => cmd.clone(),
            _ => return Err(EvalError::new("No command is provided.")),
        };
        match self.runner.run_inherited(&cmd, silent) {
            Ok(true) => Ok(run_result(
                "Command exited successfully.".to_string(),
                silent,
                false,
            )),
            Ok(false) => Ok(run_result("Command exited.".to_string(), silent, true)),
            Err(e) => Err(EvalError::new(e.to_string())),
        }
    }

    /// `task(name, setup, runs, config?)`: run the task to completion and
    /// return `{ passed, errors }`.
    fn builtin_task(&mut self, args: Vec<Value>) -> Result<Value, EvalError> {
        let name = args
            .first()
            .map(Value::to_display_string)
            .unwrap_or_default();
        // A task without its own config argument inherits the program's
        // top-level `options` binding.
        let config = match args.get(3) {
            Some(value) if !matches!(value, Value::Undefined) => value.clone(),
            _ => self.lookup("options").unwrap_or(Value::Undefined),
        };
        let silent = config.field("silent").truthy();
        let exclude = parse_exclude(&config.field("exclude"));

        if let Some(Value::Function(setup)) = args.get(1) {
            self.call_function(setup.clone(), Vec::new())?;
        }

        let descriptors = collect_runs(args.get(2), silent)?;
        let (sync_runs, live_runs): (Vec<_>, Vec<_>) = descriptors
            .into_iter()
            .partition(|r| r.kind == RunKind::Sync);

        let started = Instant::now();
        let mut successful = Vec::new();
        let mut failures = Vec::new();

        self.run_sync_group(&sync_runs, exclude, &mut successful, &mut failures)?;
        self.run_live_group(&live_runs, exclude, &mut successful, &mut failures)?;

        summarize(&name, &successful, &failures, silent, started.elapsed().as_secs_f64());

        self.totals.passed += successful.len() as u32;
        self.totals.errors += failures.len() as u32;

        let mut result = BTreeMap::new();
        result.insert("passed".to_string(), Value::Num(successful.len() as f64));
        result.insert("errors".to_string(), Value::Num(failures.len() as f64));
        Ok(Value::Object(result))
    }

    fn run_sync_group(
        &mut self,
        runs: &[RunDescriptor],
        exclude: Option<Exclude>,
        successful: &mut Vec<String>,
        failures: &mut Vec<RunFailure>,
    ) -> Result<(), EvalError> {
        if exclude == Some(Exclude::Sync) {
            println!("\n{}\n", "ℹ Skipping sync runs.".yellow());
            return Ok(());
        }
        println!("{}\n", "ℹ Running regular runs:".yellow());
        for run in runs {
            let result = self.execute_run(run)?;
            if result.field("isError").truthy() {
                println!("{} Run {} failed.", "✖".red(), pink(&run.name));
                failures.push(RunFailure {
                    name: run.name.clone(),
                    output: non_empty(result.field("output")),
                });
            } else {
                println!("{} Run {} ran successfully.", "✔".green(), pink(&run.name));
                if !result.field("silent").truthy() && !run.forced_silent {
                    println!("  {} {}", "└→".blue(), result.field("output").to_display_string().trim_end());
                }
                successful.push(run.name.clone());
            }
        }
        Ok(())
    }

    fn run_live_group(
        &mut self,
        runs: &[RunDescriptor],
        exclude: Option<Exclude>,
        successful: &mut Vec<String>,
        failures: &mut Vec<RunFailure>,
    ) -> Result<(), EvalError> {
        if exclude == Some(Exclude::Live) {
            println!("\n{}\n", "ℹ Skipping live runs.".yellow());
            return Ok(());
        }
        for run in runs {
            println!(
                "\n{}\n",
                format!("ℹ Running live command {} as a child process:", pink(&run.name)).yellow()
            );
            let result = self.execute_run(run)?;
            if result.field("isError").truthy() {
                println!("{}", format!("✖ Run {} failed.", pink(&run.name)).red());
                failures.push(RunFailure {
                    name: run.name.clone(),
                    output: non_empty(result.field("output")),
                });
                continue;
            }
            if !result.field("silent").truthy() && !run.forced_silent {
                println!("  {} {}", "└→".blue(), result.field("output").to_display_string());
            }
            successful.push(run.name.clone());
        }
        Ok(())
    }

    fn execute_run(&mut self, run: &RunDescriptor) -> Result<Value, EvalError> {
        let result = self.call_function(run.func.clone(), Vec::new())?;
        if matches!(result, Value::Object(_)) {
            Ok(result)
        } else {
            // A body with neither a command call nor a return does not
            // conform to the run contract; surface that at the boundary.
            Err(EvalError::new(format!(
                "run '{}' did not produce a result",
                run.name
            )))
        }
    }
}

/// `runs(name, fn)`: registration. The returned entry pairs the name with
/// the (possibly rewritten) run function.
fn builtin_runs(args: &[Value]) -> Result<Value, EvalError> {
    let name = args
        .first()
        .map(Value::to_display_string)
        .unwrap_or_default();
    let Some(Value::Function(func)) = args.get(1) else {
        return Err(EvalError::new("runs requires a function"));
    };

    let mut entry = BTreeMap::new();
    entry.insert("name".to_string(), Value::Str(name));
    entry.insert("run".to_string(), Value::Function(register_run(func)));
    Ok(Value::Object(entry))
}

/// Insert the implicit return: if the body has no explicit return of a
/// command call, the last bare `command(...)`/`commandLive(...)` statement
/// is spliced into a return at the tree level. Bodies with neither are
/// used as-is.
fn register_run(func: &Rc<FunctionValue>) -> Rc<FunctionValue> {
    if has_command_return(&func.body) {
        return func.clone();
    }
    let Some(target) = last_command_call(&func.body) else {
        return func.clone();
    };
    let body = func
        .body
        .iter()
        .map(|stmt| rewrite_stmt(stmt, target))
        .collect();
    Rc::new(FunctionValue {
        params: func.params.clone(),
        body,
        text: func.text.clone(),
    })
}

fn is_command_call(expr: &Expr) -> bool {
    let ExprKind::Call { callee, .. } = &expr.kind else {
        return false;
    };
    matches!(&callee.kind, ExprKind::Ident(name) if name == "command" || name == "commandLive")
}

/// Does any statement (outside nested functions) return a command call?
fn has_command_return(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match &stmt.kind {
        StmtKind::Return(Some(expr)) => is_command_call(expr),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            has_command_return(then_branch)
                || else_branch.as_deref().map(has_command_return).unwrap_or(false)
        }
        StmtKind::Block(inner) => has_command_return(inner),
        _ => false,
    })
}

/// Start offset of the last bare command-call statement, in source order.
fn last_command_call(body: &[Stmt]) -> Option<usize> {
    let mut last = None;
    for stmt in body {
        let found = match &stmt.kind {
            StmtKind::Expr(expr) if is_command_call(expr) => Some(stmt.span.start),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => last_command_call(then_branch)
                .into_iter()
                .chain(else_branch.as_deref().and_then(last_command_call))
                .max(),
            StmtKind::Block(inner) => last_command_call(inner),
            _ => None,
        };
        if let Some(start) = found {
            if last.map_or(true, |prev| start > prev) {
                last = Some(start);
            }
        }
    }
    last
}

fn rewrite_stmt(stmt: &Stmt, target: usize) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Expr(expr) if stmt.span.start == target && is_command_call(expr) => {
            StmtKind::Return(Some(expr.clone()))
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => StmtKind::If {
            cond: cond.clone(),
            then_branch: then_branch.iter().map(|s| rewrite_stmt(s, target)).collect(),
            else_branch: else_branch
                .as_ref()
                .map(|b| b.iter().map(|s| rewrite_stmt(s, target)).collect()),
        },
        StmtKind::Block(inner) => {
            StmtKind::Block(inner.iter().map(|s| rewrite_stmt(s, target)).collect())
        }
        other => other.clone(),
    };
    Stmt {
        kind,
        span: stmt.span,
        line: stmt.line,
    }
}

/// Build the typed run list from the registered entries. Classification is
/// the textual heuristic: a run is live when its function's source text
/// mentions the live primitive.
fn collect_runs(entries: Option<&Value>, forced_silent: bool) -> Result<Vec<RunDescriptor>, EvalError> {
    let Some(Value::Array(entries)) = entries else {
        return Ok(Vec::new());
    };
    let mut descriptors = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.field("name").to_display_string();
        let Value::Function(func) = entry.field("run") else {
            return Err(EvalError::new(format!(
                "run '{}' is missing its function",
                name
            )));
        };
        let kind = if func.text.contains("commandLive") {
            RunKind::Live
        } else {
            RunKind::Sync
        };
        descriptors.push(RunDescriptor {
            name,
            func,
            kind,
            forced_silent,
        });
    }
    Ok(descriptors)
}

fn parse_exclude(value: &Value) -> Option<Exclude> {
    match value {
        Value::Str(s) => match s.as_str() {
            "live" => Some(Exclude::Live),
            "sync" => Some(Exclude::Sync),
            "none" => Some(Exclude::None),
            _ => None,
        },
        _ => None,
    }
}

fn non_empty(output: Value) -> String {
    let text = output.to_display_string();
    if text.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        text
    }
}

fn summarize(
    task_name: &str,
    successful: &[String],
    failures: &[RunFailure],
    silent: bool,
    seconds: f64,
) {
    let completed = format!("ℹ Completed task {} in {:.3}s", pink(task_name), seconds).yellow();
    if !silent {
        println!("\n{}\n", "ℹ Summary:".yellow());
        if !successful.is_empty() {
            println!("{}", format!("✔ {} runs ran successfully.", successful.len()).green());
        }
        if !failures.is_empty() {
            report_failures(failures);
        }
        println!();
        println!("{}", completed);
    } else {
        println!();
        println!("{}", completed);
        println!();
    }
}

fn report_failures(failures: &[RunFailure]) {
    println!();
    println!("{}", format!("✖ {} runs failed to run!", failures.len()).red());
    for (i, failure) in failures.iter().enumerate() {
        let arrow = if i + 1 == failures.len() { "└→" } else { "|→" };
        println!(
            "  {} {} {} {}",
            arrow.red(),
            failure.name.blue(),
            "→".red(),
            failure.output.trim_end()
        );
    }
}
