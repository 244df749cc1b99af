use std::path::Path;

use anyhow::Result;
use colored::*;
use dialoguer::Select;
use plow_core::discovery::{find_config_files, match_config_name};
use plow_core::extract::extract;
use plow_core::lower::lower;
use plow_core::sandbox::{run_program, ShellRunner};
use plow_core::select::{select_tasks, Choice, TaskPicker};
use plow_core::synth::synthesize;
use plow_core::{PlowError, PlowResult};

/// Interactive task selection backed by a terminal prompt.
struct PromptPicker;

impl TaskPicker for PromptPicker {
    fn pick(&self, names: &[String]) -> PlowResult<Choice> {
        let mut items: Vec<String> = names.to_vec();
        items.push("all".to_string());
        let index = Select::new()
            .with_prompt("Which task would you like to execute?")
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| PlowError::Task(e.to_string()))?;
        if index == names.len() {
            Ok(Choice::All)
        } else {
            Ok(Choice::Task(index))
        }
    }
}

pub async fn execute(name: Option<String>, all: bool) -> Result<()> {
    // An interrupt only suppresses the pending status line; it does not
    // abort an in-flight subprocess.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
        }
    });

    let cwd = std::env::current_dir()?;

    println!(
        "{}\n",
        format!(
            "ℹ Starting runner for config{}:",
            name.as_deref()
                .map(|n| format!(" {}", n.blue()))
                .unwrap_or_default()
        )
        .yellow()
    );

    let config_name = resolve_config(&cwd, name.as_deref()).await?;
    let source = tokio::fs::read_to_string(cwd.join(&config_name)).await?;

    let extracted = extract(&source);
    if extracted.tasks.is_empty() {
        println!("{}", "✖ No tasks found!".red());
        std::process::exit(1);
    }

    let selected = select_tasks(&extracted.tasks, all, &PromptPicker)?;
    let program = synthesize(&extracted.options, &selected);
    let final_text = lower(&program)?;

    let task_names = selected
        .iter()
        .map(|t| t.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "\n{}\n",
        format!("ℹ Running task {}:", task_names.blue()).yellow()
    );

    match run_program(&final_text, &ShellRunner) {
        Ok(_totals) => Ok(()),
        Err(e) => {
            println!("{}", "✖ Something went wrong!".red());
            println!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Resolve which config file to run: a provided name is substring-matched
/// against the discovered files; otherwise a single discovered file is
/// used directly and several prompt for a choice.
async fn resolve_config(cwd: &Path, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        if let Some(matched) = match_config_name(cwd, name).await? {
            return Ok(matched);
        }
    }

    let files = find_config_files(cwd).await?;
    match files.len() {
        0 => anyhow::bail!("No config files found in the current directory"),
        1 => files
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no config file")),
        _ => {
            let index = Select::new()
                .with_prompt("Which config file would you like to run?")
                .items(&files)
                .default(0)
                .interact()?;
            files
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("invalid selection"))
        }
    }
}
