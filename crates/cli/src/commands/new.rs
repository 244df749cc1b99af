use anyhow::Result;
use colored::*;
use dialoguer::Input;

const RUNS_TEMPLATE: &str = r#"runs("a passing command", () => {
      command("exit 0");
    }),

    runs("a failing command", () => {
      command("exit 1");
    }),"#;

const OPTIONS_TEMPLATE: &str = "\nconst options = { silent: false, exclude: \"none\" };\n";

fn config_template(name: &str, include_sample: bool, include_options: bool) -> String {
    format!(
        r#"import {{
  task,
  command,
  runs,
  commandLive,
}} from "plow";
{options}
task(
  "{name}",
  () => {{}},
  [
    {body}
  ],
  options
);
"#,
        options = if include_options { OPTIONS_TEMPLATE } else { "" },
        name = name,
        body = if include_sample {
            RUNS_TEMPLATE
        } else {
            "// Commands go here..."
        },
    )
}

pub fn execute(name: Option<String>, include_sample: bool, include_options: bool) -> Result<()> {
    println!(
        "{}\n",
        format!(
            "ℹ Starting generator for config{}:",
            name.as_deref()
                .map(|n| format!(" {}", n.blue()))
                .unwrap_or_default()
        )
        .yellow()
    );

    let name = match name {
        Some(name) => name,
        None => Input::new()
            .with_prompt("What is the name of the config?")
            .interact_text()?,
    };

    if include_sample {
        println!("{} Generated sample runs for {}.", "✔".green(), name.blue());
    }
    if include_options {
        println!(
            "{} Generated options object for {}.\n",
            "✔".green(),
            name.blue()
        );
    }

    let file_name = format!("{}.plow.mjs", name.replace(' ', "-").to_lowercase());
    let cwd = std::env::current_dir()?;
    std::fs::write(
        cwd.join(&file_name),
        config_template(&name, include_sample, include_options),
    )?;

    println!(
        "{}\n",
        format!(
            "ℹ Generator created config file {} in {}.",
            file_name.blue(),
            cwd.display().to_string().blue()
        )
        .yellow()
    );

    Ok(())
}
