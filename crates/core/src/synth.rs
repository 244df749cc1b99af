//! Program Synthesizer
//!
//! Builds a minimal, standalone program from the extracted options and the
//! selected tasks: a restated `options` declaration (serialized from the
//! in-memory value, which normalizes formatting and drops comments)
//! followed by each task's verbatim source text. Imports are intentionally
//! dropped: the program runs in a context where the runner primitives are
//! already bound, so import statements would be unresolvable there.

use crate::config::TaskOptions;
use crate::extract::TaskDecl;

/// Synthesize the intermediate program text for the selected tasks, in
/// their original discovery order.
pub fn synthesize(options: &TaskOptions, tasks: &[TaskDecl]) -> String {
    let mut out = format!("const options = {};\n", options.to_literal());
    for task in tasks {
        out.push('\n');
        let text = task.text.trim_end();
        out.push_str(text);
        if !text.ends_with(';') {
            out.push(';');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Exclude;
    use crate::extract::extract;

    const SAMPLE: &str = r#"
import { task, command, runs } from "plow";

const options = { silent: true, exclude: "none" };

task("first", () => {}, [
  runs("r", () => {
    command("exit 0");
  }),
], options);

task("second", () => {}, [], options);
"#;

    #[test]
    fn single_task_round_trips_through_extraction() {
        let extracted = extract(SAMPLE);
        let program = synthesize(&extracted.options, &extracted.tasks[..1]);

        let reextracted = extract(&program);
        assert_eq!(reextracted.tasks.len(), 1);
        assert_eq!(reextracted.tasks[0].name, "first");
        assert_eq!(reextracted.options, extracted.options);
    }

    #[test]
    fn task_text_appears_verbatim() {
        let extracted = extract(SAMPLE);
        let program = synthesize(&extracted.options, &extracted.tasks);
        for task in &extracted.tasks {
            assert!(program.contains(task.text.trim_end()));
        }
    }

    #[test]
    fn options_are_restated_not_copied() {
        let extracted = extract("const options = { /* noisy */ silent: true };\ntask(\"t\", () => {}, []);");
        let program = synthesize(&extracted.options, &extracted.tasks);
        assert!(program.contains("\"silent\": true"));
        assert!(!program.contains("noisy"));
    }

    #[test]
    fn imports_are_dropped() {
        let extracted = extract(SAMPLE);
        assert!(!extracted.imports.is_empty());
        let program = synthesize(&extracted.options, &extracted.tasks);
        assert!(!program.contains("import"));
    }

    #[test]
    fn discovery_order_is_preserved() {
        let extracted = extract(SAMPLE);
        let program = synthesize(&extracted.options, &extracted.tasks);
        let first = program.find("\"first\"").expect("first task present");
        let second = program.find("\"second\"").expect("second task present");
        assert!(first < second);
        let names: Vec<String> = extract(&program).tasks.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn restated_options_survive_reextraction() {
        let options = TaskOptions {
            silent: Some(false),
            exclude: Some(Exclude::Live),
        };
        let program = synthesize(&options, &[]);
        assert_eq!(extract(&program).options, options);
    }
}
