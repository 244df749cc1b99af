//! Task Selector
//!
//! Resolves which of the extracted tasks to run: by the `--all` flag, by
//! falling through when there is at most one task, or by asking the user.
//! The interactive prompt itself lives behind the [`TaskPicker`] trait so
//! the CLI can plug in a real prompt and tests can script the answer.

use crate::extract::TaskDecl;
use crate::types::{PlowError, PlowResult};

/// What the user picked when offered the task list plus an "all" entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Task(usize),
    All,
}

/// Interactive single-selection among task names. May block on input.
pub trait TaskPicker {
    fn pick(&self, names: &[String]) -> PlowResult<Choice>;
}

/// Select the tasks to run. With zero or one task, or with `run_all` set,
/// the picker is never consulted.
pub fn select_tasks(
    tasks: &[TaskDecl],
    run_all: bool,
    picker: &dyn TaskPicker,
) -> PlowResult<Vec<TaskDecl>> {
    if run_all || tasks.len() <= 1 {
        return Ok(tasks.to_vec());
    }

    let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
    match picker.pick(&names)? {
        Choice::All => Ok(tasks.to_vec()),
        Choice::Task(index) => {
            let task = tasks.get(index).ok_or_else(|| {
                PlowError::Task(format!("selection {} is out of range", index))
            })?;
            Ok(vec![task.clone()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    struct Scripted(Choice);

    impl TaskPicker for Scripted {
        fn pick(&self, _names: &[String]) -> PlowResult<Choice> {
            Ok(self.0)
        }
    }

    struct Unreachable;

    impl TaskPicker for Unreachable {
        fn pick(&self, _names: &[String]) -> PlowResult<Choice> {
            Err(PlowError::Task("picker should not be consulted".to_string()))
        }
    }

    fn three_tasks() -> Vec<TaskDecl> {
        extract(
            "task(\"a\", () => {}, []);\ntask(\"b\", () => {}, []);\ntask(\"c\", () => {}, []);",
        )
        .tasks
    }

    #[test]
    fn single_task_bypasses_the_picker() {
        let tasks = extract("task(\"only\", () => {}, []);").tasks;
        let selected = select_tasks(&tasks, false, &Unreachable).expect("selects");
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn run_all_bypasses_the_picker() {
        let selected = select_tasks(&three_tasks(), true, &Unreachable).expect("selects");
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn picking_one_task_returns_only_it() {
        let selected = select_tasks(&three_tasks(), false, &Scripted(Choice::Task(1))).expect("selects");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "b");
    }

    #[test]
    fn picking_all_returns_the_full_list() {
        let selected = select_tasks(&three_tasks(), false, &Scripted(Choice::All)).expect("selects");
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn out_of_range_pick_is_an_error() {
        assert!(select_tasks(&three_tasks(), false, &Scripted(Choice::Task(9))).is_err());
    }
}
