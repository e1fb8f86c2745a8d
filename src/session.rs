//! Answer collection for one survey run.
//!
//! Two input strategies share the same contract: take a seed row, return the
//! finished row. The incremental strategy walks the questions as an explicit
//! state machine so back-navigation and interrupts stay deterministic; the
//! editor strategy hands the whole row to an external editor.
mod editor;
mod prompt;

#[cfg(test)]
pub use prompt::ScriptedPrompter;
pub use prompt::{Input, LazyTerminalPrompter, Prompter};

use crate::clock::Clock;
use crate::resolve::{distinct, resolve};
use crate::row::Row;
use crate::survey::{Question, Survey};
use crate::table::HistoryTable;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Prompt shown for scalar answers.
const ANSWER_PROMPT: &str = "> ";
const KEY_PROMPT: &str = "key: > ";
const VALUE_PROMPT: &str = "value: > ";
/// Key or value reply that ends (key) or skips (value) a key-value entry.
const KEY_VALUE_SENTINEL: &str = "q";
const MENU_CHOICES: [&str; 6] = ["quit", "q", "write and quit", "wq", "back", "resume"];

/// The user chose to quit; nothing should be written.
#[derive(Debug)]
pub struct SessionAborted;

impl std::fmt::Display for SessionAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("survey aborted by user; nothing written")
    }
}

impl std::error::Error for SessionAborted {}

/// Everything a strategy reads while collecting a row.
pub struct SessionContext<'a> {
    pub survey: &'a Survey,
    pub history: &'a HistoryTable,
    pub clock: &'a dyn Clock,
}

/// How answers are gathered, chosen before the session starts.
#[derive(Debug, Clone)]
pub enum InputStrategy {
    /// One prompt per question, with an interrupt menu.
    Incremental,
    /// The whole row as one JSON document in an external editor.
    Editor { command: Vec<String>, scratch: PathBuf },
}

impl InputStrategy {
    /// Collect a finished row starting from `seed`.
    pub fn collect(
        &self,
        ctx: &SessionContext<'_>,
        seed: Row,
        prompter: &mut dyn Prompter,
    ) -> Result<Row> {
        match self {
            InputStrategy::Incremental => run_incremental(ctx, seed, prompter),
            InputStrategy::Editor { command, scratch } => {
                editor::edit_row(command, scratch, &seed).context("editor input")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AtQuestion(usize),
    Interrupted(usize),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Quit,
    WriteAndQuit,
    Back,
    Resume,
}

fn run_incremental(
    ctx: &SessionContext<'_>,
    seed: Row,
    prompter: &mut dyn Prompter,
) -> Result<Row> {
    let questions = &ctx.survey.questions;
    let mut row = seed;
    let mut state = State::AtQuestion(0);
    loop {
        state = match state {
            State::AtQuestion(index) if index >= questions.len() => State::Done,
            State::AtQuestion(index) => {
                let question = &questions[index];
                match ask(ctx, question, &row, prompter)? {
                    Some(answer) => {
                        row.set(question.name.as_str(), answer);
                        State::AtQuestion(index + 1)
                    }
                    None => State::Interrupted(index),
                }
            }
            State::Interrupted(index) => match interrupt_menu(prompter)? {
                MenuChoice::Quit => return Err(SessionAborted.into()),
                MenuChoice::WriteAndQuit => State::Done,
                MenuChoice::Back => State::AtQuestion(index.saturating_sub(1)),
                MenuChoice::Resume => State::AtQuestion(index),
            },
            State::Done => return Ok(row),
        };
        tracing::trace!(?state, "session transition");
    }
}

/// Ask one question; `None` means the user interrupted.
fn ask(
    ctx: &SessionContext<'_>,
    question: &Question,
    row: &Row,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>> {
    prompter.show(&question.query);
    if question.structured {
        return ask_key_values(ctx.history, &question.name, prompter);
    }

    let spec = ctx.survey.options_for(question);
    let resolution = resolve(&question.name, &spec, ctx.history, ctx.clock);
    if !resolution.options.is_empty() {
        prompter.show(&format_options(&resolution.options));
    }
    let prefill = resolution.prefill(row.get(&question.name));
    match prompter.read_line(ANSWER_PROMPT, prefill, &resolution.options)? {
        Input::Line(answer) => Ok(Some(answer)),
        Input::Interrupt => Ok(None),
    }
}

/// Key-value sub-loop; the mapping is returned as one JSON cell.
fn ask_key_values(
    history: &HistoryTable,
    column: &str,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>> {
    let past = past_mappings(history, column);
    let keys = distinct(past.iter().flat_map(|mapping| mapping.iter().map(|(key, _)| key)));
    let mut response = Row::new();
    loop {
        let key = match prompter.read_line(KEY_PROMPT, "", &keys)? {
            Input::Line(key) => key,
            Input::Interrupt => return Ok(None),
        };
        if key.is_empty() || key == KEY_VALUE_SENTINEL {
            break;
        }
        let values = distinct(past.iter().filter_map(|mapping| mapping.get(&key)));
        let value = match prompter.read_line(VALUE_PROMPT, "", &values)? {
            Input::Line(value) => value,
            Input::Interrupt => return Ok(None),
        };
        if !value.is_empty() && value != KEY_VALUE_SENTINEL {
            response.set(key, value);
        }
    }
    let cell = serde_json::to_string(&response).context("serialize key-value answer")?;
    Ok(Some(cell))
}

/// Past JSON cells of `column`, newest first; unparseable cells are skipped.
fn past_mappings(history: &HistoryTable, column: &str) -> Vec<Row> {
    history
        .column_values_newest_first(column)
        .filter(|(_, cell)| !cell.is_empty())
        .filter_map(|(index, cell)| match serde_json::from_str::<Row>(cell) {
            Ok(mapping) => Some(mapping),
            Err(err) => {
                tracing::warn!(column, row = index, error = %err, "skipping non-object key-value cell");
                None
            }
        })
        .collect()
}

fn interrupt_menu(prompter: &mut dyn Prompter) -> Result<MenuChoice> {
    prompter.show("");
    prompter.show("interrupted");
    prompter.show("  (quit | write and quit | back | resume)");
    let candidates: Vec<String> = MENU_CHOICES.iter().map(|choice| choice.to_string()).collect();
    let reply = match prompter.read_line(ANSWER_PROMPT, "", &candidates)? {
        Input::Line(reply) => reply,
        Input::Interrupt => return Ok(MenuChoice::Quit),
    };
    Ok(match reply.trim() {
        "quit" | "q" => MenuChoice::Quit,
        "write and quit" | "wq" => MenuChoice::WriteAndQuit,
        "back" | "b" => MenuChoice::Back,
        _ => MenuChoice::Resume,
    })
}

fn format_options(options: &[String]) -> String {
    format!("  ({})", options.join(" | "))
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
