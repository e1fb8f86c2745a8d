//! Line input for the incremental session.
//!
//! The session only sees the [`Prompter`] trait; the terminal implementation
//! lives here so completion and prefill stay out of the state machine.
use anyhow::{Context, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::Editor;
#[cfg(test)]
use std::collections::VecDeque;

/// One reply from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C or end of input.
    Interrupt,
}

/// Blocking line reader with prefill and completion candidates.
pub trait Prompter {
    /// Print an informational line above the next prompt.
    fn show(&mut self, text: &str);

    /// Read one line. `prefill` is editable initial text; `candidates` are
    /// offered for prefix completion.
    fn read_line(&mut self, prompt: &str, prefill: &str, candidates: &[String]) -> Result<Input>;
}

/// Completion of the word under the cursor over an explicit candidate list.
#[derive(Debug, Default)]
struct CandidateHelper {
    candidates: Vec<String>,
}

impl Completer for CandidateHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = complete_word(&self.candidates, line, pos);
        let matches = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, matches))
    }
}

/// Start of the whitespace-delimited word ending at `pos`, and the
/// candidates extending it.
fn complete_word(candidates: &[String], line: &str, pos: usize) -> (usize, Vec<String>) {
    let typed = &line[..pos];
    let start = typed
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(index, ch)| index + ch.len_utf8());
    (start, matching_candidates(candidates, &typed[start..]))
}

fn matching_candidates(candidates: &[String], typed: &str) -> Vec<String> {
    candidates
        .iter()
        .filter(|candidate| candidate.starts_with(typed))
        .cloned()
        .collect()
}

impl Hinter for CandidateHelper {
    type Hint = String;
}

impl Highlighter for CandidateHelper {}

impl Validator for CandidateHelper {}

impl rustyline::Helper for CandidateHelper {}

/// Interactive terminal prompter.
struct TerminalPrompter {
    editor: Editor<CandidateHelper, DefaultHistory>,
}

impl TerminalPrompter {
    fn new() -> Result<Self> {
        let mut editor =
            Editor::<CandidateHelper, DefaultHistory>::new().context("initialize line editor")?;
        editor.set_helper(Some(CandidateHelper::default()));
        Ok(Self { editor })
    }
}

impl Prompter for TerminalPrompter {
    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self, prompt: &str, prefill: &str, candidates: &[String]) -> Result<Input> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.candidates = candidates.to_vec();
        }
        match self.editor.readline_with_initial(prompt, (prefill, "")) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Input::Interrupt),
            Err(err) => Err(err).context("read line"),
        }
    }
}

/// Terminal prompter opened on first read, so runs that never prompt leave
/// the terminal alone.
#[derive(Default)]
pub struct LazyTerminalPrompter {
    inner: Option<TerminalPrompter>,
}

impl Prompter for LazyTerminalPrompter {
    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self, prompt: &str, prefill: &str, candidates: &[String]) -> Result<Input> {
        let terminal = match self.inner.take() {
            Some(terminal) => terminal,
            None => TerminalPrompter::new()?,
        };
        self.inner.insert(terminal).read_line(prompt, prefill, candidates)
    }
}

/// Prompter replaying a fixed script; records everything it was shown.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    script: VecDeque<Input>,
    pub shown: Vec<String>,
    pub prompts: Vec<(String, String)>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(script: impl IntoIterator<Item = Input>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Script of plain lines.
    pub fn lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().map(|line| Input::Line(line.to_string())))
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    /// An exhausted script behaves like end of input.
    fn read_line(&mut self, prompt: &str, prefill: &str, _candidates: &[String]) -> Result<Input> {
        self.prompts.push((prompt.to_string(), prefill.to_string()));
        Ok(self.script.pop_front().unwrap_or(Input::Interrupt))
    }
}
