//! Option list parsing.
//!
//! Option lists mix literal answers with reserved `__...__` tokens that ask
//! for options derived from history. Tokens are recognized once, here, and
//! resolution only ever matches on the parsed variant.
use regex::Regex;
use std::sync::OnceLock;

const PAST: &str = "__past__";
const PAST_WORDS: &str = "__past_words__";
const DEFAULT: &str = "__default__";

/// Where a question's selectable options come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OptionSource {
    /// Literal options, directive tokens removed.
    Explicit(Vec<String>),
    /// Every past answer, most recent first.
    Past,
    /// Past answers dated strictly after today minus N days.
    PastDays(u32),
    /// Whitespace-separated words of past answers.
    PastWords,
    #[default]
    None,
}

/// Parsed option list: an option source plus the independent prefill flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSpec {
    pub source: OptionSource,
    /// Prefill with the most recent answer.
    pub default: bool,
}

impl OptionSpec {
    /// Parse a raw option list.
    ///
    /// Precedence when several history directives appear: `__past__`, then
    /// `__past_N__`, then `__past_words__`, then the literal options.
    /// Unrecognized `__...__` tokens are dropped without error.
    pub fn parse(tokens: &[String]) -> Self {
        let has = |needle: &str| tokens.iter().any(|token| token == needle);
        let default = has(DEFAULT);

        let source = if has(PAST) {
            OptionSource::Past
        } else if let Some(days) = tokens.iter().find_map(|token| past_days(token)) {
            OptionSource::PastDays(days)
        } else if has(PAST_WORDS) {
            OptionSource::PastWords
        } else {
            let literal: Vec<String> = tokens
                .iter()
                .filter(|token| !token.contains("__"))
                .cloned()
                .collect();
            if tokens.is_empty() {
                OptionSource::None
            } else {
                OptionSource::Explicit(literal)
            }
        };

        Self { source, default }
    }
}

fn past_days(token: &str) -> Option<u32> {
    static PAST_DAYS: OnceLock<Regex> = OnceLock::new();
    let pattern = PAST_DAYS.get_or_init(|| {
        Regex::new(r"^__past_(\d+)__$").expect("past-days pattern is valid")
    });
    let captures = pattern.captures(token)?;
    captures.get(1)?.as_str().parse().ok()
}
