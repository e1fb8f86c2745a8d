//! Survey schema loading.
//!
//! A survey is an ordered list of questions plus a `daily` flag and an
//! optional survey-wide option list. Option lists are parsed into an
//! [`OptionSpec`] once, at load time.
mod directive;

pub use directive::{OptionSource, OptionSpec};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One question of a survey, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub query: String,
    /// Parsed option list; `None` falls back to the survey default.
    pub options: Option<OptionSpec>,
    /// Answer is a key-value mapping stored as one JSON cell.
    pub structured: bool,
}

/// An immutable survey schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
    pub name: String,
    pub questions: Vec<Question>,
    pub daily: bool,
    pub default_options: Option<OptionSpec>,
}

impl Survey {
    /// Load `path` as the survey called `name`.
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(anyhow!("survey not found at {}", path.display()));
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("read survey {}", path.display()))?;
        Self::parse(name, &text).with_context(|| format!("parse survey {}", path.display()))
    }

    /// Parse survey YAML text.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let raw: RawSurvey = serde_yaml::from_str(text).context("parse survey YAML")?;
        let mut questions = Vec::with_capacity(raw.questions.len());
        for (key, value) in raw.questions {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => {
                    return Err(anyhow!(
                        "question names must be strings, got {}",
                        describe_yaml(&other)
                    ))
                }
            };
            let raw_question: RawQuestion = serde_yaml::from_value(value)
                .with_context(|| format!("parse question {name}"))?;
            questions.push(Question {
                query: raw_question.query.unwrap_or_else(|| name.clone()),
                options: raw_question.options.map(|list| OptionSpec::parse(&list.0)),
                structured: raw_question
                    .key_value
                    .as_ref()
                    .is_some_and(structured_flag),
                name,
            });
        }
        Ok(Self {
            name: name.to_string(),
            questions,
            daily: raw.daily,
            default_options: raw.default_options.map(|list| OptionSpec::parse(&list.0)),
        })
    }

    /// Question names in schema order.
    pub fn question_names(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|question| question.name.as_str())
    }

    /// Effective option list for `question`.
    pub fn options_for(&self, question: &Question) -> OptionSpec {
        question
            .options
            .clone()
            .or_else(|| self.default_options.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct RawSurvey {
    questions: serde_yaml::Mapping,
    #[serde(default)]
    daily: bool,
    #[serde(default)]
    default_options: Option<OptionList>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    options: Option<OptionList>,
    #[serde(default, rename = "key-value")]
    key_value: Option<serde_yaml::Value>,
}

/// Either a YAML list of options or a single option string.
#[derive(Debug, Deserialize)]
#[serde(from = "OneOrMany")]
struct OptionList(Vec<String>);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<serde_yaml::Value>),
}

impl From<OneOrMany> for OptionList {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(item) => OptionList(vec![item]),
            OneOrMany::Many(items) => OptionList(items.iter().filter_map(scalar_text).collect()),
        }
    }
}

/// YAML scalars keep their written form so `- 7` and `- yes` stay options.
fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// `key-value:` marks a structured question unless explicitly `false`.
fn structured_flag(value: &serde_yaml::Value) -> bool {
    !matches!(value, serde_yaml::Value::Bool(false))
}

fn describe_yaml(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| "<unprintable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOOD: &str = r#"
daily: true
default_options: [__past__]
questions:
  mood:
    query: "mood?"
    options: [good, bad]
  sleep:
    query: hours slept?
    options: __default__
  notes:
    query: anything else?
  meds:
    query: meds taken
    key-value: true
"#;

    #[test]
    fn parses_questions_in_schema_order() {
        let survey = Survey::parse("mood", MOOD).expect("parse");
        assert!(survey.daily);
        let names: Vec<&str> = survey.question_names().collect();
        assert_eq!(names, vec!["mood", "sleep", "notes", "meds"]);
        assert_eq!(survey.questions[0].query, "mood?");
        assert!(survey.questions[3].structured);
        assert!(!survey.questions[0].structured);
    }

    #[test]
    fn question_without_options_uses_survey_default() {
        let survey = Survey::parse("mood", MOOD).expect("parse");
        let notes = &survey.questions[2];
        assert!(notes.options.is_none());
        assert_eq!(survey.options_for(notes).source, OptionSource::Past);

        let sleep = &survey.questions[1];
        let spec = survey.options_for(sleep);
        assert!(spec.default);
        assert_eq!(spec.source, OptionSource::None);
    }

    #[test]
    fn daily_defaults_to_false_and_numbers_stay_options() {
        let survey = Survey::parse(
            "scale",
            "questions:\n  energy:\n    query: energy\n    options: [1, 2, 3]\n",
        )
        .expect("parse");
        assert!(!survey.daily);
        assert_eq!(
            survey.options_for(&survey.questions[0]).source,
            OptionSource::Explicit(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn key_value_false_is_scalar() {
        let survey = Survey::parse(
            "s",
            "questions:\n  q:\n    query: q\n    key-value: false\n",
        )
        .expect("parse");
        assert!(!survey.questions[0].structured);
    }

    #[test]
    fn missing_questions_is_a_schema_error() {
        let err = Survey::parse("broken", "daily: true\n").expect_err("schema error");
        assert!(format!("{err:#}").contains("questions"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("nope.yaml");
        let err = Survey::load("nope", &path).expect_err("missing survey");
        assert!(err.to_string().contains("nope.yaml"));
    }
}
