//! Option resolution for a single question.
//!
//! Produces the ordered options shown to the user and the prefill value from
//! the question's [`OptionSpec`] and the answer history. Resolution never
//! fails; an empty history simply yields no options.
use crate::clock::{format_date, shift_days, Clock};
use crate::row::DATE_COLUMN;
use crate::survey::{OptionSource, OptionSpec};
use crate::table::HistoryTable;
use std::collections::HashSet;

/// Options and prefill computed for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub options: Vec<String>,
    /// Most recent answer when the options carry `__default__`, else empty.
    pub default: String,
}

impl Resolution {
    /// Prefill for a prompt: the value already in the row wins over the
    /// computed default.
    pub fn prefill<'a>(&'a self, existing: Option<&'a str>) -> &'a str {
        match existing {
            Some(value) if !value.is_empty() => value,
            _ => self.default.as_str(),
        }
    }
}

/// Resolve options for `question` against `history`.
pub fn resolve(
    question: &str,
    spec: &OptionSpec,
    history: &HistoryTable,
    clock: &dyn Clock,
) -> Resolution {
    let options = match &spec.source {
        OptionSource::Past => distinct(
            history
                .column_values_newest_first(question)
                .map(|(_, value)| value),
        ),
        OptionSource::PastDays(days) => {
            let cutoff = format_date(shift_days(clock.today(), -i64::from(*days)));
            distinct(
                history
                    .column_values_newest_first(question)
                    .filter(|(index, _)| history.value(*index, DATE_COLUMN) > cutoff.as_str())
                    .map(|(_, value)| value),
            )
        }
        OptionSource::PastWords => distinct(
            history
                .column_values_newest_first(question)
                .flat_map(|(_, value)| value.split_whitespace()),
        ),
        OptionSource::Explicit(options) => options.clone(),
        OptionSource::None => Vec::new(),
    };

    let default = if spec.default {
        history
            .column_values_newest_first(question)
            .next()
            .map(|(_, value)| value.to_string())
            .unwrap_or_default()
    } else {
        String::new()
    };

    tracing::debug!(
        question,
        source = ?spec.source,
        options = options.len(),
        has_default = !default.is_empty(),
        "options resolved"
    );
    Resolution { options, default }
}

/// Keep the first occurrence of each value, preserving order.
pub(crate) fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::row::Row;
    use chrono::{NaiveDate, NaiveTime};

    fn clock() -> FixedClock {
        FixedClock {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).expect("date"),
            time: NaiveTime::from_hms_opt(9, 30, 0).expect("time"),
        }
    }

    fn history(rows: &[(&str, &str)]) -> HistoryTable {
        let mut table = HistoryTable::default();
        table.ensure_column("tags");
        table.ensure_column("date");
        for (tags, date) in rows {
            let row: Row = [("tags", *tags), ("date", *date)].into_iter().collect();
            table.push_row(&row);
        }
        table
    }

    fn spec(source: OptionSource, default: bool) -> OptionSpec {
        OptionSpec { source, default }
    }

    #[test]
    fn past_is_newest_first_and_distinct() {
        let table = history(&[
            ("run", "2024-06-01"),
            ("swim", "2024-06-02"),
            ("run", "2024-06-03"),
            ("", "2024-06-04"),
        ]);
        let resolution = resolve("tags", &spec(OptionSource::Past, false), &table, &clock());
        assert_eq!(resolution.options, vec!["", "run", "swim"]);
        assert_eq!(resolution.default, "");
    }

    #[test]
    fn past_days_keeps_rows_strictly_after_cutoff() {
        let table = history(&[
            ("ten", "2024-06-05"),
            ("five", "2024-06-10"),
            ("one", "2024-06-14"),
        ]);
        let resolution = resolve("tags", &spec(OptionSource::PastDays(3), false), &table, &clock());
        assert_eq!(resolution.options, vec!["one"]);

        let boundary = resolve("tags", &spec(OptionSource::PastDays(5), false), &table, &clock());
        assert_eq!(boundary.options, vec!["one"]);
    }

    #[test]
    fn past_words_splits_past_answers() {
        let table = history(&[
            ("a b", "2024-06-01"),
            ("c  a", "2024-06-02"),
            ("", "2024-06-03"),
        ]);
        let words = resolve("tags", &spec(OptionSource::PastWords, false), &table, &clock());
        assert_eq!(words.options, vec!["c", "a", "b"]);

        let past = resolve("tags", &spec(OptionSource::Past, false), &table, &clock());
        let from_past: HashSet<String> = past
            .options
            .iter()
            .flat_map(|value| value.split_whitespace().map(str::to_string))
            .collect();
        let from_words: HashSet<String> = words.options.into_iter().collect();
        assert_eq!(from_past, from_words);
    }

    #[test]
    fn explicit_options_ignore_history() {
        let table = history(&[("run", "2024-06-01")]);
        let resolution = resolve(
            "tags",
            &spec(OptionSource::Explicit(vec!["good".into(), "bad".into()]), false),
            &table,
            &clock(),
        );
        assert_eq!(resolution.options, vec!["good", "bad"]);
    }

    #[test]
    fn default_is_last_answer_independent_of_source() {
        let table = history(&[("run", "2024-06-01"), ("swim", "2024-06-02")]);
        let resolution = resolve("tags", &spec(OptionSource::Past, true), &table, &clock());
        assert_eq!(resolution.options, vec!["swim", "run"]);
        assert_eq!(resolution.default, "swim");

        let bare = resolve("tags", &spec(OptionSource::None, true), &table, &clock());
        assert!(bare.options.is_empty());
        assert_eq!(bare.default, "swim");
    }

    #[test]
    fn empty_history_degrades_to_no_options() {
        let table = HistoryTable::default();
        for source in [
            OptionSource::Past,
            OptionSource::PastDays(7),
            OptionSource::PastWords,
            OptionSource::None,
        ] {
            let resolution = resolve("tags", &spec(source, true), &table, &clock());
            assert!(resolution.options.is_empty());
            assert_eq!(resolution.default, "");
        }
    }

    #[test]
    fn existing_value_wins_prefill() {
        let resolution = Resolution {
            options: Vec::new(),
            default: "swim".to_string(),
        };
        assert_eq!(resolution.prefill(Some("run")), "run");
        assert_eq!(resolution.prefill(Some("")), "swim");
        assert_eq!(resolution.prefill(None), "swim");
    }
}
