//! Per-format answer correctness rules.

use super::question::{Question, QuestionFormat, split_sequence};
use tracing::{instrument, trace};

/// Decides whether a submitted answer matches a question's canonical answer.
///
/// Pure and side-effect free; scoring is applied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerEvaluator;

impl AnswerEvaluator {
    /// Evaluates `submission` against `question`, dispatching on its format.
    #[instrument(skip(question), fields(question_id = %question.id(), format = %question.format()))]
    pub fn is_correct(question: &Question, submission: &str) -> bool {
        let correct = match question.format() {
            QuestionFormat::Number => Self::number_matches(&question.answer().canonical(), submission),
            QuestionFormat::Letter => Self::letter_matches(&question.answer().canonical(), submission),
            QuestionFormat::Order => Self::order_matches(&question.answer().tokens(), submission),
            QuestionFormat::MultipleChoice | QuestionFormat::Exact => {
                question.answer().canonical() == submission
            }
        };
        trace!(correct, "Evaluated submission");
        correct
    }

    /// Integer comparison. Unparseable values never match.
    pub fn number_matches(canonical: &str, submission: &str) -> bool {
        match (parse_leading_integer(canonical), parse_leading_integer(submission)) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }

    /// The accepted token is the whole answer when it is one character long,
    /// otherwise its first character. Any space-separated token may match.
    pub fn letter_matches(canonical: &str, submission: &str) -> bool {
        let accepted: String = if canonical.chars().count() == 1 {
            canonical.to_string()
        } else {
            match canonical.chars().next() {
                Some(first) => first.to_string(),
                None => return false,
            }
        };
        submission.split(' ').any(|token| token == accepted)
    }

    /// Element-wise, in-order comparison of trimmed comma-separated tokens.
    pub fn order_matches(expected: &[String], submission: &str) -> bool {
        let given = split_sequence(submission);
        given.len() == expected.len() && given.iter().zip(expected).all(|(a, b)| a == b)
    }
}

/// Reads a leading integer the way a lenient integer parser does: leading
/// whitespace and an optional sign are accepted, reading stops at the first
/// non-digit, and no digits at all means no value.
///
/// Yields the sign and the digits without leading zeros, so integers of any
/// length compare exactly. Zero is always unsigned.
fn parse_leading_integer(raw: &str) -> Option<(bool, &str)> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }
    match digits.trim_start_matches('0') {
        "" => Some((false, "0")),
        significant => Some((negative, significant)),
    }
}
