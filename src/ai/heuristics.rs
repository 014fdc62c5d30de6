//! Checks used to decide whether model output can be trusted.
//!
//! Each predicate looks at one failure mode in isolation. The grammar
//! policy composes them and falls back to the user's original text
//! whenever any of them fire, so a bad correction never replaces what
//! the agent typed.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static REFUSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\{.*\}$|cannot fulfill|unable to process|as an ai language model|i am not able to|i cannot provide|not possible to|sorry, but|i'm just a language model|here is the corrected text:",
    )
    .expect("hardcoded regex")
});

static INSTRUCTION_ECHO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)output only the corrected text|your corrected output:|the user will now provide|user text:",
    )
    .expect("hardcoded regex")
});

// Misspellings common enough that a model returning them untouched
// almost certainly ignored the instruction.
static KNOWN_MISSPELLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(gooda|teh|yestaday|buyed|isnt|walked|dont|doesnt|youre|theyre|theres)\b",
    )
    .expect("hardcoded regex")
});

const MAX_LENGTH_RATIO: f64 = 2.5;
const MIN_LENGTH_RATIO: f64 = 0.2;
const MIN_WORD_OVERLAP: f64 = 0.3;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Case-insensitive comparison ignoring surrounding whitespace.
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// The model declined the task or wrapped its answer in commentary.
pub fn is_refusal(output: &str) -> bool {
    REFUSAL.is_match(output)
}

/// The model repeated parts of the system prompt back.
pub fn is_instruction_echo(output: &str) -> bool {
    INSTRUCTION_ECHO.is_match(output)
}

pub fn is_suspiciously_short(original: &str, output: &str) -> bool {
    char_len(output) < 2 && char_len(original) >= 2
}

pub fn has_known_misspelling(text: &str) -> bool {
    KNOWN_MISSPELLING.is_match(text)
}

/// The output came back untouched even though the original has an
/// obvious error in it.
pub fn is_unchanged_with_known_misspelling(original: &str, output: &str) -> bool {
    same_text(original, output) && has_known_misspelling(original)
}

/// The output is far longer or far shorter than the original.
pub fn is_drastic_length_change(original: &str, output: &str) -> bool {
    let original_len = char_len(original) as f64;
    let output_len = char_len(output) as f64;
    output_len > original_len * MAX_LENGTH_RATIO || output_len < original_len * MIN_LENGTH_RATIO
}

fn significant_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Fewer than 30% of the original's significant words (longer than 2
/// characters) survive in the output. Texts with 3 or fewer
/// significant words are too short to judge.
pub fn is_low_word_overlap(original: &str, output: &str) -> bool {
    let original_words = significant_words(original);
    if original_words.len() <= 3 {
        return false;
    }
    let output_words: HashSet<String> = significant_words(output).into_iter().collect();
    let common = original_words
        .iter()
        .filter(|w| output_words.contains(*w))
        .count();
    (common as f64) < (original_words.len() as f64) * MIN_WORD_OVERLAP
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Refusal,
    InstructionEcho,
    TooShort,
    UnchangedWithMisspelling,
    HallucinatedRewrite,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            FallbackReason::Refusal => "model refused or added commentary",
            FallbackReason::InstructionEcho => "model echoed its instructions",
            FallbackReason::TooShort => "model output was too short",
            FallbackReason::UnchangedWithMisspelling => {
                "model left a known misspelling uncorrected"
            }
            FallbackReason::HallucinatedRewrite => {
                "model rewrote the text instead of correcting it"
            }
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarVerdict {
    Accept,
    Fallback(FallbackReason),
}

/// Decide whether a grammar correction can replace the original text.
pub fn check_grammar_fix(original: &str, output: &str) -> GrammarVerdict {
    let reason = if is_refusal(output) {
        Some(FallbackReason::Refusal)
    } else if is_instruction_echo(output) {
        Some(FallbackReason::InstructionEcho)
    } else if is_suspiciously_short(original, output) {
        Some(FallbackReason::TooShort)
    } else if is_unchanged_with_known_misspelling(original, output) {
        Some(FallbackReason::UnchangedWithMisspelling)
    } else if !same_text(original, output)
        && is_drastic_length_change(original, output)
        && is_low_word_overlap(original, output)
    {
        Some(FallbackReason::HallucinatedRewrite)
    } else {
        None
    };

    match reason {
        Some(reason) => GrammarVerdict::Fallback(reason),
        None => GrammarVerdict::Accept,
    }
}
