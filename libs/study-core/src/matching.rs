//! Short-answer checking.
//!
//! Answers are compared after normalization (accents stripped, lowercase,
//! punctuation removed). A correct answer may list alternatives separated
//! by "or", `/`, `;` or `|`. A guess matches an alternative when it is equal,
//! within a small edit distance, shares a key word, or overlaps most of its
//! words.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decides whether a typed guess counts as correct.
pub trait AnswerOracle {
    fn is_correct(&self, guess: &str, correct_answer: &str) -> bool;
}

impl<F> AnswerOracle for F
where
    F: Fn(&str, &str) -> bool,
{
    fn is_correct(&self, guess: &str, correct_answer: &str) -> bool {
        self(guess, correct_answer)
    }
}

/// Lenient matcher for typed answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortAnswerMatcher;

/// Share of an alternative's length tolerated as edits (at least one edit).
const EDIT_TOLERANCE: f64 = 0.15;
const KEY_WORD_MIN_LEN: usize = 4;
const OVERLAP_RATIO: f64 = 0.7;
const OVERLAP_MIN_LENGTH_RATIO: f64 = 0.6;

impl AnswerOracle for ShortAnswerMatcher {
    fn is_correct(&self, guess: &str, correct_answer: &str) -> bool {
        let guess = normalize_answer(guess);
        if guess.is_empty() {
            return false;
        }

        split_alternatives(correct_answer).iter().any(|answer| {
            if guess == *answer {
                return true;
            }

            let allowed = ((answer.chars().count() as f64 * EDIT_TOLERANCE).ceil() as usize).max(1);
            if levenshtein_distance(&guess, answer) <= allowed {
                return true;
            }

            shares_key_word(&guess, answer) || has_high_word_overlap(&guess, answer)
        })
    }
}

/// Fold an answer to lowercase ASCII words separated by single spaces.
pub fn normalize_answer(s: &str) -> String {
    let folded: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect::<String>()
        .to_lowercase();

    let cleaned: String = folded
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_alternatives(answer: &str) -> Vec<String> {
    answer
        .split(['/', ';', '|'])
        .flat_map(split_on_or)
        .map(|part| normalize_answer(&part))
        .filter(|part| !part.is_empty())
        .collect()
}

/// Split on a standalone "or" that has words on both sides.
fn split_on_or(part: &str) -> Vec<String> {
    let words: Vec<&str> = part.split_whitespace().collect();
    let mut parts = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        let is_separator = word.eq_ignore_ascii_case("or") && !current.is_empty() && i + 1 < words.len();
        if is_separator {
            parts.push(current.join(" "));
            current.clear();
        } else {
            current.push(*word);
        }
    }
    if !current.is_empty() {
        parts.push(current.join(" "));
    }
    parts
}

fn shares_key_word(guess: &str, target: &str) -> bool {
    let guess_words: std::collections::HashSet<&str> = guess
        .split(' ')
        .filter(|w| w.len() >= KEY_WORD_MIN_LEN)
        .collect();
    target
        .split(' ')
        .any(|w| w.len() >= KEY_WORD_MIN_LEN && guess_words.contains(w))
}

fn has_high_word_overlap(guess: &str, target: &str) -> bool {
    let target_words: Vec<&str> = target.split(' ').collect();
    if target_words.is_empty() {
        return false;
    }
    let target_set: std::collections::HashSet<&str> = target_words.iter().copied().collect();
    let shared = guess.split(' ').filter(|w| target_set.contains(w)).count();
    let overlap = shared as f64 / target_words.len() as f64;

    overlap >= OVERLAP_RATIO && guess.len() as f64 >= target.len() as f64 * OVERLAP_MIN_LENGTH_RATIO
}

/// Calculate Levenshtein distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rolling rows
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
