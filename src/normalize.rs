//! Text normalization: markup stripping, sentence segmentation, dialogue
//! detection, tokenization and lemma lookup.
//!
//! Everything here is total. Empty input gives empty output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon;

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

/// Tags whose whole body is dropped, not just the tag itself.
const BLOCK_TAGS: &[&str] = &["info_panel", "memo", "code", "pre", "script", "style"];

static FENCED_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(?:```|~~~)\w*\s*.*?(?:```|~~~)").unwrap());

static BLOCK_TAG_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCK_TAGS
        .iter()
        .map(|tag| {
            let tag = regex::escape(tag);
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap()
        })
        .collect()
});

static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^.!?]+[.!?]+["\u{201D}]?"#).unwrap());

const DIALOGUE_MARKS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Number of leading characters inspected for a quote mark.
const DIALOGUE_WINDOW_CHARS: usize = 10;

const TOKEN_STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '"', '\u{201C}', '\u{201D}'];

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

/// Upper bound on full passes. One pass nearly always reaches the fixed
/// point; the second only confirms it.
const MAX_STRIP_PASSES: usize = 8;

fn is_emphasis_mark(c: char) -> bool {
    matches!(c, '*' | '_' | '~' | '`')
}

/// Drop runs of emphasis marks pairwise from the left, keeping the text
/// between them. A trailing unpaired run stays.
fn strip_emphasis(text: &str) -> String {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        if is_emphasis_mark(c) {
            if !in_run {
                runs += 1;
            }
            in_run = true;
        } else {
            in_run = false;
        }
    }
    let paired = runs - runs % 2;

    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    in_run = false;
    for c in text.chars() {
        if is_emphasis_mark(c) {
            if !in_run {
                run += 1;
            }
            in_run = true;
            if run > paired {
                out.push(c);
            }
        } else {
            in_run = false;
            out.push(c);
        }
    }
    out
}

/// Blank out double quotes pairwise from the left. An odd last quote stays.
fn flatten_quotes(text: &str) -> String {
    let total = text.matches('"').count();
    let paired = total - total % 2;
    let mut seen = 0;
    text.chars()
        .map(|c| {
            if c != '"' {
                return c;
            }
            seen += 1;
            if seen <= paired {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Blank out every balanced `(`/`)` pair, at any depth, in one scan.
/// Unbalanced parentheses stay.
fn flatten_parens(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let mut open: Vec<usize> = Vec::new();
    for i in 0..chars.len() {
        match chars[i] {
            '(' => open.push(i),
            ')' => {
                if let Some(start) = open.pop() {
                    chars[start] = ' ';
                    chars[i] = ' ';
                }
            }
            _ => {}
        }
    }
    chars.into_iter().collect()
}

fn strip_pass(text: &str) -> String {
    let mut out = FENCED_CODE_RE.replace_all(text, " ").into_owned();
    for re in BLOCK_TAG_RES.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    out = ANY_TAG_RE.replace_all(&out, " ").into_owned();
    out = strip_emphasis(&out);
    out = flatten_quotes(&out);
    out = flatten_parens(&out);
    WHITESPACE_RE.replace_all(&out, " ").trim().to_string()
}

/// Remove code, tags and emphasis markup, flatten quoted and parenthetical
/// spans, and collapse whitespace.
///
/// Every step of a pass is linear in the input. After one pass at most one
/// emphasis run and one double quote remain, and the leftover parentheses
/// are all unbalanced, so a second pass finds nothing to do. Passes still
/// repeat until the text stops changing, bounded by `MAX_STRIP_PASSES`.
pub fn strip_markup(text: &str) -> String {
    let mut current = strip_pass(text);
    for _ in 1..MAX_STRIP_PASSES {
        let next = strip_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentenceKind {
    Dialogue,
    Narration,
}

/// Split cleaned text into sentences.
///
/// A sentence is a run of text ending in `.`, `!` or `?` (possibly several),
/// optionally followed by a closing double quote. Text with no terminator is
/// a single sentence; a trailing fragment after the last terminator is not
/// returned.
pub fn segment_sentences(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let found: Vec<String> = SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if found.is_empty() {
        vec![text.trim().to_string()]
    } else {
        found
    }
}

pub fn classify(sentence: &str) -> SentenceKind {
    let quoted = sentence
        .trim()
        .chars()
        .take(DIALOGUE_WINDOW_CHARS)
        .any(|c| DIALOGUE_MARKS.contains(&c));
    if quoted {
        SentenceKind::Dialogue
    } else {
        SentenceKind::Narration
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn tokenize(sentence: &str) -> Vec<String> {
    let stripped: String = sentence
        .chars()
        .filter(|c| !TOKEN_STRIP_CHARS.contains(c))
        .collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn lemmatize(token: &str) -> String {
    lexicon::lemma_of(token).unwrap_or(token).to_string()
}

/// Lemmas position-aligned with `tokens`.
pub fn lemmatize_all(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| lemmatize(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_and_block_tags() {
        let text = "Before ```rust\nfn main() {}\n``` middle <memo>secret notes</memo> after <b>bold</b>.";
        assert_eq!(strip_markup(text), "Before middle after bold .");
    }

    #[test]
    fn keeps_emphasis_text() {
        assert_eq!(strip_markup("She *really* meant it."), "She really meant it.");
        assert_eq!(strip_markup("a __strong__ word"), "a strong word");
    }

    #[test]
    fn flattens_quotes_and_parens() {
        assert_eq!(
            strip_markup(r#"He said "stay here" (quietly) and left."#),
            "He said stay here quietly and left."
        );
    }

    #[test]
    fn strip_is_idempotent_on_nested_markup() {
        for text in [
            r#"*"(a)"* _b_ ~~c~~ <i>"d"</i>"#,
            "(*)a* __x__y__",
            "\"one\" \"two",
            "",
            "   ",
        ] {
            let once = strip_markup(text);
            assert_eq!(strip_markup(&once), once, "input: {text:?}");
        }
    }

    #[test]
    fn deep_nesting_flattens_in_one_pass() {
        let depth = 20_000;
        let text = format!("{}word{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(strip_pass(&text), "word");
        assert_eq!(strip_markup(&text), "word");

        let quoted = format!("{}word{}", "\"".repeat(depth), "\"".repeat(depth));
        assert_eq!(strip_pass(&quoted), "word");
    }

    #[test]
    fn unbalanced_leftovers_are_stable() {
        let once = strip_pass(")) a (b) ((c \"d\" \"e *f* _g");
        assert_eq!(once, ")) a b ((c d \"e f _g");
        assert_eq!(strip_pass(&once), once);
    }

    #[test]
    fn segments_on_terminal_punctuation() {
        let sentences = segment_sentences("It was late. Was it? Yes!\" she said.");
        assert_eq!(sentences, vec!["It was late.", "Was it?", "Yes!\"", "she said."]);
    }

    #[test]
    fn unterminated_text_is_one_sentence() {
        assert_eq!(segment_sentences("no punctuation here"), vec!["no punctuation here"]);
        assert!(segment_sentences("").is_empty());
    }

    #[test]
    fn classifies_by_leading_quote() {
        assert_eq!(classify("'Come here,' he said."), SentenceKind::Dialogue);
        assert_eq!(classify("The wind howled outside."), SentenceKind::Narration);
        assert_eq!(classify("The wind howled 'outside'."), SentenceKind::Narration);
    }

    #[test]
    fn tokenizes_and_lemmatizes_in_parallel() {
        let tokens = tokenize("Her eyes, dark and wild, went wide!");
        assert_eq!(tokens, vec!["her", "eyes", "dark", "and", "wild", "went", "wide"]);
        let lemmas = lemmatize_all(&tokens);
        assert_eq!(lemmas.len(), tokens.len());
        assert_eq!(lemmas[1], "eye");
        assert_eq!(lemmas[5], "go");
        assert_eq!(lemmas[2], "dark");
    }
}
