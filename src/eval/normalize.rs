//! Answer normalization.
//!
//! Free-text answers are mapped to a canonical form before comparison:
//!
//! 1. newlines and tabs become spaces, surrounding whitespace is trimmed and
//!    the text is lowercased;
//! 2. punctuation is removed, or replaced by a space when it glues two words
//!    together (`"black/white"` -> `"black white"`);
//! 3. periods are dropped unless they sit between two digits (`"3.5"` stays);
//! 4. number words become digits (`"ten"` -> `"10"`), the articles `a`, `an`
//!    and `the` are dropped, and common apostrophe-less contractions are
//!    restored (`"dont"` -> `"don't"`);
//! 5. words are joined with single spaces.
//!
//! The result is idempotent: normalizing a normalized answer returns it
//! unchanged.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static NUMBER_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9],[0-9]").expect("Invalid number comma pattern"));

static PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.").expect("Invalid period pattern"));

/// Punctuation handled by step 2. Periods and apostrophes are not listed.
const PUNCTUATION: &[char] = &[
    ';', '/', '[', ']', '"', '{', '}', '(', ')', '=', '+', '\\', '_', '-', '>', '<', '@', '`',
    ',', '?', '!',
];

const ARTICLES: &[&str] = &["a", "an", "the"];

const NUMBER_WORDS: &[(&str, &str)] = &[
    ("none", "0"),
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
];

// No replacement may itself appear as a key.
const CONTRACTIONS: &[(&str, &str)] = &[
    ("aint", "ain't"),
    ("arent", "aren't"),
    ("cant", "can't"),
    ("couldve", "could've"),
    ("couldnt", "couldn't"),
    ("couldn'tve", "couldn't've"),
    ("couldnt've", "couldn't've"),
    ("didnt", "didn't"),
    ("doesnt", "doesn't"),
    ("dont", "don't"),
    ("hadnt", "hadn't"),
    ("hadnt've", "hadn't've"),
    ("hadn'tve", "hadn't've"),
    ("hasnt", "hasn't"),
    ("havent", "haven't"),
    ("hed", "he'd"),
    ("hed've", "he'd've"),
    ("he'dve", "he'd've"),
    ("hes", "he's"),
    ("howd", "how'd"),
    ("howll", "how'll"),
    ("hows", "how's"),
    ("id've", "i'd've"),
    ("i'dve", "i'd've"),
    ("im", "i'm"),
    ("ive", "i've"),
    ("isnt", "isn't"),
    ("itd", "it'd"),
    ("itd've", "it'd've"),
    ("it'dve", "it'd've"),
    ("itll", "it'll"),
    ("lets", "let's"),
    ("maam", "ma'am"),
    ("mightnt", "mightn't"),
    ("mightnt've", "mightn't've"),
    ("mightn'tve", "mightn't've"),
    ("mightve", "might've"),
    ("mustnt", "mustn't"),
    ("mustve", "must've"),
    ("neednt", "needn't"),
    ("notve", "not've"),
    ("oclock", "o'clock"),
    ("oughtnt", "oughtn't"),
    ("shant", "shan't"),
    ("shed've", "she'd've"),
    ("she'dve", "she'd've"),
    ("shes", "she's"),
    ("shouldve", "should've"),
    ("shouldnt", "shouldn't"),
    ("shouldnt've", "shouldn't've"),
    ("shouldn'tve", "shouldn't've"),
    ("somebodyd", "somebody'd"),
    ("somebodyd've", "somebody'd've"),
    ("somebody'dve", "somebody'd've"),
    ("somebodyll", "somebody'll"),
    ("somebodys", "somebody's"),
    ("someoned", "someone'd"),
    ("someoned've", "someone'd've"),
    ("someone'dve", "someone'd've"),
    ("someonell", "someone'll"),
    ("someones", "someone's"),
    ("somethingd", "something'd"),
    ("somethingd've", "something'd've"),
    ("something'dve", "something'd've"),
    ("somethingll", "something'll"),
    ("thats", "that's"),
    ("thered", "there'd"),
    ("thered've", "there'd've"),
    ("there'dve", "there'd've"),
    ("therere", "there're"),
    ("theres", "there's"),
    ("theyd", "they'd"),
    ("theyd've", "they'd've"),
    ("they'dve", "they'd've"),
    ("theyll", "they'll"),
    ("theyre", "they're"),
    ("theyve", "they've"),
    ("twas", "'twas"),
    ("wasnt", "wasn't"),
    ("wed've", "we'd've"),
    ("we'dve", "we'd've"),
    ("weve", "we've"),
    ("werent", "weren't"),
    ("whatll", "what'll"),
    ("whatre", "what're"),
    ("whats", "what's"),
    ("whatve", "what've"),
    ("whens", "when's"),
    ("whered", "where'd"),
    ("wheres", "where's"),
    ("whereve", "where've"),
    ("whod", "who'd"),
    ("whod've", "who'd've"),
    ("who'dve", "who'd've"),
    ("wholl", "who'll"),
    ("whos", "who's"),
    ("whove", "who've"),
    ("whyll", "why'll"),
    ("whyre", "why're"),
    ("whys", "why's"),
    ("wont", "won't"),
    ("wouldve", "would've"),
    ("wouldnt", "wouldn't"),
    ("wouldnt've", "wouldn't've"),
    ("wouldn'tve", "wouldn't've"),
    ("yall", "y'all"),
    ("yall'll", "y'all'll"),
    ("y'allll", "y'all'll"),
    ("yall'd've", "y'all'd've"),
    ("y'alld've", "y'all'd've"),
    ("y'all'dve", "y'all'd've"),
    ("youd", "you'd"),
    ("youd've", "you'd've"),
    ("you'dve", "you'd've"),
    ("youll", "you'll"),
    ("youre", "you're"),
    ("youve", "you've"),
];

/// Normalize a raw answer into its canonical comparable form.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace(['\n', '\t'], " ").trim().to_lowercase();
    let text = strip_punctuation(&text);
    let text = strip_periods(&text);

    text.split_whitespace()
        .filter_map(canonical_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove or space out punctuation.
///
/// A mark is deleted when it already touches a space, or when the text holds a
/// digit-comma-digit group (so `"1,000"` becomes `"1000"`); otherwise it is
/// replaced by a space.
fn strip_punctuation(text: &str) -> String {
    let has_number_comma = NUMBER_COMMA.is_match(text);
    let mut out = text.to_string();

    for &mark in PUNCTUATION {
        if !out.contains(mark) {
            continue;
        }
        let touches_space = text.contains(&format!("{} ", mark)) || text.contains(&format!(" {}", mark));
        let replacement = if touches_space || has_number_comma { "" } else { " " };
        out = out.replace(mark, replacement);
    }

    out
}

/// Drop every period that is not a decimal point.
fn strip_periods(text: &str) -> String {
    let bytes = text.as_bytes();
    PERIOD
        .replace_all(text, |caps: &Captures| {
            let decimal = caps.get(0).is_some_and(|m| {
                m.start() > 0
                    && bytes[m.start() - 1].is_ascii_digit()
                    && bytes.get(m.end()).is_some_and(u8::is_ascii_digit)
            });
            if decimal { "." } else { "" }
        })
        .into_owned()
}

fn canonical_word(word: &str) -> Option<&str> {
    if ARTICLES.contains(&word) {
        return None;
    }
    let word = lookup(NUMBER_WORDS, word).unwrap_or(word);
    Some(lookup(CONTRACTIONS, word).unwrap_or(word))
}

fn lookup(table: &'static [(&'static str, &'static str)], word: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| *to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_whitespace() {
        assert_eq!(normalize("  Yes  "), "yes");
        assert_eq!(normalize("Red\tand\nWhite"), "red and white");
        assert_eq!(normalize("two   dogs"), "2 dogs");
    }

    #[test]
    fn test_number_words() {
        assert_eq!(normalize("Ten"), "10");
        assert_eq!(normalize("none"), "0");
        assert_eq!(normalize("three cats"), "3 cats");
    }

    #[test]
    fn test_articles_removed() {
        assert_eq!(normalize("A dog"), "dog");
        assert_eq!(normalize("the man on an elephant"), "man on elephant");
        assert_eq!(normalize("the"), "");
    }

    #[test]
    fn test_contractions() {
        assert_eq!(normalize("dont know"), "don't know");
        assert_eq!(normalize("it's"), "it's");
        assert_eq!(normalize("oclock"), "o'clock");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(normalize("yes!"), "yes");
        assert_eq!(normalize("black/white"), "black white");
        assert_eq!(normalize("left , right"), "left right");
        assert_eq!(normalize("(tennis)"), "tennis");
        assert_eq!(normalize("1,000"), "1000");
        assert_eq!(normalize("red, 1,000 (approx)"), "red 1000 approx");
        assert_eq!(normalize("red,blue"), "red blue");
    }

    #[test]
    fn test_periods() {
        assert_eq!(normalize("yes."), "yes");
        assert_eq!(normalize("3.5"), "3.5");
        assert_eq!(normalize("st. louis"), "st louis");
        assert_eq!(normalize(".5"), "5");
        assert_eq!(normalize("1.2.3"), "1.2.3");
        assert_eq!(normalize("2..5"), "25");
        assert_eq!(normalize("5."), "5");
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ?! "), "");
        assert_ne!(normalize("?"), normalize("no"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Yes.",
            "Two Dogs!",
            "the 1,000 (approx)",
            "Dont know...",
            "st. louis, mo",
            "A red-and-white bus",
            "3.14 or 2..5",
            "y'allll",
            "  ",
            "\"quoted\" text\twith\ntabs",
            "somebodyd've",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_contraction_table_is_closed() {
        for (_, to) in CONTRACTIONS {
            assert!(lookup(CONTRACTIONS, to).is_none(), "{} is also a key", to);
            assert!(!ARTICLES.contains(to));
        }
    }
}
