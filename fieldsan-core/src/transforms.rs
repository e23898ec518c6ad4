// File: fieldsan-core/src/transforms.rs
//! String transforms applied by the text sanitizer.
//!
//! The catalogue maps a directive verb to an in-place transform. Verbs run in
//! catalogue order, not in the order they were written, so `upper,trim` and
//! `trim,upper` behave the same. Of the casing verbs only the first one present
//! (`lower`, `upper`, `title`, `cap`) is applied.
//!
//! Date re-formatting lives here too but depends on the sanitizer's
//! configured [`DateFormat`].
//!
//! License: MIT OR APACHE 2.0

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::config::DateFormat;
use crate::directives::DirectiveSet;

/// An in-place string transform.
pub type Transform = fn(&mut String);

/// Verbs that are always applied when present.
pub const TRANSFORMS: &[(&str, Transform)] = &[("xss", strip_markup), ("trim", trim)];

/// Mutually exclusive casing verbs, in precedence order.
pub const CASINGS: &[(&str, Transform)] = &[
    ("lower", lowercase),
    ("upper", uppercase),
    ("title", title_case),
    ("cap", capitalize),
];

lazy_static! {
    /// Script and style blocks, including their content.
    static ref BLOCK_TAGS: Regex = Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap();
    /// Any remaining opening, closing or self-closing tag.
    static ref ANY_TAG: Regex = Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").unwrap();
    static ref JS_SCHEME: Regex = Regex::new(r"(?i)javascript\s*:").unwrap();
}

/// Applies every catalogue verb present in `directives` to `text`.
pub fn apply_verbs(directives: &DirectiveSet, text: &mut String) {
    for (verb, transform) in TRANSFORMS {
        if directives.has(verb) {
            transform(text);
        }
    }
    if let Some((_, transform)) = CASINGS.iter().find(|(verb, _)| directives.has(verb)) {
        transform(text);
    }
}

fn replace_all(re: &Regex, text: &mut String) {
    if re.is_match(text) {
        *text = re.replace_all(text, "").into_owned();
    }
}

/// Removes HTML markup that could carry script. Repeats until nothing
/// matches, since removing one tag can join its neighbours into another.
pub fn strip_markup(text: &mut String) {
    loop {
        let len = text.len();
        replace_all(&BLOCK_TAGS, text);
        replace_all(&ANY_TAG, text);
        replace_all(&JS_SCHEME, text);
        if text.len() == len {
            break;
        }
    }
}

pub fn trim(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

pub fn lowercase(text: &mut String) {
    *text = text.to_lowercase();
}

pub fn uppercase(text: &mut String) {
    *text = text.to_uppercase();
}

fn capitalize_word(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
}

/// Upper-cases the first letter of every whitespace-separated word and
/// lower-cases the rest. Whitespace is preserved.
pub fn title_case(text: &mut String) {
    let mut out = String::with_capacity(text.len());
    let mut word_start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                capitalize_word(&text[start..idx], &mut out);
            }
            out.push(c);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        capitalize_word(&text[start..], &mut out);
    }
    *text = out;
}

/// Upper-cases the first letter of the string and lower-cases the rest.
pub fn capitalize(text: &mut String) {
    let mut out = String::with_capacity(text.len());
    capitalize_word(text, &mut out);
    *text = out;
}

enum ParsedDate {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ParsedDate {
    fn parse(text: &str, format: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(ParsedDate::Zoned(dt));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedDate::Naive(dt));
        }
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(ParsedDate::Naive)
    }

    fn format(&self, format: &str) -> Option<String> {
        let mut out = String::new();
        let written = match self {
            ParsedDate::Zoned(dt) => write!(out, "{}", dt.format(format)),
            ParsedDate::Naive(dt) => write!(out, "{}", dt.format(format)),
        };
        written.ok().map(|_| out)
    }
}

/// Re-prints a date string according to `policy`, or returns `None` when no
/// format accepts it.
///
/// A value already written in the output format is re-printed as is. Otherwise
/// the first input format that parses decides: the result keeps that format
/// when `keep_format` is set and uses the output format otherwise.
pub fn reformat_date(policy: &DateFormat, text: &str) -> Option<String> {
    if !policy.keep_format {
        if let Some(parsed) = ParsedDate::parse(text, &policy.output) {
            return parsed.format(&policy.output);
        }
    }
    let (input, parsed) = policy
        .input
        .iter()
        .find_map(|input| ParsedDate::parse(text, input).map(|parsed| (input, parsed)))?;
    let target = if policy.keep_format { input } else { &policy.output };
    let formatted = parsed.format(target);
    if formatted.is_none() {
        warn!("Date {:?} matched {:?} but can not be printed as {:?}.", text, input, target);
    }
    formatted
}

fn sample_date() -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDate::from_ymd_opt(2001, 2, 3)?.and_hms_opt(4, 5, 6)?;
    FixedOffset::east_opt(3600)?.from_local_datetime(&naive).single()
}

/// True when printing with `format` needs a UTC offset.
pub(crate) fn needs_offset(format: &str) -> bool {
    match sample_date() {
        Some(date) => ParsedDate::Naive(date.naive_local()).format(format).is_none(),
        None => false,
    }
}

/// True when a date printed with `format` parses back with `format`.
pub(crate) fn round_trips(format: &str) -> bool {
    sample_date()
        .and_then(|date| ParsedDate::Zoned(date).format(format))
        .is_some_and(|printed| ParsedDate::parse(&printed, format).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(directives: &str, input: &str) -> String {
        let mut text = input.to_string();
        apply_verbs(&DirectiveSet::parse(directives), &mut text);
        text
    }

    #[test]
    fn test_trim_and_casing() {
        assert_eq!(run("trim", "  hi there \t"), "hi there");
        assert_eq!(run("trim,upper", "  shout "), "SHOUT");
        assert_eq!(run("lower", "MiXeD"), "mixed");
        assert_eq!(run("title", "the QUICK  brown\tfox"), "The Quick  Brown\tFox");
        assert_eq!(run("cap", "hELLO World"), "Hello world");
        assert_eq!(run("upper,lower", "MiXeD"), "mixed");
        assert_eq!(run("max=3", " untouched "), " untouched ");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(run("xss", "<b>bold</b> text"), "bold text");
        assert_eq!(run("xss", "a<script type=\"x\">alert(1)</script>b"), "ab");
        assert_eq!(run("xss", "<a href=\"javascript:alert(1)\">x</a>"), "x");
        assert_eq!(run("xss", "go to javascript:void(0)"), "go to void(0)");
        assert_eq!(run("xss", "1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
    }

    fn policy(input: &[&str], keep_format: bool, output: &str) -> DateFormat {
        DateFormat {
            input: input.iter().map(|s| s.to_string()).collect(),
            keep_format,
            output: output.to_string(),
        }
    }

    #[test]
    fn test_nested_markup_is_fully_removed() {
        assert_eq!(run("xss", "<<b>b>hi"), "hi");
        assert_eq!(run("xss", "<scr<script></script>ipt>x</script>y"), "xy");
        assert_eq!(run("xss", "javajavascript:script:go"), "go");
        let once = run("xss", "<<i>a href=1>tail");
        assert_eq!(run("xss", &once), once);
    }

    #[test]
    fn test_reformat_date_to_output() {
        let p = policy(&["%d/%m/%Y", "%Y-%m-%d"], false, "%Y-%m-%d");
        assert_eq!(reformat_date(&p, "31/12/2024").as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn test_reformat_date_accepts_own_output() {
        let p = policy(&["%Y-%m-%d"], false, "%d/%m/%Y");
        let once = reformat_date(&p, "2024-12-31").unwrap();
        assert_eq!(once, "31/12/2024");
        assert_eq!(reformat_date(&p, &once).as_deref(), Some("31/12/2024"));

        let p = policy(&["%m/%d/%Y"], false, "%d/%m/%Y");
        assert_eq!(reformat_date(&p, "05/03/2024").as_deref(), Some("05/03/2024"));
    }

    #[test]
    fn test_reformat_date_keep_format() {
        let p = policy(&["%Y-%m-%d %H:%M"], true, "%d.%m.%Y");
        assert_eq!(
            reformat_date(&p, "2024-03-05 07:08").as_deref(),
            Some("2024-03-05 07:08")
        );
    }

    #[test]
    fn test_reformat_date_with_offset() {
        let p = policy(&["%Y-%m-%dT%H:%M:%S%z"], false, "%Y/%m/%d %H:%M %z");
        assert_eq!(
            reformat_date(&p, "2024-03-05T07:08:09+0200").as_deref(),
            Some("2024/03/05 07:08 +0200")
        );
    }

    #[test]
    fn test_unparseable_date() {
        let p = policy(&["%Y-%m-%d"], false, "%Y-%m-%d");
        assert_eq!(reformat_date(&p, "not a date"), None);
    }

    #[test]
    fn test_unprintable_date() {
        let p = policy(&["%Y-%m-%d", "%Y-%m-%dT%H:%M:%S%z"], false, "%d %H:%M %z");
        assert_eq!(reformat_date(&p, "2024-03-05"), None);
    }

    #[test]
    fn test_format_probes() {
        assert!(needs_offset("%Y-%m-%d %z"));
        assert!(!needs_offset("%Y-%m-%d"));
        assert!(round_trips("%d %b %Y"));
        assert!(round_trips("%Y-%m-%dT%H:%M:%S%z"));
        assert!(!round_trips("%B %Y"));
    }
}
