use regex::{Regex, RegexBuilder};

use crate::error::PatternSyntaxError;

/// A compiled entry of the blocked-pattern list
///
/// Patterns are written in delimited form, `/body/flags`, the way an
/// administrator copies them into the settings form. A pattern whose first
/// character is alphanumeric, a backslash or whitespace has no delimiters and
/// is compiled as a bare regex. Matching is case-sensitive unless the `i`
/// flag is given.
#[derive(Clone, Debug)]
pub struct BlockedPattern {
    /// Pattern exactly as configured
    source: String,

    /// `None` when the pattern failed to compile and is kept as a no-op
    regex: Option<Regex>,
}

impl BlockedPattern {
    /// Compile a pattern string
    pub fn parse(source: &str) -> Result<Self, PatternSyntaxError> {
        let regex = compile(source)?;
        Ok(Self {
            source: source.to_string(),
            regex: Some(regex),
        })
    }

    /// A placeholder for a pattern that failed to compile; it never matches
    pub fn inert(source: &str) -> Self {
        Self {
            source: source.to_string(),
            regex: None,
        }
    }

    /// Check whether the rendered message matches
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Whether this pattern compiled and can match anything
    pub fn is_active(&self) -> bool {
        self.regex.is_some()
    }

    /// Get the original pattern
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn compile(source: &str) -> Result<Regex, PatternSyntaxError> {
    let trimmed = source.trim_start();
    let Some(open) = trimmed.chars().next() else {
        return Err(PatternSyntaxError::Empty);
    };

    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() {
        return Ok(Regex::new(trimmed)?);
    }

    let (body, flags) = split_delimited(trimmed, open)?;

    let mut builder = RegexBuilder::new(&body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'U' => {
                builder.swap_greed(true);
            }
            // Unicode is always on and `$` already anchors at the very end.
            'u' | 'D' => {}
            ' ' | '\n' | '\r' => {}
            other => return Err(PatternSyntaxError::UnsupportedFlag(other)),
        }
    }

    Ok(builder.build()?)
}

/// Split `/body/flags` into body and flags
///
/// The closing delimiter is the first unescaped occurrence. Bracket
/// delimiters (`(`, `[`, `{`, `<`) close on their partner and may nest. An
/// escaped delimiter inside the body stands for the literal character.
fn split_delimited(pattern: &str, open: char) -> Result<(String, &str), PatternSyntaxError> {
    let close = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    };
    let nests = open != close;

    let rest = &pattern[open.len_utf8()..];
    let mut body = String::with_capacity(rest.len());
    let mut depth = 0usize;
    let mut escaped = false;

    for (idx, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            if ch == open || ch == close {
                body.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4])));
            } else {
                body.push('\\');
                body.push(ch);
            }
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == close {
            if depth == 0 {
                return Ok((body, &rest[idx + ch.len_utf8()..]));
            }
            depth -= 1;
        } else if nests && ch == open {
            depth += 1;
        }
        body.push(ch);
    }

    Err(PatternSyntaxError::MissingDelimiter(close))
}
