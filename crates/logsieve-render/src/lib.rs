//! Message rendering for logsieve
//!
//! Turns a log template and its placeholder context into the text a log
//! viewer shows. Blocked patterns are matched against this text, so the
//! substitution rules here must match the ones the log store applies on
//! display:
//!
//! - `@name` substitutes the HTML-escaped value
//! - `%name` substitutes the HTML-escaped value, optionally wrapped in
//!   emphasis markup (see [`Emphasis`])
//! - `!name` substitutes the value verbatim
//!
//! Placeholders with no matching context key are left as written.

use std::borrow::Cow;

use logsieve_types::{Context, display_value};

/// Placeholder prefix characters
const PREFIXES: [char; 3] = ['@', '%', '!'];

/// Markup applied to `%name` substitutions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emphasis {
    /// Escape only; `%name` renders exactly like `@name`
    #[default]
    None,
    /// Wrap in `<em class="placeholder">…</em>` as the log viewer does
    Html,
}

/// Placeholder renderer
#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    emphasis: Emphasis,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the markup used for `%name` placeholders
    pub fn with_emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    /// Render `template` against `context`
    ///
    /// Never fails. A prefix character that does not start a known
    /// placeholder is copied through unchanged.
    pub fn render(&self, template: &str, context: &Context) -> String {
        if context.is_empty() || !template.contains(PREFIXES) {
            return template.to_string();
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find(PREFIXES) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            match resolve(tail, context) {
                Some((consumed, value)) => {
                    let prefix = tail.as_bytes()[0];
                    self.substitute(&mut out, prefix, &display_value(value));
                    rest = &tail[consumed..];
                }
                None => {
                    // Prefixes are ASCII, so one byte is one char here.
                    out.push_str(&tail[..1]);
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn substitute(&self, out: &mut String, prefix: u8, value: &str) {
        match prefix {
            b'!' => out.push_str(value),
            b'%' if self.emphasis == Emphasis::Html => {
                out.push_str("<em class=\"placeholder\">");
                out.push_str(&escape_html(value));
                out.push_str("</em>");
            }
            _ => out.push_str(&escape_html(value)),
        }
    }
}

/// Render with the default renderer
pub fn render(template: &str, context: &Context) -> String {
    Renderer::default().render(template, context)
}

/// Find the context entry for the placeholder at the start of `tail`
///
/// `tail` starts with a prefix character. Keys are tried two ways: a key
/// that carries its own prefix (`@type`) matches only that prefix, a bare
/// key (`type`) matches after any prefix. The longest match wins, and a
/// prefixed key beats a bare key of the same length. Returns the number of
/// bytes consumed, prefix included.
fn resolve<'c>(tail: &str, context: &'c Context) -> Option<(usize, &'c serde_json::Value)> {
    let prefix = tail.chars().next()?;
    let after = &tail[prefix.len_utf8()..];

    let mut best: Option<(usize, bool, &serde_json::Value)> = None;
    for (key, value) in context {
        let candidate = match key.chars().next() {
            None => continue,
            Some(first) if PREFIXES.contains(&first) => {
                if first != prefix || !tail.starts_with(key.as_str()) {
                    continue;
                }
                (key.len(), true)
            }
            Some(_) => {
                if !after.starts_with(key.as_str()) {
                    continue;
                }
                (prefix.len_utf8() + key.len(), false)
            }
        };

        let better = match best {
            None => true,
            Some((len, prefixed, _)) => (candidate.0, candidate.1) > (len, prefixed),
        };
        if better {
            best = Some((candidate.0, candidate.1, value));
        }
    }

    best.map(|(len, _, value)| (len, value))
}

/// Neutralise HTML-special characters
///
/// Escapes `&`, `<`, `>`, `"` and `'`, matching the log store's
/// display escaping (`'` becomes `&#039;`).
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(pairs: &[(&str, serde_json::Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_basic_substitution() {
        let context = ctx(&[
            ("type", json!("Path")),
            ("message", json!("AccessDeniedHttpException")),
        ]);
        assert_eq!(
            render("@type: @message", &context),
            "Path: AccessDeniedHttpException"
        );
    }

    #[test]
    fn test_escaping_classes() {
        let context = ctx(&[("raw", json!("<i>y</i>")), ("safe", json!("<i>y</i>"))]);
        assert_eq!(
            render("!raw <b>x</b> @safe <b>x</b>", &context),
            "<i>y</i> <b>x</b> &lt;i&gt;y&lt;/i&gt; <b>x</b>"
        );
    }

    #[test]
    fn test_percent_escapes_like_at() {
        let context = ctx(&[("v", json!("a & 'b'"))]);
        assert_eq!(render("%v", &context), render("@v", &context));
        assert_eq!(render("%v", &context), "a &amp; &#039;b&#039;");
    }

    #[test]
    fn test_percent_html_emphasis() {
        let context = ctx(&[("fn", json!("<main>"))]);
        let renderer = Renderer::new().with_emphasis(Emphasis::Html);
        assert_eq!(
            renderer.render("in %fn", &context),
            "in <em class=\"placeholder\">&lt;main&gt;</em>"
        );
        assert_eq!(renderer.render("in @fn", &context), "in &lt;main&gt;");
    }

    #[test]
    fn test_unknown_and_malformed_placeholders() {
        let context = ctx(&[("known", json!("K"))]);
        assert_eq!(
            render("@unknown @known 100% done! @ %", &context),
            "@unknown K 100% done! @ %"
        );
    }

    #[test]
    fn test_longest_key_wins() {
        let context = ctx(&[("message", json!("short")), ("messages", json!("long"))]);
        assert_eq!(render("@messages", &context), "long");
        assert_eq!(render("@message.", &context), "short.");
    }

    #[test]
    fn test_prefixed_keys() {
        let context = ctx(&[("@type", json!("php")), ("type", json!("bare"))]);
        assert_eq!(render("@type", &context), "php");
        // `@type` does not apply to the `%` class, the bare key does.
        assert_eq!(render("%type", &context), "bare");
    }

    #[test]
    fn test_non_string_values() {
        let context = ctx(&[
            ("line", json!(117)),
            ("ok", json!(true)),
            ("none", serde_json::Value::Null),
        ]);
        assert_eq!(render("line @line [@ok] [@none]", &context), "line 117 [1] []");
    }

    #[test]
    fn test_unicode_around_placeholders() {
        let context = ctx(&[("name", json!("ünï"))]);
        assert_eq!(render("→ @name ←", &context), "→ ünï ←");
    }

    #[test]
    fn test_deterministic() {
        let context = ctx(&[("a", json!("1")), ("b", json!("<2>"))]);
        let first = render("@a %b !b", &context);
        for _ in 0..10 {
            assert_eq!(render("@a %b !b", &context), first);
        }
    }

    #[test]
    fn test_empty_context_returns_template() {
        assert_eq!(render("@type: @message", &Context::new()), "@type: @message");
    }
}
