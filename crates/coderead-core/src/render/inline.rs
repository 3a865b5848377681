//! Inline markup: escaping, code spans and emphasis.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code regex"));
static CODE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("valid code token regex"));
static STRONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid strong regex"));
static EM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid emphasis regex"));

/// Private-use delimiters around code span placeholders.
const CODE_TOKEN_OPEN: char = '\u{E000}';
const CODE_TOKEN_CLOSE: char = '\u{E001}';

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Renders one line of prose into HTML.
///
/// Code spans are swapped for opaque tokens first, so their content is
/// never emphasized. The line is then escaped and `**strong**` is applied
/// before `*em*` across the whole text, which lets emphasis wrap code
/// spans. Single-asterisk spans are matched separately inside and outside
/// each strong span, so the emitted tags always nest.
pub fn render_inline(text: &str) -> String {
    let mut spans = Vec::new();
    let tokenized = INLINE_CODE_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        spans.push(format!(
            r#"<code class="inline-code">{}</code>"#,
            escape_html(&caps[1])
        ));
        format!("{CODE_TOKEN_OPEN}{}{CODE_TOKEN_CLOSE}", spans.len() - 1)
    });

    let html = render_emphasis(&escape_html(&tokenized));
    if spans.is_empty() {
        return html;
    }

    CODE_TOKEN_RE
        .replace_all(&html, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| spans.get(index))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

fn render_emphasis(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut last = 0;

    for caps in STRONG_RE.captures_iter(escaped) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&EM_RE.replace_all(&escaped[last..whole.start()], "<em>${1}</em>"));
        out.push_str("<strong>");
        out.push_str(&EM_RE.replace_all(&caps[1], "<em>${1}</em>"));
        out.push_str("</strong>");
        last = whole.end();
    }

    out.push_str(&EM_RE.replace_all(&escaped[last..], "<em>${1}</em>"));
    out
}
