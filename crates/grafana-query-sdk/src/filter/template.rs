//! Positional expression templates such as `{0}["{1}"] = "{2}"`.
//!
//! Templates are parsed into literal and placeholder segments once, then rendered
//! in a single pass: every occurrence of a placeholder is replaced, and text
//! substituted for one placeholder is never scanned again. This means a value
//! containing `{0}` is rendered literally rather than being expanded.

/// A piece of a parsed template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Placeholder(usize),
}

/// Split a template into literal text and `{n}` placeholders.
pub(crate) fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let close = i + 1 + digits;
            if digits > 0 && bytes.get(close) == Some(&b'}') {
                if literal_start < i {
                    out.push(Segment::Literal(&template[literal_start..i]));
                }
                if let Ok(index) = template[i + 1..close].parse() {
                    out.push(Segment::Placeholder(index));
                }
                i = close + 1;
                literal_start = i;
                continue;
            }
        }
        i += 1;
    }
    if literal_start < template.len() {
        out.push(Segment::Literal(&template[literal_start..]));
    }
    out
}

/// Render `template`, substituting `args[n]` for every `{n}`.
///
/// Missing arguments render as the empty string. Arguments are inserted verbatim;
/// callers escape values with [`escape`] before rendering them into quoted positions.
pub(crate) fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    for segment in segments(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(index) => out.push_str(args.get(index).copied().unwrap_or_default()),
        }
    }
    out
}

/// Escape a value for use inside a double-quoted literal.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverse [`escape`].
pub(crate) fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Regex fragment matching the contents of a double-quoted literal, escapes included.
pub(crate) const QUOTED_CONTENT: &str = r#"((?:[^"\\]|\\.)*)"#;
const FIELD: &str = r"([A-Za-z_][A-Za-z0-9_.]*)";
const BARE_VALUE: &str = r"([^\s()&|]+)";

/// Build a regex source matching text rendered from `template`.
///
/// Returns the pattern along with the placeholder index bound by each capture
/// group, in group order. Whitespace in the template matches any run of
/// whitespace (including none). Placeholders directly after a `"` capture a
/// quoted literal's contents; `{0}` captures a field identifier; any other
/// placeholder captures a bare token such as a number.
pub(crate) fn pattern(template: &str) -> (String, Vec<usize>) {
    let mut source = String::new();
    let mut groups = Vec::new();
    let mut previous_literal = "";
    for segment in segments(template) {
        match segment {
            Segment::Literal(text) => {
                let mut in_whitespace = false;
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !in_whitespace {
                            source.push_str(r"\s*");
                        }
                        in_whitespace = true;
                    } else {
                        in_whitespace = false;
                        source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                    }
                }
                previous_literal = text;
            }
            Segment::Placeholder(index) => {
                let capture = if previous_literal.ends_with('"') {
                    QUOTED_CONTENT
                } else if index == 0 {
                    FIELD
                } else {
                    BARE_VALUE
                };
                source.push_str(capture);
                groups.push(index);
                previous_literal = "";
            }
        }
    }
    (source, groups)
}

/// Whether `expression` contains `||` outside parentheses and quoted literals.
pub(crate) fn has_top_level_or(expression: &str) -> bool {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            '|' if !in_quotes && depth == 0 && chars.peek() == Some(&'|') => return true,
            _ => {}
        }
    }
    false
}
