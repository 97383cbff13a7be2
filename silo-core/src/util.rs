use crate::{Error, Result, Value};
use std::fmt::Write;

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for v in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, v);
    }
}

/// Join already rendered fragments with `", "`.
pub fn comma_join<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> String {
    let mut out = String::new();
    separated_by(&mut out, items, |out, v| out.push_str(v.as_ref()), ", ");
    out
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .nth(497)
                .map(|(i, _)| i)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().count() > 497 { "..." } else { "" },
        )
    };
}

fn special_char_escape(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{8}' => "\\b",
        '\u{c}' => "\\f",
        '\r' => "\\r",
        '\n' => "\\n",
        '\t' => "\\t",
        '\0' => "\\0",
        '\\' => "\\\\",
        '\'' => "\\'",
        _ => return None,
    })
}

/// Append `value` to `out` escaping the characters that have a special meaning in
/// the tab separated format and inside quoted literals.
pub fn write_escaped(out: &mut String, value: &str) {
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if let Some(replace) = special_char_escape(c) {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + c.len_utf8();
        }
    }
    out.push_str(&value[position..]);
}

/// Escape a string the way the server expects it, optionally wrapping it in single quotes.
pub fn escape(value: &str, quote: bool) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    if quote {
        out.push('\'');
    }
    write_escaped(&mut out, value);
    if quote {
        out.push('\'');
    }
    out
}

/// Reverse of [`escape`] (without quotes). Unknown escape sequences such as `\N` are kept verbatim.
pub fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_owned();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\u{7}'),
            Some('v') => out.push('\u{b}'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => {
                let hex: String = chars.clone().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => {
                        out.push(byte as char);
                        chars.next();
                        chars.next();
                    }
                    _ => out.push_str("\\x"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split one line of the tab separated format into unescaped cells.
pub fn parse_tsv(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    line.split('\t').map(unescape).collect()
}

/// One element of a composite literal (array, tuple or map).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A single quoted string, already unescaped.
    Quoted(String),
    /// Anything else: numbers, `NULL`, nested composites kept as text.
    Bare(String),
}

impl Literal {
    pub fn into_value(self) -> Value {
        match self {
            Literal::Quoted(v) => Value::String(v),
            Literal::Bare(v) if v.eq_ignore_ascii_case("null") || v == "\\N" => Value::Null,
            Literal::Bare(v) => Value::String(v),
        }
    }
}

pub(crate) fn read_quoted(input: &str) -> Result<(Literal, &str)> {
    let mut out = String::new();
    let mut chars = input.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let Some((j, next)) = chars.next() else {
                    break;
                };
                out.push_str(&unescape(&input[i..j + next.len_utf8()]));
            }
            '\'' => return Ok((Literal::Quoted(out), &input[i + 1..])),
            _ => out.push(c),
        }
    }
    Err(Error::msg(format!(
        "Missing closing quote: \"{}\"",
        truncate_long!(input)
    )))
}

fn read_bare(input: &str, map: bool) -> Result<(Literal, &str)> {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if quoted {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '\'') => quoted = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => quoted = true,
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' if depth > 0 => depth -= 1,
            ',' if depth == 0 => return Ok((Literal::Bare(input[..i].trim().into()), &input[i..])),
            ':' if depth == 0 && map => {
                return Ok((Literal::Bare(input[..i].trim().into()), &input[i..]));
            }
            _ => {}
        }
    }
    if depth > 0 || quoted {
        return Err(Error::msg(format!(
            "Unbalanced composite literal: \"{}\"",
            truncate_long!(input)
        )));
    }
    Ok((Literal::Bare(input.trim().into()), ""))
}

fn scan_composite(input: &str, map: bool) -> Result<(char, Vec<(Literal, Option<char>)>)> {
    let trimmed = input.trim();
    let (open, close) = match trimmed.chars().next() {
        Some('[') => ('[', ']'),
        Some('(') => ('(', ')'),
        Some('{') => ('{', '}'),
        _ => {
            return Err(Error::msg(format!(
                "Invalid array string: \"{}\"",
                truncate_long!(input)
            )));
        }
    };
    if trimmed.len() < 2 || !trimmed.ends_with(close) {
        return Err(Error::msg(format!(
            "Invalid array string: \"{}\"",
            truncate_long!(input)
        )));
    }
    let mut rest = &trimmed[1..trimmed.len() - 1];
    let mut items = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (literal, remaining) = if rest.starts_with('\'') {
            read_quoted(rest)?
        } else {
            read_bare(rest, map)?
        };
        rest = remaining.trim_start();
        let separator = match rest.chars().next() {
            None => None,
            Some(c @ (',' | ':')) => {
                rest = &rest[1..];
                Some(c)
            }
            Some(c) => {
                return Err(Error::msg(format!(
                    "Unexpected character `{c}` in composite literal \"{}\"",
                    truncate_long!(input)
                )));
            }
        };
        items.push((literal, separator));
        if separator.is_none() {
            break;
        }
    }
    Ok((open, items))
}

/// Parse an array or tuple literal as returned by the server, for example
/// `['hello', 'world']` or `(1, 'a')`. Quoted elements are unescaped, nested
/// composites are returned as bare text.
pub fn parse_array(input: &str) -> Result<Vec<Literal>> {
    let (open, items) = scan_composite(input, false)?;
    if open == '{' {
        return Err(Error::msg(format!(
            "Expected an array or a tuple, found a map: \"{}\"",
            truncate_long!(input)
        )));
    }
    Ok(items.into_iter().map(|(v, _)| v).collect())
}

/// Parse a map literal like `{'a':1,'b':2}` into its key value pairs.
pub fn parse_map(input: &str) -> Result<Vec<(Literal, Literal)>> {
    let (open, items) = scan_composite(input, true)?;
    if open != '{' {
        return Err(Error::msg(format!(
            "Expected a map literal: \"{}\"",
            truncate_long!(input)
        )));
    }
    let mut result = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let Some((key, separator)) = items.next() {
        let (Some(':'), Some((value, _))) = (separator, items.next()) else {
            return Err(Error::msg(format!(
                "Malformed map literal: \"{}\"",
                truncate_long!(input)
            )));
        };
        result.push((key, value));
    }
    Ok(result)
}

/// Replace the `$name` and `${name}` placeholders found in `mapping`, `$$` becomes `$`.
/// Unknown placeholders are left untouched.
pub fn substitute(query: &str, mapping: &[(&str, &str)]) -> String {
    if !query.contains('$') {
        return query.to_owned();
    }
    let mut out = String::with_capacity(query.len() + 32);
    let mut rest = query;
    while let Some(position) = rest.find('$') {
        out.push_str(&rest[..position]);
        rest = &rest[position + 1..];
        if let Some(tail) = rest.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        let (name, tail, braced) = if let Some(inner) = rest.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], &inner[end + 1..], true),
                None => ("", rest, false),
            }
        } else {
            let end = rest
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            (&rest[..end], &rest[end..], false)
        };
        match mapping.iter().find(|(k, _)| *k == name) {
            Some((_, replacement)) if !name.is_empty() => {
                out.push_str(replacement);
                rest = tail;
            }
            _ => {
                out.push('$');
                if braced {
                    let _ = write!(out, "{{{name}}}");
                    rest = tail;
                }
            }
        }
    }
    out.push_str(rest);
    out
}
