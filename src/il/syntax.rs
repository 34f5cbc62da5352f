// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lexical helpers for IL declaration text.
//!
//! Declarations printed by the disassembler mix quoted identifiers,
//! parenthesized groups (`marshal(...)`, `modopt(...)`, `pinvokeimpl(...)`),
//! bracketed scopes (`['mscorlib']`) and generic argument lists. These helpers
//! split such text at top level only, never inside a group or a quote.

/// Tracks nesting while scanning declaration text.
#[derive(Default)]
struct Nesting {
    depth: i32,
    quote: Option<char>,
    escaped: bool,
}

impl Nesting {
    /// Feeds one character; returns true if it sits at top level.
    fn feed(&mut self, c: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return false;
        }
        match c {
            '\'' | '"' => {
                let top = self.depth == 0;
                self.quote = Some(c);
                top
            }
            '(' | '[' | '<' => {
                self.depth += 1;
                false
            }
            ')' | ']' | '>' => {
                self.depth -= 1;
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Splits `text` on `separator` wherever it appears at top level.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if nesting.feed(c) && c == separator {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Splits `text` into whitespace-separated tokens, keeping groups and quotes whole.
pub fn tokens(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut nesting = Nesting::default();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        let top = nesting.feed(c);
        if top && c.is_whitespace() {
            if let Some(s) = start.take() {
                result.push(&text[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        result.push(&text[s..]);
    }
    result
}

/// Removes a trailing `//` comment that is not inside a quoted string.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous_slash = false;
    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                previous_slash = false;
            }
            '/' if previous_slash => return &line[..i - 1],
            '/' => previous_slash = true,
            _ => previous_slash = false,
        }
    }
    line
}

/// Net count of `(` minus `)` outside quotes and comments.
pub fn paren_balance(line: &str) -> i32 {
    bracket_balance(line, '(', ')')
}

/// Net count of `{` minus `}` outside quotes and comments.
pub fn brace_balance(line: &str) -> i32 {
    bracket_balance(line, '{', '}')
}

fn bracket_balance(line: &str, open: char, close: char) -> i32 {
    let mut balance = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in strip_comment(line).chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '\'' || c == '"' {
            quote = Some(c);
        } else if c == open {
            balance += 1;
        } else if c == close {
            balance -= 1;
        }
    }
    balance
}

/// Splits `name(args)` into the callee part and the text between the parentheses.
///
/// The split happens at the first `(` outside quotes and generic arguments, so
/// `'Run'<T>(!!0 'x')` yields `("'Run'<T>", "!!0 'x'")`.
pub fn split_call(token: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut angle = 0;
    for (i, c) in token.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '<' => angle += 1,
            '>' => angle -= 1,
            '(' if angle == 0 => {
                let close = token.rfind(')')?;
                if close < i {
                    return None;
                }
                return Some((&token[..i], &token[i + 1..close]));
            }
            _ => {}
        }
    }
    None
}

/// Returns true if `line` (already trimmed) starts with the given directive keyword.
pub fn is_directive(line: &str, directive: &str) -> bool {
    line.strip_prefix(directive)
        .map(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        .unwrap_or(false)
}

/// Splits a dotted name into its segments, honoring single-quoted segments.
///
/// `'Maca134.Arma'.'Wrapper'` yields `["Maca134.Arma", "Wrapper"]` while the
/// unquoted `Maca134.Arma.Wrapper` yields three segments.
pub fn name_segments(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    for c in name.chars() {
        if in_quote {
            if escaped {
                current.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                in_quote = false;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '.' if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Splits a type name token into `(namespace, name)`.
pub fn split_type_name(token: &str) -> (String, String) {
    let mut segments = name_segments(strip_scope(token));
    let name = segments.pop().unwrap_or_default();
    (segments.join("."), name)
}

/// Removes a leading resolution scope such as `['mscorlib']`.
pub fn strip_scope(token: &str) -> &str {
    let trimmed = token.trim();
    if trimmed.starts_with('[') {
        if let Some(end) = trimmed.find(']') {
            return &trimmed[end + 1..];
        }
    }
    trimmed
}

/// Removes one trailing generic parameter list (`<...>`), if present.
pub fn strip_generic_suffix(token: &str) -> &str {
    if !token.ends_with('>') {
        return token;
    }
    let mut depth = 0;
    for (i, c) in token.char_indices().rev() {
        match c {
            '>' => depth += 1,
            '<' => {
                depth -= 1;
                if depth == 0 {
                    return &token[..i];
                }
            }
            _ => {}
        }
    }
    token
}

/// Quotes a single identifier for emission.
pub fn quote(identifier: &str) -> String {
    format!("'{}'", identifier.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Quotes a type name the way the disassembler prints it: `'Namespace'.'Name'`.
pub fn quote_type_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        quote(name)
    } else {
        format!("{}.{}", quote(namespace), quote(name))
    }
}

/// Reduces a type as printed in a signature to a comparable form.
///
/// Quotes, scopes, `class`/`valuetype` keywords, custom modifiers and marshaling clauses are
/// dropped, whitespace is collapsed, and the framework names of the built-in
/// types map to their IL keywords (`System.String` becomes `string`).
pub fn canonical_type(text: &str) -> String {
    let kept: Vec<&str> = tokens(text)
        .into_iter()
        .filter(|t| {
            !(t.starts_with("marshal(") || t.starts_with("modopt(") || t.starts_with("modreq("))
        })
        .collect();
    let mut parts: &[&str] = &kept;
    if let Some((first, rest)) = parts.split_first() {
        if (*first == "class" || *first == "valuetype") && !rest.is_empty() {
            parts = rest;
        }
    }
    let joined = parts
        .iter()
        .map(|t| {
            let (namespace, name) = split_type_name(t);
            let simple = if namespace.is_empty() {
                name
            } else {
                format!("{}.{}", namespace, name)
            };
            match simple.as_str() {
                "System.String" => "string".to_string(),
                "System.Int32" => "int32".to_string(),
                "System.Void" => "void".to_string(),
                "System.Object" => "object".to_string(),
                "System.Boolean" => "bool".to_string(),
                _ => simple,
            }
        })
        .collect::<Vec<_>>();
    joined.join(" ")
}

/// Returns true if `c` can appear in an unquoted IL identifier segment.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns true if `text` is a plain identifier (letters, digits, `_`, not starting with a digit).
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => chars.all(is_identifier_char),
        _ => false,
    }
}
