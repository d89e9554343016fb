//! Text-level rewrites of captured template source.
//!
//! Captured source is already balanced, so a small scanner is enough. It
//! walks elements, attributes and `{ ... }` expressions separately: quotes
//! only delimit strings inside tag attributes and expressions, while
//! element text between `>` and `<` is taken literally.

use crate::util;

/// Element that unresolved custom tags are downgraded to.
pub const GENERIC_ELEMENT: &str = "div";

const STYLED_PREFIX: &str = "styled.";

/// Replaces every callback-shaped attribute value with `placeholder`.
///
/// Returns the new source and the number of replacements.
pub fn replace_callbacks(source: &str, placeholder: &str) -> (String, usize) {
    let mut values = Scanner::scan(source).attributes;
    // nested values are recorded before the value that encloses them
    values.sort_by_key(|value| value.open);

    let mut output = String::with_capacity(source.len());
    let mut copied = 0;
    let mut replaced = 0;

    for value in values {
        // inside a value that was already replaced
        if value.open < copied {
            continue;
        }

        if is_callback(&source[value.open + 1..value.end - 1]) {
            output.push_str(&source[copied..=value.open]);
            output.push_str(placeholder);
            output.push('}');
            copied = value.end;
            replaced += 1;
        }
    }

    output.push_str(&source[copied..]);
    (output, replaced)
}

/// Renames tags so the source only references components that can be imported.
///
/// `styled.X` always becomes `X`; other custom (uppercase) tags for which
/// `is_resolved` returns false become [`GENERIC_ELEMENT`]. Dotted tags such
/// as `Card.Header` are resolved by their first segment.
pub fn rewrite_tags<F>(source: &str, is_resolved: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut output = String::with_capacity(source.len());
    let mut copied = 0;

    for tag in scan_tags(source) {
        let replacement = if let Some(intrinsic) = tag.name.strip_prefix(STYLED_PREFIX) {
            Some(intrinsic)
        } else if util::is_pascal_case(tag.name) && !is_resolved(root_name(tag.name)) {
            Some(GENERIC_ELEMENT)
        } else {
            None
        };

        if let Some(replacement) = replacement {
            output.push_str(&source[copied..tag.start]);
            output.push_str(replacement);
            copied = tag.start + tag.name.len();
        }
    }

    output.push_str(&source[copied..]);
    output
}

/// Custom component names used as tags, by their first segment, without duplicates.
pub fn custom_tags(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for tag in scan_tags(source) {
        if tag.name.starts_with(STYLED_PREFIX) || !util::is_pascal_case(tag.name) {
            continue;
        }
        let name = root_name(tag.name).to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}

/// `Card.Header` is imported as `Card`.
pub fn root_name(tag: &str) -> &str {
    tag.split('.').next().unwrap_or(tag)
}

struct Tag<'s> {
    /// Byte offset of the tag name.
    start: usize,
    name: &'s str,
}

/// Finds opening and closing tag names; fragments (`<>`) have none.
fn scan_tags(source: &str) -> Vec<Tag<'_>> {
    Scanner::scan(source).tags
}

/// An `attr={ ... }` value; `open` is the offset of `{`, `end` is just past `}`.
struct AttributeValue {
    open: usize,
    end: usize,
}

/// Single pass over captured source collecting tag names and attribute expressions.
struct Scanner<'s> {
    source: &'s str,
    bytes: &'s [u8],
    tags: Vec<Tag<'s>>,
    attributes: Vec<AttributeValue>,
}

impl<'s> Scanner<'s> {
    fn scan(source: &'s str) -> Self {
        let mut scanner = Self {
            source,
            bytes: source.as_bytes(),
            tags: Vec::new(),
            attributes: Vec::new(),
        };

        let mut i = 0;
        while i < scanner.bytes.len() {
            i = scanner.children(i);
            // a closing tag without an opening one
            if i < scanner.bytes.len() {
                i = scanner.closing_tag(i);
            }
        }

        scanner
    }

    /// Element text up to the next closing tag, which is left for the caller.
    fn children(&mut self, mut i: usize) -> usize {
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'{' => i = self.expression(i),
                b'<' if self.bytes.get(i + 1) == Some(&b'/') => return i,
                b'<' => i = self.element(i),
                _ => i += 1,
            }
        }

        i
    }

    /// `<Name attr="x" attr={y}>children</Name>`, `<Name />` or a fragment.
    fn element(&mut self, start: usize) -> usize {
        let mut i = self.tag_name(start + 1);

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' | b'\'' => i = self.attribute_string(i),
                b'{' => {
                    let end = self.expression(i);
                    let closed = end > i + 1 && self.bytes[end - 1] == b'}';
                    if closed && self.previous_significant(i) == Some(b'=') {
                        self.attributes.push(AttributeValue { open: i, end });
                    }
                    i = end;
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'>') => return i + 2,
                b'>' => {
                    i = self.children(i + 1);
                    if i < self.bytes.len() {
                        i = self.closing_tag(i);
                    }
                    return i;
                }
                _ => i += 1,
            }
        }

        i
    }

    /// `</Name>`, starting at `<`.
    fn closing_tag(&mut self, start: usize) -> usize {
        let i = self.tag_name(start + 2);

        match self.bytes[i.min(self.bytes.len())..].iter().position(|b| *b == b'>') {
            Some(offset) => i + offset + 1,
            None => self.bytes.len(),
        }
    }

    /// Records the tag name starting at `start` and returns the offset after it.
    fn tag_name(&mut self, start: usize) -> usize {
        if start >= self.bytes.len() || !is_identifier_start(self.bytes[start]) {
            return start;
        }

        let source = self.source;
        let end = start
            + self.bytes[start..]
                .iter()
                .take_while(|b| is_tag_char(**b))
                .count();
        self.tags.push(Tag {
            start,
            name: &source[start..end],
        });

        end
    }

    /// Attribute strings have no escapes.
    fn attribute_string(&self, start: usize) -> usize {
        let quote = self.bytes[start];
        match self.bytes[start + 1..].iter().position(|b| *b == quote) {
            Some(offset) => start + offset + 2,
            None => self.bytes.len(),
        }
    }

    /// A `{ ... }` expression starting at `{`; returns the offset just past its `}`.
    fn expression(&mut self, start: usize) -> usize {
        let mut depth = 0usize;
        let mut i = start;

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' | b'\'' => i = skip_string(self.bytes, i),
                b'`' => i = self.template(i),
                b'/' if self.bytes.get(i + 1) == Some(&b'/') => {
                    i = match self.bytes[i..].iter().position(|b| *b == b'\n') {
                        Some(offset) => i + offset,
                        None => self.bytes.len(),
                    };
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'*') => {
                    i = match self.source[i + 2..].find("*/") {
                        Some(offset) => i + 2 + offset + 2,
                        None => self.bytes.len(),
                    };
                }
                b'<' if self.starts_element(i) => i = self.element(i),
                b'{' => {
                    depth += 1;
                    i += 1;
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => i += 1,
            }
        }

        i
    }

    /// A template literal starting at its backtick; `${ ... }` parts are expressions.
    fn template(&mut self, start: usize) -> usize {
        let mut i = start + 1;

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'$' if self.bytes.get(i + 1) == Some(&b'{') => i = self.expression(i + 1),
                b'`' => return i + 1,
                _ => i += 1,
            }
        }

        self.bytes.len()
    }

    /// Whether `<` inside an expression opens an element rather than comparing.
    fn starts_element(&self, i: usize) -> bool {
        match self.bytes.get(i + 1) {
            Some(next) if is_identifier_start(*next) || *next == b'>' => {}
            _ => return false,
        }

        match self.previous_significant(i) {
            None => true,
            Some(b')') | Some(b']') => false,
            Some(b) if is_identifier_char(b) => {
                let before = self.source[..i].trim_end();
                before.ends_with("return") || before.ends_with("yield")
            }
            Some(_) => true,
        }
    }

    fn previous_significant(&self, i: usize) -> Option<u8> {
        self.bytes[..i]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            .copied()
    }
}

/// Whether an attribute expression is shaped like a handler: an arrow
/// function (optionally async), a function literal, or a bare call.
pub fn is_callback(expression: &str) -> bool {
    let expression = expression.trim();
    let unwrapped = strip_keyword(expression, "async").unwrap_or(expression);

    strip_keyword(unwrapped, "function").is_some() || is_arrow(unwrapped) || is_call(expression)
}

fn is_arrow(expression: &str) -> bool {
    let bytes = expression.as_bytes();

    let rest = if bytes.first() == Some(&b'(') {
        let end = skip_balanced(bytes, 0, b'(', b')');
        &expression[end.min(expression.len())..]
    } else {
        let identifier_len = identifier_len(expression);
        if identifier_len == 0 {
            return false;
        }
        &expression[identifier_len..]
    };

    let rest = rest.trim_start();
    // a return type annotation may sit between the parameters and the arrow
    rest.starts_with("=>") || (rest.starts_with(':') && rest.contains("=>"))
}

/// `handle()`, `props.onSave(1)`: a callee path followed by one argument list and nothing else.
fn is_call(expression: &str) -> bool {
    let bytes = expression.as_bytes();
    if bytes.is_empty() || !is_identifier_start(bytes[0]) {
        return false;
    }

    let callee_len = bytes
        .iter()
        .take_while(|b| is_identifier_char(**b) || **b == b'.')
        .count();
    let rest = expression[callee_len..].trim_start();
    if !rest.starts_with('(') {
        return false;
    }

    let end = skip_balanced(rest.as_bytes(), 0, b'(', b')');
    end <= rest.len() && rest[end..].trim().is_empty()
}

fn strip_keyword<'s>(text: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.bytes().next() {
        Some(next) if is_identifier_char(next) => None,
        _ => Some(rest.trim_start()),
    }
}

fn identifier_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !is_identifier_start(bytes[0]) {
        return 0;
    }
    bytes.iter().take_while(|b| is_identifier_char(**b)).count()
}

/// Returns the offset just past the string literal whose quote is at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if quote == b'`' && bytes.get(i + 1) == Some(&b'{') => {
                i = skip_balanced(bytes, i + 1, b'{', b'}');
            }
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }

    bytes.len()
}

/// Returns the offset just past the delimiter matching the one at `start`.
fn skip_balanced(bytes: &[u8], start: usize, open: u8, close: u8) -> usize {
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i);
                continue;
            }
            b if b == open => depth += 1,
            b if b == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    bytes.len()
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_tag_char(b: u8) -> bool {
    is_identifier_char(b) || b == b'.' || b == b'-' || b == b':'
}
