//! Family-code template rendering.
//!
//! Templates are plain text with `{name}` placeholders (`name` is made of
//! letters, digits and `_`). `{{` and `}}` escape literal braces. A value that
//! is missing, empty or the `"00"` sentinel renders as nothing, after which
//! runs of `-` collapse and leading/trailing `-` are trimmed.

use crate::context::RenderContext;
use crate::error::CodingError;
use skucode_core::CodeFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn is_placeholder_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn malformed(template: &str, position: usize) -> CodingError {
    CodingError::InvalidTemplate {
        template: template.into(),
        position,
    }
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, CodingError> {
    let mut out = Vec::new();
    let mut rest = template;
    let mut offset = 0usize;

    while let Some(found) = rest.find(['{', '}']) {
        let (literal, tail) = rest.split_at(found);
        if !literal.is_empty() {
            out.push(Segment::Literal(literal));
        }
        let position = offset + found;

        let consumed = if let Some(after) = tail.strip_prefix("{{") {
            out.push(Segment::Brace('{'));
            tail.len() - after.len()
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push(Segment::Brace('}'));
            tail.len() - after.len()
        } else if let Some(body) = tail.strip_prefix('{') {
            let close = body.find('}').ok_or_else(|| malformed(template, position))?;
            let (name, _) = body.split_at(close);
            if name.is_empty() || !name.chars().all(is_placeholder_char) {
                return Err(malformed(template, position));
            }
            out.push(Segment::Placeholder(name));
            name.len() + 2
        } else {
            return Err(malformed(template, position));
        };

        let (_, remaining) = tail.split_at(consumed);
        offset = position + consumed;
        rest = remaining;
    }

    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    Ok(out)
}

/// Placeholder names referenced by `template`, in first-seen order.
pub fn placeholders(template: &str) -> Result<Vec<&str>, CodingError> {
    let mut names: Vec<&str> = Vec::new();
    for segment in segments(template)? {
        if let Segment::Placeholder(name) = segment
            && !names.contains(&name)
        {
            names.push(name);
        }
    }
    Ok(names)
}

/// Returns true for values that render as nothing.
#[must_use]
pub fn is_blank_value(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.is_empty() || value == CodeFormat::EMPTY_SENTINEL)
}

fn collapse_delimiters(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_was_delimiter = false;
    for ch in raw.chars() {
        let is_delimiter = ch == CodeFormat::DELIMITER;
        if !(is_delimiter && previous_was_delimiter) {
            out.push(ch);
        }
        previous_was_delimiter = is_delimiter;
    }
    out.trim_matches(CodeFormat::DELIMITER).to_owned()
}

/// Render `template` against `context`.
///
/// Fails with [`CodingError::TemplateRenderedEmpty`] when nothing but
/// delimiters is left.
pub fn render_template(template: &str, context: &RenderContext) -> Result<String, CodingError> {
    let mut raw = String::with_capacity(template.len());
    for segment in segments(template)? {
        match segment {
            Segment::Literal(text) => raw.push_str(text),
            Segment::Brace(ch) => raw.push(ch),
            Segment::Placeholder(name) => {
                let value = context.get(name).map(String::as_str);
                if !is_blank_value(value) {
                    raw.push_str(value.unwrap_or_default());
                }
            },
        }
    }

    let rendered = collapse_delimiters(&raw);
    if rendered.is_empty() {
        return Err(CodingError::TemplateRenderedEmpty {
            template: template.into(),
        });
    }
    Ok(rendered)
}
