//! Renders serialized props as an object literal for a fixture's `args`.

use crate::component::quote;
use crate::serialize::{SerializedProps, SerializedValue};

use super::naming::is_identifier;

const INDENT: &str = "  ";

/// Renders `props` as an object literal whose closing brace sits at `level`.
///
/// Function values become `mock_call`.
pub fn render_args(props: &SerializedProps, level: usize, mock_call: &str) -> String {
    render_object(&props.0, level, mock_call)
}

fn render_value(value: &SerializedValue, level: usize, mock_call: &str) -> String {
    match value {
        SerializedValue::Null => "null".to_string(),
        SerializedValue::Undefined => "undefined".to_string(),
        SerializedValue::Bool(value) => value.to_string(),
        SerializedValue::Number(value) => value.to_string(),
        SerializedValue::String(value) => quote(value),
        SerializedValue::Function(_) => mock_call.to_string(),
        SerializedValue::Jsx(jsx) => render_jsx(&jsx.source, level),
        SerializedValue::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }

            let inner = indent(level + 1);
            let mut output = String::from("[\n");
            for item in items {
                output.push_str(&format!("{}{},\n", inner, render_value(item, level + 1, mock_call)));
            }
            output.push_str(&indent(level));
            output.push(']');
            output
        }
        SerializedValue::Object(entries) => render_object(entries, level, mock_call),
    }
}

fn render_object(entries: &[(String, SerializedValue)], level: usize, mock_call: &str) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }

    let inner = indent(level + 1);
    let mut output = String::from("{\n");
    for (key, value) in entries {
        output.push_str(&format!(
            "{}{}: {},\n",
            inner,
            render_key(key),
            render_value(value, level + 1, mock_call)
        ));
    }
    output.push_str(&indent(level));
    output.push('}');
    output
}

fn render_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Single-line sources stay inline; longer ones are wrapped in parentheses
/// and re-indented one level deeper than the line they start on.
fn render_jsx(source: &str, level: usize) -> String {
    let source = source.trim();
    if !source.contains('\n') {
        return source.to_string();
    }

    let mut lines = source.lines();
    let first = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.collect();

    let common = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()
        .unwrap_or(0);

    let inner = indent(level + 1);
    let mut output = format!("(\n{}{}\n", inner, first);
    for line in rest {
        if line.trim().is_empty() {
            output.push('\n');
        } else {
            output.push_str(&format!("{}{}\n", inner, &line[common..]));
        }
    }
    output.push_str(&indent(level));
    output.push(')');
    output
}

/// Leading spaces and tabs only, so the width is always a char boundary.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(value: serde_json::Value) -> String {
        render_args(&SerializedProps::from_json(value), 1, "fn()")
    }

    #[test]
    fn test_primitives() {
        assert_eq!(
            render(json!({ "label": "Click me", "disabled": false, "count": 3, "ratio": 0.5, "value": null })),
            "{\n    label: \"Click me\",\n    disabled: false,\n    count: 3,\n    ratio: 0.5,\n    value: null,\n  }"
        );
    }

    #[test]
    fn test_keys_are_quoted_when_needed() {
        assert_eq!(
            render(json!({ "aria-label": "Close", "data-id": 1, "$ok": true })),
            "{\n    \"aria-label\": \"Close\",\n    \"data-id\": 1,\n    $ok: true,\n  }"
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        assert_eq!(
            render(json!({ "text": "say \"hi\"\nbye" })),
            "{\n    text: \"say \\\"hi\\\"\\nbye\",\n  }"
        );
    }

    #[test]
    fn test_nested_structures() {
        assert_eq!(
            render(json!({ "items": [1, { "id": "a" }], "style": { "margin": 4 }, "empty": [], "none": {} })),
            "{\n    items: [\n      1,\n      {\n        id: \"a\",\n      },\n    ],\n    style: {\n      margin: 4,\n    },\n    empty: [],\n    none: {},\n  }"
        );
    }

    #[test]
    fn test_functions_become_mock_calls() {
        assert_eq!(
            render(json!({ "onClick": { "isFunction": true, "name": "handleClick" } })),
            "{\n    onClick: fn(),\n  }"
        );
    }

    #[test]
    fn test_inline_jsx() {
        assert_eq!(
            render(json!({ "icon": { "isJSX": true, "source": "<Icon name=\"x\" />", "componentRefs": ["Icon"] } })),
            "{\n    icon: <Icon name=\"x\" />,\n  }"
        );
    }

    #[test]
    fn test_multiline_jsx_is_reindented() {
        let source = "<Card>\n      <b>Title</b>\n\n      <p />\n    </Card>";

        assert_eq!(
            render(json!({ "children": { "isJSX": true, "source": source, "componentRefs": [] } })),
            "{\n    children: (\n      <Card>\n        <b>Title</b>\n\n        <p />\n      </Card>\n    ),\n  }"
        );
    }

    #[test]
    fn test_multiline_jsx_with_wide_whitespace() {
        let source = "<p>\n\u{3000}wide\n y</p>";

        assert_eq!(
            render(json!({ "children": { "isJSX": true, "source": source, "componentRefs": [] } })),
            "{\n    children: (\n      <p>\n      \u{3000}wide\n       y</p>\n    ),\n  }"
        );
    }

    #[test]
    fn test_undefined_renders_as_keyword() {
        let mut props = SerializedProps::new();
        props.insert("value", SerializedValue::Undefined);

        assert_eq!(render_args(&props, 0, "fn()"), "{\n  value: undefined,\n}");
    }
}
