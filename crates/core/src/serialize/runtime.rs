use serde_json::Number;
use storyline_logger::Logger;

use super::value::{FunctionValue, JsxValue, SerializedProps, SerializedValue};
use crate::{story::naming::is_identifier, util};

/// Nesting depth after which a value is considered cyclic.
pub const MAX_DEPTH: usize = 32;

/// Source substituted for a UI value that cannot be rendered.
pub const UNSERIALIZABLE_SOURCE: &str = "<div data-storyline-unserializable />";

/// A live value as observed on a mounted component.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A function, with its name if it has one.
    Function(Option<String>),
    Array(Vec<RuntimeValue>),
    Object(Vec<(String, RuntimeValue)>),
    Element(Element),
    /// A host object with no data representation (DOM nodes, class instances, ...).
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// Intrinsic tags such as `div`.
    Host(String),
    /// User components, by display name.
    Component(String),
    Fragment,
}

/// A UI element: its type, key and props (`children` included).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub element_type: ElementType,
    pub key: Option<String>,
    pub props: Vec<(String, RuntimeValue)>,
    /// Values the component falls back to; props equal to them are not rendered.
    pub default_props: Vec<(String, RuntimeValue)>,
}

impl Element {
    pub fn host(tag: &str) -> Self {
        Self::new(ElementType::Host(tag.to_string()))
    }

    pub fn component(name: &str) -> Self {
        Self::new(ElementType::Component(name.to_string()))
    }

    pub fn fragment() -> Self {
        Self::new(ElementType::Fragment)
    }

    fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            key: None,
            props: Vec::new(),
            default_props: Vec::new(),
        }
    }

    pub fn prop(mut self, name: &str, value: RuntimeValue) -> Self {
        self.props.push((name.to_string(), value));
        self
    }

    pub fn default_prop(mut self, name: &str, value: RuntimeValue) -> Self {
        self.default_props.push((name.to_string(), value));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn children(self, children: Vec<RuntimeValue>) -> Self {
        self.prop("children", RuntimeValue::Array(children))
    }

    pub fn into_value(self) -> RuntimeValue {
        RuntimeValue::Element(self)
    }
}

/// Serializes a live props bag into the JSON-safe tree the story generator consumes.
///
/// Functions are never invoked; UI elements become template source; arrays
/// holding at least one element become a single fragment.
pub fn serialize_props(props: &[(String, RuntimeValue)]) -> SerializedProps {
    SerializedProps(
        props
            .iter()
            .map(|(key, value)| (key.clone(), serialize_data(value, 0)))
            .collect(),
    )
}

pub fn serialize_value(value: &RuntimeValue) -> SerializedValue {
    serialize_data(value, 0)
}

fn serialize_data(value: &RuntimeValue, depth: usize) -> SerializedValue {
    if depth > MAX_DEPTH {
        return SerializedValue::String("[Circular]".to_string());
    }

    match value {
        RuntimeValue::Undefined => SerializedValue::Undefined,
        RuntimeValue::Null => SerializedValue::Null,
        RuntimeValue::Bool(value) => SerializedValue::Bool(*value),
        RuntimeValue::Number(value) => match json_number(*value) {
            Some(number) => SerializedValue::Number(number),
            None => SerializedValue::Null,
        },
        RuntimeValue::String(value) => SerializedValue::String(value.clone()),
        RuntimeValue::Function(name) => SerializedValue::Function(FunctionValue {
            name: name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "anonymous".to_string()),
        }),
        RuntimeValue::Element(element) => {
            SerializedValue::Jsx(render_jsx(|writer| writer.element(element, 0)))
        }
        RuntimeValue::Array(items) => {
            if items.iter().any(|item| matches!(item, RuntimeValue::Element(_))) {
                SerializedValue::Jsx(render_jsx(|writer| writer.fragment(items, 0)))
            } else {
                SerializedValue::Array(
                    items
                        .iter()
                        .map(|item| serialize_data(item, depth + 1))
                        .collect(),
                )
            }
        }
        RuntimeValue::Object(entries) => SerializedValue::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), serialize_data(value, depth + 1)))
                .collect(),
        ),
        RuntimeValue::Opaque(description) => SerializedValue::String(format!("[{}]", description)),
    }
}

fn render_jsx<F>(render: F) -> JsxValue
where
    F: FnOnce(&mut JsxWriter) -> Result<String, RenderError>,
{
    let mut writer = JsxWriter::default();

    match render(&mut writer) {
        Ok(source) => JsxValue {
            source,
            component_refs: writer.refs,
        },
        Err(error) => {
            Logger::debug(&format!("Could not render element: {:?}", error), 1);
            JsxValue {
                source: UNSERIALIZABLE_SOURCE.to_string(),
                component_refs: Vec::new(),
            }
        }
    }
}

#[derive(Debug)]
enum RenderError {
    TooDeep,
    Opaque(String),
}

/// Renders elements to template source, collecting referenced component names.
#[derive(Default)]
struct JsxWriter {
    refs: Vec<String>,
}

impl JsxWriter {
    fn element(&mut self, element: &Element, depth: usize) -> Result<String, RenderError> {
        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep);
        }

        let tag = match &element.element_type {
            ElementType::Host(tag) => tag.clone(),
            ElementType::Component(name) => {
                if util::is_pascal_case(name) && !self.refs.contains(name) {
                    self.refs.push(name.clone());
                }
                name.clone()
            }
            ElementType::Fragment => String::new(),
        };

        let mut attributes: Vec<String> = Vec::new();
        if element.element_type != ElementType::Fragment {
            if let Some(key) = &element.key {
                attributes.push(format!("key={}", string_attribute(key)));
            }

            for (name, value) in &element.props {
                if name == "children" || is_default(element, name, value) {
                    continue;
                }
                if let Some(attribute) = self.attribute(name, value, depth)? {
                    attributes.push(attribute);
                }
            }
        }

        let mut children: Vec<String> = Vec::new();
        for (name, value) in &element.props {
            if name == "children" {
                children.extend(self.children(value, depth)?);
            }
        }

        let open = if attributes.is_empty() {
            tag.clone()
        } else {
            format!("{} {}", tag, attributes.join(" "))
        };

        if children.is_empty() {
            return Ok(if tag.is_empty() {
                "<></>".to_string()
            } else {
                format!("<{} />", open)
            });
        }

        let inline = children
            .iter()
            .all(|child| !child.starts_with('<') && !child.contains('\n'));

        if inline {
            Ok(format!("<{}>{}</{}>", open, children.join(""), tag))
        } else {
            let body = children
                .iter()
                .map(|child| indent(child, "  "))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!("<{}>\n{}\n</{}>", open, body, tag))
        }
    }

    /// Wraps a list of values in an anonymous fragment.
    fn fragment(&mut self, items: &[RuntimeValue], depth: usize) -> Result<String, RenderError> {
        let fragment = Element::fragment().children(items.to_vec());
        self.element(&fragment, depth)
    }

    fn attribute(
        &mut self,
        name: &str,
        value: &RuntimeValue,
        depth: usize,
    ) -> Result<Option<String>, RenderError> {
        let attribute = match value {
            RuntimeValue::Undefined => return Ok(None),
            RuntimeValue::Bool(true) => name.to_string(),
            RuntimeValue::String(text) => format!("{}={}", name, string_attribute(text)),
            other => format!("{}={{{}}}", name, self.expression(other, depth + 1)?),
        };

        Ok(Some(attribute))
    }

    /// Renders a value as a JS expression.
    fn expression(&mut self, value: &RuntimeValue, depth: usize) -> Result<String, RenderError> {
        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep);
        }

        let expression = match value {
            RuntimeValue::Undefined => "undefined".to_string(),
            RuntimeValue::Null => "null".to_string(),
            RuntimeValue::Bool(value) => value.to_string(),
            RuntimeValue::Number(value) => format_number(*value),
            RuntimeValue::String(value) => json_string(value),
            RuntimeValue::Function(name) => function_placeholder(name.as_deref()),
            RuntimeValue::Element(element) => self.element(element, depth + 1)?,
            RuntimeValue::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.expression(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("[{}]", items.join(", "))
            }
            RuntimeValue::Object(entries) => {
                if entries.is_empty() {
                    "{}".to_string()
                } else {
                    let entries = entries
                        .iter()
                        .map(|(key, value)| -> Result<String, RenderError> {
                            Ok(format!("{}: {}", object_key(key), self.expression(value, depth + 1)?))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    format!("{{ {} }}", entries.join(", "))
                }
            }
            RuntimeValue::Opaque(description) => {
                return Err(RenderError::Opaque(description.clone()))
            }
        };

        Ok(expression)
    }

    fn children(&mut self, value: &RuntimeValue, depth: usize) -> Result<Vec<String>, RenderError> {
        if depth > MAX_DEPTH {
            return Err(RenderError::TooDeep);
        }

        let children = match value {
            // React renders nothing for these
            RuntimeValue::Undefined | RuntimeValue::Null | RuntimeValue::Bool(_) => Vec::new(),
            RuntimeValue::String(text) if text.is_empty() => Vec::new(),
            RuntimeValue::String(text) => vec![text_child(text)],
            RuntimeValue::Number(value) => vec![format_number(*value)],
            RuntimeValue::Element(element) => vec![self.element(element, depth + 1)?],
            RuntimeValue::Array(items) => {
                let mut children = Vec::new();
                for item in items {
                    children.extend(self.children(item, depth + 1)?);
                }
                children
            }
            other => vec![format!("{{{}}}", self.expression(other, depth + 1)?)],
        };

        Ok(children)
    }
}

fn is_default(element: &Element, name: &str, value: &RuntimeValue) -> bool {
    element
        .default_props
        .iter()
        .any(|(default_name, default_value)| default_name == name && default_value == value)
}

/// The source-like stand-in for a function prop inside rendered template source.
pub fn function_placeholder(name: Option<&str>) -> String {
    match name {
        Some(name) if name != "anonymous" && is_identifier(name) => {
            format!("function {}() {{}}", name)
        }
        _ => "() => {}".to_string(),
    }
}

fn string_attribute(text: &str) -> String {
    if text.contains('"') || text.contains('\n') {
        format!("{{{}}}", json_string(text))
    } else {
        format!("\"{}\"", text)
    }
}

/// Text children that would not survive as raw JSX text, or that carry quotes,
/// are emitted as string expressions.
fn text_child(text: &str) -> String {
    let needs_expression = text
        .contains(|c: char| matches!(c, '{' | '}' | '<' | '>' | '\n' | '"' | '\'' | '`'))
        || text.trim() != text;

    if needs_expression {
        format!("{{{}}}", json_string(text))
    } else {
        text.to_string()
    }
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        json_string(key)
    }
}

fn json_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Integral values become JSON integers so they print as `3`, not `3.0`.
fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        match json_number(value) {
            Some(number) => number.to_string(),
            None => value.to_string(),
        }
    }
}
