use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// A UI subtree captured as template source.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxValue {
    pub source: String,
    /// Custom component names referenced anywhere in `source`, without duplicates.
    pub component_refs: Vec<String>,
}

/// Placeholder for a function prop; the function itself is never captured.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
}

/// One node of a serialized props tree.
///
/// On the wire, JSX values are `{ "isJSX": true, "source", "componentRefs" }`
/// and functions are `{ "isFunction": true, "name" }`.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedValue {
    Null,
    /// Only produced in-process; written as `null` on the wire.
    Undefined,
    Bool(bool),
    Number(Number),
    String(String),
    Jsx(JsxValue),
    Function(FunctionValue),
    Array(Vec<SerializedValue>),
    Object(Vec<(String, SerializedValue)>),
}

/// Prop name to value, in the order the props were captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedProps(pub Vec<(String, SerializedValue)>);

impl SerializedProps {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: &str, value: SerializedValue) {
        match self.0.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SerializedValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, SerializedValue)> {
        self.0.iter()
    }

    pub fn from_json(value: Value) -> Self {
        match SerializedValue::from_json(value) {
            SerializedValue::Object(entries) => Self(entries),
            _ => Self::new(),
        }
    }
}

impl SerializedValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => SerializedValue::Null,
            Value::Bool(value) => SerializedValue::Bool(value),
            Value::Number(value) => SerializedValue::Number(value),
            Value::String(value) => SerializedValue::String(value),
            Value::Array(items) => {
                SerializedValue::Array(items.into_iter().map(Self::from_json).collect())
            }
            Value::Object(map) => Self::from_json_object(map),
        }
    }

    fn from_json_object(mut map: Map<String, Value>) -> Self {
        if map.get("isJSX") == Some(&Value::Bool(true)) {
            let source = match map.remove("source") {
                Some(Value::String(source)) => source,
                _ => String::new(),
            };
            let mut component_refs: Vec<String> = Vec::new();
            if let Some(Value::Array(refs)) = map.remove("componentRefs") {
                for name in refs.into_iter().filter_map(|r| r.as_str().map(str::to_string)) {
                    if !component_refs.contains(&name) {
                        component_refs.push(name);
                    }
                }
            }

            return SerializedValue::Jsx(JsxValue {
                source,
                component_refs,
            });
        }

        if map.get("isFunction") == Some(&Value::Bool(true)) {
            let name = map
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or("anonymous")
                .to_string();

            return SerializedValue::Function(FunctionValue { name });
        }

        SerializedValue::Object(
            map.into_iter()
                .map(|(key, value)| (key, Self::from_json(value)))
                .collect(),
        )
    }

    pub fn to_json(&self) -> Value {
        match self {
            SerializedValue::Null | SerializedValue::Undefined => Value::Null,
            SerializedValue::Bool(value) => Value::Bool(*value),
            SerializedValue::Number(value) => Value::Number(value.clone()),
            SerializedValue::String(value) => Value::String(value.clone()),
            SerializedValue::Jsx(jsx) => serde_json::json!({
                "isJSX": true,
                "source": jsx.source,
                "componentRefs": jsx.component_refs,
            }),
            SerializedValue::Function(function) => serde_json::json!({
                "isFunction": true,
                "name": function.name,
            }),
            SerializedValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            SerializedValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for SerializedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SerializedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

impl Serialize for SerializedProps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SerializedValue::Object(self.0.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SerializedProps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}
