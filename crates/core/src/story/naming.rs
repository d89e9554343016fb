use crate::serialize::{SerializedProps, SerializedValue};

/// Prop keys whose value names a story, in priority order.
pub const MEANINGFUL_PROPS: [&str; 9] = [
    "variant",
    "type",
    "size",
    "mode",
    "status",
    "kind",
    "color",
    "intent",
    "appearance",
];

pub const FALLBACK_STORY_NAME: &str = "Default";

/// Picks the raw story name for a set of props and normalizes it.
///
/// An explicit name wins; then the value of the first meaningful prop; then
/// the key of the first `true` prop; then [`FALLBACK_STORY_NAME`].
pub fn story_name_for(props: &SerializedProps, explicit: Option<&str>) -> String {
    if let Some(explicit) = explicit.filter(|name| !name.trim().is_empty()) {
        return to_valid_story_name(explicit);
    }

    for key in MEANINGFUL_PROPS {
        match props.get(key) {
            Some(SerializedValue::String(value)) if !value.trim().is_empty() => {
                return to_valid_story_name(value);
            }
            Some(SerializedValue::Number(value)) => return to_valid_story_name(&value.to_string()),
            _ => {}
        }
    }

    let first_true = props
        .iter()
        .find(|(_, value)| *value == SerializedValue::Bool(true));
    if let Some((key, _)) = first_true {
        return to_valid_story_name(key);
    }

    FALLBACK_STORY_NAME.to_string()
}

/// Turns arbitrary text into a PascalCase identifier: `"extra-large"` becomes `"ExtraLarge"`.
pub fn to_valid_story_name(raw: &str) -> String {
    let name: String = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    if name.is_empty() {
        return FALLBACK_STORY_NAME.to_string();
    }

    // identifiers cannot start with a digit
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("Story{}", name);
    }

    name
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Names bound by top-level `export const <Name>` lines.
pub fn existing_story_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("export const "))
        .map(|rest| {
            rest.trim_start()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Suffixes `name` with 2, 3, ... until it no longer collides with `existing`.
pub fn unique_story_name(name: &str, existing: &[String]) -> String {
    if !existing.iter().any(|taken| taken == name) {
        return name.to_string();
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{}{}", name, suffix);
        if !existing.iter().any(|taken| *taken == candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
