//! Fixture (story) generation from captured props.

mod args;
mod imports;
mod jsx_source;
pub mod naming;

use serde::Serialize;

use crate::{
    component::ComponentMeta,
    config::ConfigValues,
    registry::ComponentRegistry,
    resolve::{fixture_path, is_typed_fixture, relative_import_path},
    serialize::{JsxValue, SerializedProps, SerializedValue},
    util,
};

pub use args::render_args;
pub use imports::{scan_imports, ExistingImport, ImportPlan, ImportRef, ImportStatement};
pub use jsx_source::{custom_tags, is_callback, replace_callbacks, rewrite_tags, root_name, GENERIC_ELEMENT};
pub use naming::{
    existing_story_names, story_name_for, to_valid_story_name, unique_story_name, FALLBACK_STORY_NAME,
    MEANINGFUL_PROPS,
};

/// Settings for generated fixture files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureOptions {
    /// Directory, relative to the component's directory, new fixtures are placed in.
    pub stories_dir: Option<String>,
    pub base_library: String,
    pub base_library_local: String,
    /// Module the `Meta` and `StoryObj` types are imported from.
    pub types_module: String,
    /// Module the mock callback helper is imported from.
    pub mock_module: String,
    pub mock_name: String,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            stories_dir: None,
            base_library: "react".to_string(),
            base_library_local: "React".to_string(),
            types_module: "@storybook/react".to_string(),
            mock_module: "@storybook/test".to_string(),
            mock_name: "fn".to_string(),
        }
    }
}

impl FixtureOptions {
    pub fn from_config(config: Option<&ConfigValues>) -> Self {
        Self {
            stories_dir: config.and_then(|config| config.stories_dir.clone()),
            ..Self::default()
        }
    }

    /// The placeholder every callback is replaced with.
    pub fn mock_call(&self) -> String {
        format!("{}()", self.mock_name)
    }
}

/// A fixture file that already exists for the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFixture {
    pub path: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFixture {
    pub content: String,
    pub file_path: String,
    /// The component and every registry reference it imports.
    pub imports: Vec<ImportRef>,
    pub fixture_name: String,
}

/// Generates a fixture binding `meta`'s component to `props`.
///
/// Without `existing`, a complete file is produced at the conventional path.
/// With it, the new fixture is appended to the existing text, whose exports
/// are kept byte-for-byte; only missing imports are added.
pub fn generate(
    meta: &ComponentMeta,
    props: &SerializedProps,
    registry: Option<&ComponentRegistry>,
    explicit_name: Option<&str>,
    existing: Option<&ExistingFixture>,
    options: &FixtureOptions,
) -> GeneratedFixture {
    let component_file = util::to_posix(util::strip_query(&meta.file_path));
    let file_path = match existing {
        Some(existing) => util::to_posix(&existing.path),
        None => fixture_path(&component_file, options.stories_dir.as_deref()),
    };
    let (fixture_dir, _) = util::split_file_name(&file_path);
    let typed = is_typed_fixture(&file_path);

    let taken = existing
        .map(|existing| existing_story_names(&existing.text))
        .unwrap_or_default();
    let fixture_name = unique_story_name(&story_name_for(props, explicit_name), &taken);

    let mock_call = options.mock_call();
    let prepared = PropsPreparer::new(&meta.component_name, registry, &mock_call).prepare(props);

    let mut imports = vec![ImportRef {
        name: meta.component_name.clone(),
        path: relative_import_path(fixture_dir, &component_file),
    }];
    for name in &prepared.refs {
        if let Some(path) = registry.and_then(|registry| registry.get(name)) {
            imports.push(ImportRef {
                name: name.clone(),
                path: relative_import_path(fixture_dir, path),
            });
        }
    }

    let mut plan = ImportPlan::new();
    if prepared.has_jsx {
        plan.add_default(&options.base_library, &options.base_library_local);
    }
    if typed && existing.is_none() {
        plan.add_type(&options.types_module, "Meta");
        plan.add_type(&options.types_module, "StoryObj");
    }
    if prepared.callbacks > 0 {
        plan.add_named(&options.mock_module, &options.mock_name);
    }
    for (index, import) in imports.iter().enumerate() {
        if index == 0 && meta.is_default_export {
            plan.add_default(&import.path, &import.name);
        } else {
            plan.add_named(&import.path, &import.name);
        }
    }

    let content = match existing {
        Some(existing) => {
            let annotated = typed && existing.text.contains("type Story");
            let story = render_story(&fixture_name, annotated, &prepared.props, &mock_call);
            let merged = plan.merge_into(&existing.text);
            format!("{}\n\n{}\n", merged.trim_end(), story)
        }
        None => {
            let story = render_story(&fixture_name, typed, &prepared.props, &mock_call);
            render_fresh(meta, &plan, typed, &story)
        }
    };

    GeneratedFixture {
        content,
        file_path,
        imports,
        fixture_name,
    }
}

fn render_fresh(meta: &ComponentMeta, plan: &ImportPlan, typed: bool, story: &str) -> String {
    let origin = if meta.relative_file_path.is_empty() {
        &meta.file_path
    } else {
        &meta.relative_file_path
    };
    let component = &meta.component_name;

    let mut content = format!("// Captured from {}\n{}\n\n", origin, plan.render());
    if typed {
        content.push_str(&format!(
            "const meta = {{\n  component: {},\n}} satisfies Meta<typeof {}>;\n\nexport default meta;\ntype Story = StoryObj<typeof meta>;\n\n",
            component, component
        ));
    } else {
        content.push_str(&format!(
            "const meta = {{\n  component: {},\n}};\n\nexport default meta;\n\n",
            component
        ));
    }
    content.push_str(story);
    content.push('\n');
    content
}

fn render_story(name: &str, annotated: bool, props: &SerializedProps, mock_call: &str) -> String {
    let annotation = if annotated { ": Story" } else { "" };

    if props.is_empty() {
        format!("export const {}{} = {{}};", name, annotation)
    } else {
        format!(
            "export const {}{} = {{\n  args: {},\n}};",
            name,
            annotation,
            render_args(props, 1, mock_call)
        )
    }
}

/// Props ready to be embedded, plus what embedding them requires.
struct PreparedProps {
    props: SerializedProps,
    /// Registry components referenced by JSX values, in first-seen order.
    refs: Vec<String>,
    has_jsx: bool,
    callbacks: usize,
}

/// Rewrites JSX values so they only reference importable components and
/// mock callbacks, and counts what the rewritten props depend on.
struct PropsPreparer<'a> {
    component_name: &'a str,
    registry: Option<&'a ComponentRegistry>,
    mock_call: &'a str,
    refs: Vec<String>,
    has_jsx: bool,
    callbacks: usize,
}

impl<'a> PropsPreparer<'a> {
    fn new(component_name: &'a str, registry: Option<&'a ComponentRegistry>, mock_call: &'a str) -> Self {
        Self {
            component_name,
            registry,
            mock_call,
            refs: Vec::new(),
            has_jsx: false,
            callbacks: 0,
        }
    }

    fn prepare(mut self, props: &SerializedProps) -> PreparedProps {
        let props = SerializedProps(
            props
                .iter()
                .map(|(key, value)| (key.clone(), self.value(value)))
                .collect(),
        );

        PreparedProps {
            props,
            refs: self.refs,
            has_jsx: self.has_jsx,
            callbacks: self.callbacks,
        }
    }

    fn in_registry(&self, name: &str) -> bool {
        self.registry.map_or(false, |registry| registry.contains(name))
    }

    fn value(&mut self, value: &SerializedValue) -> SerializedValue {
        match value {
            SerializedValue::Jsx(jsx) => SerializedValue::Jsx(self.jsx(jsx)),
            SerializedValue::Function(function) => {
                self.callbacks += 1;
                SerializedValue::Function(function.clone())
            }
            SerializedValue::Array(items) => {
                SerializedValue::Array(items.iter().map(|item| self.value(item)).collect())
            }
            SerializedValue::Object(entries) => SerializedValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), self.value(value)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn jsx(&mut self, jsx: &JsxValue) -> JsxValue {
        self.has_jsx = true;

        let source = rewrite_tags(&jsx.source, |name| {
            name == self.component_name || self.in_registry(name)
        });
        let (source, replaced) = replace_callbacks(&source, self.mock_call);
        self.callbacks += replaced;

        // only tags left after the rewrite need importing
        let mut component_refs: Vec<String> = Vec::new();
        for name in custom_tags(&source) {
            if name != self.component_name && self.in_registry(&name) && !component_refs.contains(&name) {
                component_refs.push(name);
            }
        }

        for name in &component_refs {
            if !self.refs.contains(name) {
                self.refs.push(name.clone());
            }
        }

        JsxValue {
            source,
            component_refs,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn button(is_default_export: bool) -> ComponentMeta {
        ComponentMeta::new("Button", "/p/src/Button.tsx", Some("/p"), is_default_export)
    }

    fn props(value: serde_json::Value) -> SerializedProps {
        SerializedProps::from_json(value)
    }

    fn jsx(source: &str, refs: &[&str]) -> serde_json::Value {
        json!({ "isJSX": true, "source": source, "componentRefs": refs })
    }

    fn fresh(meta: &ComponentMeta, props: &SerializedProps, registry: Option<&ComponentRegistry>) -> GeneratedFixture {
        generate(meta, props, registry, None, None, &FixtureOptions::default())
    }

    #[test]
    fn test_fresh_fixture() {
        let fixture = fresh(
            &button(false),
            &props(json!({ "label": "Click me", "disabled": false })),
            None,
        );

        assert_eq!(fixture.file_path, "/p/src/Button.stories.tsx");
        assert_eq!(fixture.fixture_name, "Default");
        assert_eq!(
            fixture.imports,
            vec![ImportRef {
                name: "Button".to_string(),
                path: "./Button".to_string()
            }]
        );
        assert_eq!(
            fixture.content,
            r#"// Captured from src/Button.tsx
import type { Meta, StoryObj } from "@storybook/react";
import { Button } from "./Button";

const meta = {
  component: Button,
} satisfies Meta<typeof Button>;

export default meta;
type Story = StoryObj<typeof meta>;

export const Default: Story = {
  args: {
    label: "Click me",
    disabled: false,
  },
};
"#
        );
    }

    #[test]
    fn test_name_from_meaningful_prop() {
        let fixture = fresh(&button(false), &props(json!({ "variant": "primary" })), None);

        assert_eq!(fixture.fixture_name, "Primary");
        assert!(fixture.content.contains("export const Primary: Story = {"));
    }

    #[test]
    fn test_default_export_is_imported_as_default() {
        let fixture = fresh(&button(true), &props(json!({})), None);

        assert!(fixture.content.contains("import Button from \"./Button\";\n"));
        assert!(fixture.content.ends_with("export const Default: Story = {};\n"));
    }

    #[test]
    fn test_untyped_fixture() {
        let meta = ComponentMeta::new("Button", "/p/src/Button.jsx", Some("/p"), false);
        let fixture = fresh(&meta, &props(json!({ "size": "lg" })), None);

        assert_eq!(fixture.file_path, "/p/src/Button.stories.jsx");
        assert_eq!(
            fixture.content,
            r#"// Captured from src/Button.jsx
import { Button } from "./Button";

const meta = {
  component: Button,
};

export default meta;

export const Lg = {
  args: {
    size: "lg",
  },
};
"#
        );
    }

    #[test]
    fn test_unresolved_tags_are_downgraded() {
        let fixture = fresh(
            &button(false),
            &props(json!({ "icon": jsx("<Unknown foo=\"bar\" />", &["Unknown"]) })),
            Some(&ComponentRegistry::new()),
        );

        assert!(fixture.content.contains("icon: <div foo=\"bar\" />,"));
        assert!(!fixture.content.contains("Unknown"));
        assert_eq!(fixture.imports.len(), 1);
    }

    #[test]
    fn test_registered_refs_and_callbacks() {
        let registry: ComponentRegistry = vec![("Widget", "/p/src/widgets/Widget.tsx")].into_iter().collect();
        let fixture = fresh(
            &button(false),
            &props(json!({ "children": jsx("<Widget onClick={() => doThing()} />", &["Widget"]) })),
            Some(&registry),
        );

        assert!(fixture.content.contains("children: <Widget onClick={fn()} />,"));
        assert!(fixture.content.contains("import { Widget } from \"./widgets/Widget\";\n"));
        assert_eq!(fixture.content.matches("import { fn } from \"@storybook/test\";").count(), 1);
        assert!(fixture.content.contains("import React from \"react\";\n"));
        assert_eq!(
            fixture.imports[1],
            ImportRef {
                name: "Widget".to_string(),
                path: "./widgets/Widget".to_string()
            }
        );
    }

    #[test]
    fn test_refs_replaced_with_callbacks_are_not_imported() {
        let registry: ComponentRegistry = vec![("Icon", "/p/src/Icon.tsx"), ("List", "/p/src/List.tsx")]
            .into_iter()
            .collect();
        let fixture = fresh(
            &button(false),
            &props(json!({ "slot": jsx("<List render={() => <Icon />} />", &["List", "Icon"]) })),
            Some(&registry),
        );

        assert!(fixture.content.contains("slot: <List render={fn()} />,"));
        assert!(fixture.content.contains("import { List } from \"./List\";\n"));
        assert!(!fixture.content.contains("Icon"));
        assert_eq!(fixture.imports.len(), 2);
    }

    #[test]
    fn test_element_text_with_quotes_keeps_later_props_safe() {
        let registry: ComponentRegistry = vec![("Card", "/p/src/Card.tsx")].into_iter().collect();
        let fixture = fresh(
            &button(false),
            &props(json!({
                "children": jsx(
                    "<Card footer={<p>Don't</p>} onClose={() => close()}>\n  <Unknown />\n</Card>",
                    &["Card", "Unknown"]
                )
            })),
            Some(&registry),
        );

        assert!(!fixture.content.contains("<Unknown"));
        assert!(fixture.content.contains("onClose={fn()}"));
        assert!(fixture.content.contains("import { fn } from \"@storybook/test\";"));
    }

    #[test]
    fn test_mock_import_appears_once() {
        let fixture = fresh(
            &button(false),
            &props(json!({
                "onClick": { "isFunction": true, "name": "handleClick" },
                "onHover": { "isFunction": true },
                "footer": jsx("<Button onClick={() => save()} onBlur={async () => {}} />", &["Button"]),
            })),
            None,
        );

        assert!(fixture.content.contains("onClick: fn(),"));
        assert!(fixture.content.contains("onHover: fn(),"));
        assert!(fixture.content.contains("footer: <Button onClick={fn()} onBlur={fn()} />,"));
        assert_eq!(fixture.content.matches("import { fn }").count(), 1);
    }

    #[test]
    fn test_self_reference_is_not_imported_twice() {
        let fixture = fresh(
            &button(false),
            &props(json!({ "children": jsx("<Button>Nested</Button>", &["Button"]) })),
            Some(&vec![("Button", "/p/src/Button.tsx")].into_iter().collect::<ComponentRegistry>()),
        );

        assert_eq!(fixture.content.matches("Button }").count(), 1);
        assert_eq!(fixture.imports.len(), 1);
        assert!(fixture.content.contains("children: <Button>Nested</Button>,"));
    }

    #[test]
    fn test_refs_from_one_module_share_a_statement() {
        let registry: ComponentRegistry = vec![("Card", "/p/src/Card.tsx"), ("CardHeader", "/p/src/Card.tsx")]
            .into_iter()
            .collect();
        let fixture = fresh(
            &button(false),
            &props(json!({ "slot": jsx("<Card>\n  <CardHeader />\n  <Card.Body />\n</Card>", &["Card", "CardHeader"]) })),
            Some(&registry),
        );

        assert!(fixture.content.contains("import { Card, CardHeader } from \"./Card\";\n"));
        assert!(fixture.content.contains(
            "    slot: (\n      <Card>\n        <CardHeader />\n        <Card.Body />\n      </Card>\n    ),\n"
        ));
    }

    #[test]
    fn test_nested_values_are_prepared() {
        let fixture = fresh(
            &button(false),
            &props(json!({ "items": [{ "icon": jsx("<Star />", &["Star"]) }] })),
            None,
        );

        assert!(fixture.content.contains("icon: <div />,"));
        assert!(fixture.content.contains("import React from \"react\";"));
    }

    #[test]
    fn test_stories_dir() {
        let options = FixtureOptions {
            stories_dir: Some("__stories__".to_string()),
            ..FixtureOptions::default()
        };
        let fixture = generate(&button(false), &SerializedProps::new(), None, None, None, &options);

        assert_eq!(fixture.file_path, "/p/src/__stories__/Button.stories.tsx");
        assert!(fixture.content.contains("import { Button } from \"../Button\";"));
    }

    #[test]
    fn test_append_to_existing_fixture() {
        let existing_text = r#"import type { Meta, StoryObj } from "@storybook/react";
import { Button } from "./Button";

const meta = {
  component: Button,
} satisfies Meta<typeof Button>;

export default meta;
type Story = StoryObj<typeof meta>;

export const Primary: Story = {
  args: {
    variant: "primary",
  },
};
"#;
        let existing = ExistingFixture {
            path: "/p/src/Button.stories.tsx".to_string(),
            text: existing_text.to_string(),
        };
        let registry: ComponentRegistry = vec![("Icon", "/p/src/Icon.tsx")].into_iter().collect();
        let fixture = generate(
            &button(false),
            &props(json!({ "variant": "primary", "icon": jsx("<Icon />", &["Icon"]) })),
            Some(&registry),
            None,
            Some(&existing),
            &FixtureOptions::default(),
        );

        assert_eq!(fixture.fixture_name, "Primary2");
        assert_eq!(
            fixture.content,
            r#"import type { Meta, StoryObj } from "@storybook/react";
import { Button } from "./Button";
import React from "react";
import { Icon } from "./Icon";

const meta = {
  component: Button,
} satisfies Meta<typeof Button>;

export default meta;
type Story = StoryObj<typeof meta>;

export const Primary: Story = {
  args: {
    variant: "primary",
  },
};

export const Primary2: Story = {
  args: {
    variant: "primary",
    icon: <Icon />,
  },
};
"#
        );
    }

    #[test]
    fn test_append_suffixes_past_existing_names() {
        let existing = ExistingFixture {
            path: "/p/src/Button.stories.jsx".to_string(),
            text: "import { Button } from \"./Button\";\n\nexport default { component: Button };\n\nexport const N = {};\nexport const N2 = {};\nexport const N3 = {};\n\n\n".to_string(),
        };
        let fixture = generate(
            &button(false),
            &props(json!({ "onClick": { "isFunction": true, "name": "go" } })),
            None,
            Some("N"),
            Some(&existing),
            &FixtureOptions::default(),
        );

        assert_eq!(fixture.fixture_name, "N4");
        assert_eq!(fixture.file_path, "/p/src/Button.stories.jsx");
        assert_eq!(
            fixture.content,
            "import { Button } from \"./Button\";\nimport { fn } from \"@storybook/test\";\n\nexport default { component: Button };\n\nexport const N = {};\nexport const N2 = {};\nexport const N3 = {};\n\nexport const N4 = {\n  args: {\n    onClick: fn(),\n  },\n};\n"
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let registry: ComponentRegistry = vec![("Icon", "/p/src/Icon.tsx"), ("Badge", "/p/lib/Badge.tsx")]
            .into_iter()
            .collect();
        let input = props(json!({
            "kind": "alert",
            "icon": jsx("<Badge><Icon /></Badge>", &["Badge", "Icon"]),
            "onClose": { "isFunction": true, "name": "close" },
        }));

        let first = fresh(&button(false), &input, Some(&registry));
        let second = fresh(&button(false), &input, Some(&registry));

        assert_eq!(first, second);
        assert!(first.content.contains("import { Badge } from \"../lib/Badge\";"));
    }

    #[test]
    fn test_fixture_serializes_camel_case() {
        let fixture = fresh(&button(false), &SerializedProps::new(), None);
        let value = serde_json::to_value(&fixture).unwrap();

        assert_eq!(value["filePath"], "/p/src/Button.stories.tsx");
        assert_eq!(value["fixtureName"], "Default");
        assert_eq!(value["imports"][0]["path"], "./Button");
    }
}
