use serde::Serialize;

use crate::component::quote;

/// A resolved import of a component into a fixture file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRef {
    pub name: String,
    pub path: String,
}

/// One `import` statement, possibly binding a default and several named specifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStatement {
    pub source: String,
    pub default: Option<String>,
    pub named: Vec<String>,
    pub type_only: bool,
}

impl ImportStatement {
    fn empty(source: &str, type_only: bool) -> Self {
        Self {
            source: source.to_string(),
            default: None,
            named: Vec::new(),
            type_only,
        }
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.named.is_empty()
    }

    fn binds(&self, name: &str) -> bool {
        self.default.as_deref() == Some(name) || self.named.iter().any(|named| named == name)
    }

    pub fn render(&self) -> String {
        let mut clause = Vec::new();
        if let Some(default) = &self.default {
            clause.push(default.clone());
        }
        if !self.named.is_empty() {
            clause.push(format!("{{ {} }}", self.named.join(", ")));
        }

        let keyword = if self.type_only { "import type" } else { "import" };
        format!("{} {} from {};", keyword, clause.join(", "), quote(&self.source))
    }
}

/// The imports a fixture needs, grouped by module in the order they were first requested.
///
/// A local name is only ever bound once; requesting it again is a no-op.
#[derive(Debug, Default)]
pub struct ImportPlan {
    statements: Vec<ImportStatement>,
}

impl ImportPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_default(&mut self, source: &str, name: &str) {
        if !self.binds(name) {
            self.statement(source, false).default = Some(name.to_string());
        }
    }

    pub fn add_named(&mut self, source: &str, name: &str) {
        if !self.binds(name) {
            self.statement(source, false).named.push(name.to_string());
        }
    }

    pub fn add_type(&mut self, source: &str, name: &str) {
        if !self.binds(name) {
            self.statement(source, true).named.push(name.to_string());
        }
    }

    fn statement(&mut self, source: &str, type_only: bool) -> &mut ImportStatement {
        let index = match self
            .statements
            .iter()
            .position(|statement| statement.source == source && statement.type_only == type_only)
        {
            Some(index) => index,
            None => {
                self.statements.push(ImportStatement::empty(source, type_only));
                self.statements.len() - 1
            }
        };

        &mut self.statements[index]
    }

    pub fn statements(&self) -> &[ImportStatement] {
        &self.statements
    }

    pub fn binds(&self, name: &str) -> bool {
        self.statements.iter().any(|statement| statement.binds(name))
    }

    /// Import lines for a fresh file.
    pub fn render(&self) -> String {
        self.statements
            .iter()
            .map(ImportStatement::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Adds whatever `text` does not import yet, leaving everything else untouched.
    ///
    /// Names missing from an existing named import of the same module are
    /// appended to its specifier list; anything else becomes a new line
    /// after the last top-of-file import.
    pub fn merge_into(&self, text: &str) -> String {
        let existing = scan_imports(text);
        let is_bound = |name: &str| existing.iter().any(|import| import.binds(name));

        let mut edits: Vec<(usize, String)> = Vec::new();
        let mut new_lines = Vec::new();

        for statement in &self.statements {
            let mut missing = ImportStatement::empty(&statement.source, statement.type_only);
            missing.default = statement.default.clone().filter(|name| !is_bound(name.as_str()));

            let named: Vec<&String> = statement.named.iter().filter(|name| !is_bound(name.as_str())).collect();
            let extendable = existing
                .iter()
                .filter(|import| import.source == statement.source && import.type_only == statement.type_only)
                .find_map(|import| import.named_insert.as_ref());

            match extendable {
                Some(insert) if !named.is_empty() => {
                    let mut addition = String::new();
                    for (index, name) in named.iter().enumerate() {
                        addition.push_str(if index == 0 { insert.separator } else { ", " });
                        addition.push_str(name);
                    }
                    edits.push((insert.position, addition));
                }
                _ => missing.named = named.into_iter().cloned().collect(),
            }

            if !missing.is_empty() {
                new_lines.push(missing.render());
            }
        }

        if !new_lines.is_empty() {
            match existing.last() {
                Some(last) => edits.push((
                    last.end,
                    new_lines.iter().map(|line| format!("\n{}", line)).collect(),
                )),
                None => edits.push((0, format!("{}\n", new_lines.join("\n")))),
            }
        }

        let mut output = text.to_string();
        edits.sort_by(|a, b| b.0.cmp(&a.0));
        for (position, insertion) in edits {
            output.insert_str(position, &insertion);
        }
        output
    }
}

/// Where another specifier can be added to an existing `{ ... }` list.
#[derive(Debug, PartialEq)]
struct NamedInsert {
    position: usize,
    separator: &'static str,
}

/// An import statement found at the top of an existing file.
#[derive(Debug, PartialEq)]
pub struct ExistingImport {
    pub start: usize,
    /// Offset just past the statement, including its semicolon.
    pub end: usize,
    pub source: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// Local names bound by the specifier list.
    pub named: Vec<String>,
    pub type_only: bool,
    named_insert: Option<NamedInsert>,
}

impl ExistingImport {
    pub fn binds(&self, name: &str) -> bool {
        self.default.as_deref() == Some(name)
            || self.namespace.as_deref() == Some(name)
            || self.named.iter().any(|named| named == name)
    }
}

/// Reads the run of import statements at the top of `text`, skipping comments and blank lines.
pub fn scan_imports(text: &str) -> Vec<ExistingImport> {
    let mut imports = Vec::new();
    let mut position = skip_trivia(text, 0);

    while let Some(import) = parse_import(text, position) {
        position = skip_trivia(text, import.end);
        imports.push(import);
    }

    imports
}

fn skip_trivia(text: &str, mut position: usize) -> usize {
    loop {
        let rest = &text[position..];
        let trimmed = rest.trim_start();
        position += rest.len() - trimmed.len();

        if trimmed.starts_with("//") {
            position += trimmed.find('\n').unwrap_or(trimmed.len());
        } else if trimmed.starts_with("/*") {
            position += trimmed.find("*/").map_or(trimmed.len(), |end| end + 2);
        } else {
            return position;
        }
    }
}

fn parse_import(text: &str, start: usize) -> Option<ExistingImport> {
    let after_keyword = text[start..].strip_prefix("import")?;
    match after_keyword.chars().next() {
        Some(c) if c.is_whitespace() || matches!(c, '{' | '*' | '"' | '\'') => {}
        _ => return None,
    }

    let bytes = text.as_bytes();
    let clause_start = start + "import".len();
    let mut brace_open = None;
    let mut brace_close = None;
    let mut i = clause_start;

    // the module specifier is the first string literal; clauses hold none
    while i < bytes.len() && !matches!(bytes[i], b'"' | b'\'') {
        match bytes[i] {
            b'{' => brace_open = Some(i),
            b'}' => brace_close = Some(i),
            b';' => return None,
            _ => {}
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    let quote = bytes[i] as char;
    let source_start = i + 1;
    let source_end = source_start + text[source_start..].find(quote)?;
    let mut end = source_end + 1;

    let after = &text[end..];
    let padding = after.len() - after.trim_start_matches(&[' ', '\t'][..]).len();
    if after[padding..].starts_with(';') {
        end += padding + 1;
    }

    let clause = text[clause_start..i].trim();
    let clause = clause.strip_suffix("from").unwrap_or(clause).trim_end();
    let (type_only, clause) = match clause.strip_prefix("type") {
        Some(rest) if rest.starts_with(|c: char| c.is_whitespace() || c == '{') => (true, rest.trim_start()),
        _ => (false, clause),
    };

    let mut default = None;
    let mut namespace = None;
    let head = clause.split('{').next().unwrap_or_default();
    for part in head.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => namespace = rest.trim().strip_prefix("as").map(|name| name.trim().to_string()),
            None => default = Some(part.to_string()),
        }
    }

    let mut named = Vec::new();
    let mut named_insert = None;
    if let (Some(open), Some(close)) = (brace_open, brace_close) {
        if open < close {
            let inner = &text[open + 1..close];
            for specifier in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let specifier = specifier.strip_prefix("type ").unwrap_or(specifier);
                let local = specifier.rsplit(" as ").next().unwrap_or(specifier).trim();
                named.push(local.to_string());
            }

            let content = inner.trim_end();
            let separator = if content.trim().is_empty() || content.ends_with(',') {
                " "
            } else {
                ", "
            };
            named_insert = Some(NamedInsert {
                position: open + 1 + content.len(),
                separator,
            });
        }
    }

    Some(ExistingImport {
        start,
        end,
        source: text[source_start..source_end].to_string(),
        default,
        namespace,
        named,
        type_only,
        named_insert,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_groups_by_module() {
        let mut plan = ImportPlan::new();
        plan.add_default("react", "React");
        plan.add_type("@storybook/react", "Meta");
        plan.add_type("@storybook/react", "StoryObj");
        plan.add_named("./Card", "Card");
        plan.add_named("./Card", "CardHeader");
        plan.add_default("./Card", "CardRoot");
        plan.add_named("./Icon", "Card");

        assert_eq!(
            plan.render(),
            "import React from \"react\";\n\
             import type { Meta, StoryObj } from \"@storybook/react\";\n\
             import CardRoot, { Card, CardHeader } from \"./Card\";"
        );
    }

    #[test]
    fn test_scan_imports() {
        let text = "// header\n/* block */\nimport React from 'react';\nimport type { Meta, StoryObj } from \"@storybook/react\";\nimport * as Icons from './icons'\nimport { Button as Btn, type Size, } from './Button';\n\nconst meta = {};\nimport { late } from './late';\n";
        let imports = scan_imports(text);

        assert_eq!(imports.len(), 4);
        assert_eq!(imports[0].default.as_deref(), Some("React"));
        assert_eq!(imports[0].source, "react");
        assert!(imports[1].type_only);
        assert_eq!(imports[1].named, vec!["Meta", "StoryObj"]);
        assert_eq!(imports[2].namespace.as_deref(), Some("Icons"));
        assert!(text[imports[2].start..imports[2].end].ends_with("'./icons'"));
        assert_eq!(imports[3].named, vec!["Btn", "Size"]);
        assert!(text[imports[3].start..imports[3].end].ends_with(';'));
    }

    #[test]
    fn test_merge_extends_existing_named_import() {
        let text = "import { Button } from \"./Button\";\n\nexport const Primary = {};\n";
        let mut plan = ImportPlan::new();
        plan.add_named("./Button", "Button");
        plan.add_named("./Button", "ButtonGroup");
        plan.add_named("./Button", "ButtonIcon");

        assert_eq!(
            plan.merge_into(text),
            "import { Button, ButtonGroup, ButtonIcon } from \"./Button\";\n\nexport const Primary = {};\n"
        );
    }

    #[test]
    fn test_merge_after_trailing_comma() {
        let text = "import {\n  Button,\n} from \"./Button\";\n";
        let mut plan = ImportPlan::new();
        plan.add_named("./Button", "Icon");

        assert_eq!(plan.merge_into(text), "import {\n  Button, Icon\n} from \"./Button\";\n");
    }

    #[test]
    fn test_merge_adds_new_lines_after_last_import() {
        let text = "import React from \"react\";\nimport { Button } from \"./Button\";\n\nexport const Primary = {};\n";
        let mut plan = ImportPlan::new();
        plan.add_default("react", "React");
        plan.add_named("@storybook/test", "fn");
        plan.add_named("./Button", "Button");
        plan.add_named("../Icon", "Icon");

        assert_eq!(
            plan.merge_into(text),
            "import React from \"react\";\nimport { Button } from \"./Button\";\nimport { fn } from \"@storybook/test\";\nimport { Icon } from \"../Icon\";\n\nexport const Primary = {};\n"
        );
    }

    #[test]
    fn test_merge_skips_names_bound_elsewhere() {
        let text = "import * as React from 'react';\nimport Button from './Button.tsx';\n";
        let mut plan = ImportPlan::new();
        plan.add_default("react", "React");
        plan.add_default("./Button", "Button");

        assert_eq!(plan.merge_into(text), text);
    }

    #[test]
    fn test_merge_without_imports_prepends() {
        let text = "export const Primary = {};\n";
        let mut plan = ImportPlan::new();
        plan.add_named("./Button", "Button");

        assert_eq!(
            plan.merge_into(text),
            "import { Button } from \"./Button\";\nexport const Primary = {};\n"
        );
    }

    #[test]
    fn test_type_imports_are_not_merged_into_value_imports() {
        let text = "import { Button } from \"@storybook/react\";\n";
        let mut plan = ImportPlan::new();
        plan.add_type("@storybook/react", "Meta");

        assert_eq!(
            plan.merge_into(text),
            "import { Button } from \"@storybook/react\";\nimport type { Meta } from \"@storybook/react\";\n"
        );
    }
}
