mod candidates;

use std::fmt;

use oxc_allocator::Allocator;
use oxc_ast::ast::{ImportDeclarationSpecifier, Program, Statement};
use storyline_logger::Logger;

use crate::{
    component::{quote, ComponentMeta},
    config::ConfigValues,
    parse::{parse_tsx, source_type_for},
    util,
};

pub use candidates::{contains_jsx, find_components, Candidate, Replacement};

pub const DEFAULT_RUNTIME_MODULE: &str = "virtual:storyline/runtime";
pub const DEFAULT_ADAPTER_NAME: &str = "withComponentTracking";

/// Settings for instrumenting a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Module the tracking adapter is imported from.
    pub runtime_module: String,
    /// Exported name of the tracking adapter.
    pub adapter_name: String,
    /// Local alias the adapter is bound to inside instrumented modules.
    pub adapter_local: String,
    pub base_library: String,
    pub base_library_local: String,
    /// Used to compute `relativeFilePath`.
    pub project_root: Option<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            adapter_name: DEFAULT_ADAPTER_NAME.to_string(),
            adapter_local: "__storylineTrack".to_string(),
            base_library: "react".to_string(),
            base_library_local: "React".to_string(),
            project_root: None,
        }
    }
}

impl RewriteOptions {
    pub fn from_config(config: Option<&ConfigValues>, project_root: Option<String>) -> Self {
        let mut options = Self {
            project_root,
            ..Self::default()
        };

        if let Some(config) = config {
            if let Some(runtime_module) = &config.runtime_module {
                options.runtime_module = runtime_module.clone();
            }
            if let Some(adapter_name) = &config.adapter_name {
                options.adapter_name = adapter_name.clone();
            }
        }

        options
    }
}

/// Why a module was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnchangedReason {
    UnsupportedFile,
    ParseFailure(String),
    NoTemplateSyntax,
    NoComponents,
}

impl fmt::Display for UnchangedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnchangedReason::UnsupportedFile => write!(f, "not a JS/TS module"),
            UnchangedReason::ParseFailure(_) => write!(f, "failed to parse"),
            UnchangedReason::NoTemplateSyntax => write!(f, "no JSX found"),
            UnchangedReason::NoComponents => write!(f, "no components found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten {
        code: String,
        components: Vec<ComponentMeta>,
    },
    Unchanged(UnchangedReason),
}

impl RewriteOutcome {
    pub fn code(&self) -> Option<&str> {
        match self {
            RewriteOutcome::Rewritten { code, .. } => Some(code),
            RewriteOutcome::Unchanged(_) => None,
        }
    }
}

/// Instruments every top-level component of a module with the tracking adapter.
///
/// Each component definition is replaced by `adapter(definition, meta)`, bound
/// to the same name with the same export form. The adapter import (and a
/// default import of the base library when missing) is placed at the top of
/// the module. Never fails: anything unexpected leaves the module unchanged.
pub fn rewrite(source: &str, file_identity: &str, options: &RewriteOptions) -> RewriteOutcome {
    let Some(source_type) = source_type_for(file_identity) else {
        return RewriteOutcome::Unchanged(UnchangedReason::UnsupportedFile);
    };

    if !source.contains('<') {
        return RewriteOutcome::Unchanged(UnchangedReason::NoTemplateSyntax);
    }

    let file_path = util::to_posix(util::strip_query(file_identity));
    let allocator = Allocator::default();
    let parsed = match parse_tsx(&allocator, &file_path, source, source_type) {
        Ok(parsed) => parsed,
        Err(diagnostic) => {
            Logger::warn(&format!("Failed to parse {}, leaving it unchanged", file_path));
            Logger::warn(&diagnostic);
            return RewriteOutcome::Unchanged(UnchangedReason::ParseFailure(diagnostic));
        }
    };
    let program = &parsed.program;

    if !contains_jsx(program) {
        return RewriteOutcome::Unchanged(UnchangedReason::NoTemplateSyntax);
    }

    let candidates = find_components(program, &file_path);
    if candidates.is_empty() {
        Logger::debug(&format!("No components found in {}", file_path), 2);
        return RewriteOutcome::Unchanged(UnchangedReason::NoComponents);
    }

    let mut splices: Vec<Splice> = Vec::new();
    let mut components: Vec<ComponentMeta> = Vec::new();

    for candidate in &candidates {
        let meta = ComponentMeta::new(
            &candidate.name,
            &file_path,
            options.project_root.as_deref(),
            candidate.is_default_export,
        );
        Logger::debug(
            &format!("Instrumenting component {} ({})", meta.component_name, meta.source_id),
            2,
        );

        splices.push(replace_candidate(source, candidate, &meta, &options.adapter_local));
        splices.extend(candidate.moved_exports.iter().map(|export| Splice {
            start: export.start as usize,
            end: export.end as usize,
            text: String::new(),
        }));
        components.push(meta);
    }

    splices.push(import_splice(program, options));

    RewriteOutcome::Rewritten {
        code: apply_splices(source, splices),
        components,
    }
}

/// Replaces `source[start..end]` with `text`.
#[derive(Debug)]
struct Splice {
    start: usize,
    end: usize,
    text: String,
}

fn replace_candidate(
    source: &str,
    candidate: &Candidate,
    meta: &ComponentMeta,
    adapter: &str,
) -> Splice {
    let original = candidate.span.source_text(source);
    let meta_literal = meta.to_object_literal();
    let name = &candidate.name;

    let text = match candidate.replacement {
        Replacement::Initializer | Replacement::DefaultExpression => {
            format!("{}({}, {})", adapter, original, meta_literal)
        }
        Replacement::FunctionDeclaration => {
            let mut text = format!("const {} = {}({}, {});", name, adapter, original, meta_literal);
            for export in &candidate.moved_exports {
                text.push('\n');
                text.push_str(export.source_text(source));
            }
            text
        }
        Replacement::DefaultFunctionDeclaration { function } => format!(
            "const {} = {}({}, {});\nexport default {};",
            name,
            adapter,
            function.source_text(source),
            meta_literal,
            name
        ),
    };

    Splice {
        start: candidate.span.start as usize,
        end: candidate.span.end as usize,
        text,
    }
}

/// The adapter import, plus the base library when the module does not import its default.
fn import_splice(program: &Program, options: &RewriteOptions) -> Splice {
    let mut lines = vec![format!(
        "import {{ {} as {} }} from {};",
        options.adapter_name,
        options.adapter_local,
        quote(&options.runtime_module)
    )];

    if !imports_base_library(program, &options.base_library) {
        lines.push(format!(
            "import {} from {};",
            options.base_library_local,
            quote(&options.base_library)
        ));
    }

    // imports must not precede a hashbang or a "use client" prologue
    let position = program
        .directives
        .last()
        .map(|directive| directive.span.end)
        .or_else(|| program.hashbang.as_ref().map(|hashbang| hashbang.span.end))
        .unwrap_or(0) as usize;

    let block = lines.join("\n");
    let text = if position == 0 {
        format!("{}\n", block)
    } else {
        format!("\n{}", block)
    };

    Splice {
        start: position,
        end: position,
        text,
    }
}

fn imports_base_library(program: &Program, base_library: &str) -> bool {
    program.body.iter().any(|statement| {
        let Statement::ImportDeclaration(import) = statement else {
            return false;
        };

        import.source.value.as_str() == base_library
            && import.specifiers.as_ref().map_or(false, |specifiers| {
                specifiers.iter().any(|specifier| {
                    matches!(
                        specifier,
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(_)
                            | ImportDeclarationSpecifier::ImportNamespaceSpecifier(_)
                    )
                })
            })
    })
}

/// Applies splices back to front so earlier offsets stay valid.
fn apply_splices(source: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut code = source.to_string();
    for splice in splices {
        code.replace_range(splice.start..splice.end, &splice.text);
    }

    code
}
