use oxc_ast::{
    ast::{
        Argument, BindingPatternKind, CallExpression, Declaration, ExportDefaultDeclarationKind,
        Expression, Function, JSXElement, JSXFragment, Program, Statement, VariableDeclaration,
    },
    Visit,
};
use oxc_span::{GetSpan, Span};
use storyline_logger::Logger;

use crate::util;

/// Callee names treated as component wrappers, matched by name only.
const WRAPPER_CALLEES: [&str; 2] = ["memo", "forwardRef"];

/// How the source of a matched candidate is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// `const Button = <init>`: only the initializer is wrapped.
    Initializer,
    /// `function Button() {}` turns into `const Button = track(function Button() {}, meta);`
    FunctionDeclaration,
    /// `export default function Button() {}`: the statement becomes a tracked
    /// binding followed by `export default Button;`.
    DefaultFunctionDeclaration { function: Span },
    /// `export default <expr>`: the expression is wrapped in place.
    DefaultExpression,
}

/// A top-level component definition found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub is_default_export: bool,
    pub span: Span,
    pub replacement: Replacement,
    /// `export default Button;` statements that precede a function declaration.
    /// The rewritten declaration is not hoisted, so these move after it.
    pub moved_exports: Vec<Span>,
}

/// Finds component definitions among the top-level statements of `program`.
///
/// `file_path` is used to name anonymous default exports after the file stem.
pub fn find_components(program: &Program, file_path: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut default_names: Vec<String> = Vec::new();
    let mut default_statements: Vec<(String, Span)> = Vec::new();

    for statement in &program.body {
        match statement {
            Statement::FunctionDeclaration(function) => {
                candidates.extend(function_candidate(function));
            }
            Statement::VariableDeclaration(declaration) => {
                candidates.extend(variable_candidates(declaration));
            }
            Statement::ExportNamedDeclaration(export) => {
                match &export.declaration {
                    Some(Declaration::FunctionDeclaration(function)) => {
                        candidates.extend(function_candidate(function));
                    }
                    Some(Declaration::VariableDeclaration(declaration)) => {
                        candidates.extend(variable_candidates(declaration));
                    }
                    _ => {}
                }

                // export { Button as default }
                if export.source.is_none() {
                    for specifier in &export.specifiers {
                        if specifier.exported.name() == "default" {
                            default_names.push(specifier.local.name().to_string());
                        }
                    }
                }
            }
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                    if function.body.is_none() {
                        continue;
                    }

                    match &function.id {
                        Some(id) if util::is_pascal_case(&id.name) => {
                            candidates.push(Candidate {
                                name: id.name.to_string(),
                                is_default_export: true,
                                span: export.span,
                                replacement: Replacement::DefaultFunctionDeclaration {
                                    function: function.span,
                                },
                                moved_exports: Vec::new(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            candidates.extend(default_expression(function.span, None, file_path));
                        }
                    }
                }
                ExportDefaultDeclarationKind::Identifier(identifier) => {
                    default_names.push(identifier.name.to_string());
                    default_statements.push((identifier.name.to_string(), export.span));
                }
                ExportDefaultDeclarationKind::ArrowFunctionExpression(arrow) => {
                    candidates.extend(default_expression(arrow.span, None, file_path));
                }
                ExportDefaultDeclarationKind::FunctionExpression(function) => {
                    let name = function.id.as_ref().map(|id| id.name.to_string());
                    candidates.extend(default_expression(function.span, name, file_path));
                }
                ExportDefaultDeclarationKind::CallExpression(call) if is_wrapper_call(call) => {
                    match call.arguments.first() {
                        // memo(Button) re-exports a local definition
                        Some(Argument::Identifier(identifier)) => {
                            default_names.push(identifier.name.to_string());
                            default_statements.push((identifier.name.to_string(), export.span));
                        }
                        Some(Argument::FunctionExpression(function)) => {
                            let name = function.id.as_ref().map(|id| id.name.to_string());
                            candidates.extend(default_expression(call.span, name, file_path));
                        }
                        _ => {
                            candidates.extend(default_expression(call.span, None, file_path));
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    for name in default_names {
        if let Some(candidate) = candidates.iter_mut().find(|c| c.name == name) {
            candidate.is_default_export = true;
        }
    }

    for (name, span) in default_statements {
        let early = candidates.iter_mut().find(|c| {
            c.name == name
                && c.replacement == Replacement::FunctionDeclaration
                && span.start < c.span.start
        });
        if let Some(candidate) = early {
            candidate.moved_exports.push(span);
        }
    }

    candidates
}

/// Returns whether the module contains JSX anywhere.
pub fn contains_jsx(program: &Program) -> bool {
    let mut detector = JsxDetector { found: false };
    detector.visit_program(program);
    detector.found
}

struct JsxDetector {
    found: bool,
}

impl<'a> Visit<'a> for JsxDetector {
    fn visit_jsx_element(&mut self, _element: &JSXElement<'a>) {
        self.found = true;
    }

    fn visit_jsx_fragment(&mut self, _fragment: &JSXFragment<'a>) {
        self.found = true;
    }
}

fn function_candidate(function: &Function) -> Option<Candidate> {
    // overload signatures and `declare function` have no body
    function.body.as_ref()?;
    let id = function.id.as_ref()?;

    if !util::is_pascal_case(&id.name) {
        return None;
    }

    Some(Candidate {
        name: id.name.to_string(),
        is_default_export: false,
        span: function.span,
        replacement: Replacement::FunctionDeclaration,
        moved_exports: Vec::new(),
    })
}

fn variable_candidates(declaration: &VariableDeclaration) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for declarator in &declaration.declarations {
        let BindingPatternKind::BindingIdentifier(identifier) = &declarator.id.kind else {
            continue;
        };
        let Some(init) = &declarator.init else {
            continue;
        };

        if !util::is_pascal_case(&identifier.name) {
            continue;
        }

        if !is_component_initializer(init) {
            Logger::debug(
                &format!("Skipping {}: initializer is not a component", identifier.name),
                3,
            );
            continue;
        }

        candidates.push(Candidate {
            name: identifier.name.to_string(),
            is_default_export: false,
            span: init.span(),
            replacement: Replacement::Initializer,
            moved_exports: Vec::new(),
        });
    }

    candidates
}

fn default_expression(span: Span, name: Option<String>, file_path: &str) -> Option<Candidate> {
    let name = name.or_else(|| name_from_file(file_path))?;

    if !util::is_pascal_case(&name) {
        return None;
    }

    Some(Candidate {
        name,
        is_default_export: true,
        span,
        replacement: Replacement::DefaultExpression,
        moved_exports: Vec::new(),
    })
}

/// `src/Button.tsx` names an anonymous default export `Button`.
fn name_from_file(file_path: &str) -> Option<String> {
    let posix = util::to_posix(file_path);
    let file_name = util::split_file_name(util::strip_query(&posix)).1;
    let stem = util::split_extension(file_name).0;

    let is_identifier = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    is_identifier.then(|| stem.to_string())
}

fn is_component_initializer(init: &Expression) -> bool {
    match init {
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => true,
        Expression::CallExpression(call) => is_wrapper_call(call),
        Expression::ParenthesizedExpression(inner) => is_component_initializer(&inner.expression),
        Expression::TSAsExpression(inner) => is_component_initializer(&inner.expression),
        Expression::TSSatisfiesExpression(inner) => is_component_initializer(&inner.expression),
        _ => false,
    }
}

/// `memo(...)`, `React.memo(...)`, `forwardRef(...)`, `React.forwardRef(...)`.
fn is_wrapper_call(call: &CallExpression) -> bool {
    let callee = match &call.callee {
        Expression::Identifier(identifier) => identifier.name.as_str(),
        Expression::StaticMemberExpression(member) => member.property.name.as_str(),
        _ => return false,
    };

    WRAPPER_CALLEES.contains(&callee)
}
