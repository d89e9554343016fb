use itertools::Itertools;
use miette::NamedSource;
use oxc_allocator::Allocator;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;

use crate::util;

/// Picks the parser flavour for a module id from its extension.
///
/// Returns `None` for files that are not JS/TS modules.
pub fn source_type_for(file_path: &str) -> Option<SourceType> {
    let file_name = util::split_file_name(util::strip_query(file_path)).1;
    let extension = util::split_extension(file_name).1?;

    let base = SourceType::default().with_module(true);
    match extension {
        "tsx" => Some(base.with_typescript(true).with_jsx(true)),
        "ts" | "mts" | "cts" => Some(base.with_typescript(true)),
        "jsx" | "js" | "mjs" | "cjs" => Some(base.with_jsx(true)),
        _ => None,
    }
}

/// parse a js/ts module with oxc
///
/// Any syntax error is rendered with its source snippet and returned as the error value.
pub fn parse_tsx<'a>(
    allocator: &'a Allocator,
    file_path: &str,
    file_content: &'a str,
    source_type: SourceType,
) -> Result<ParserReturn<'a>, String> {
    let parser_ret = Parser::new(allocator, file_content, source_type).parse();

    if parser_ret.panicked || !parser_ret.errors.is_empty() {
        let named_source = NamedSource::new(file_path.to_string(), file_content.to_string());
        let error_message: String = parser_ret
            .errors
            .into_iter()
            .map(|error| format!("{:?}", error.with_source_code(named_source.clone())))
            .join("\n");

        return Err(if error_message.is_empty() {
            format!("Parser gave up on {}", file_path)
        } else {
            error_message
        });
    }

    Ok(parser_ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsx() {
        let allocator = Allocator::default();
        let file_content = "const App = () => <div>Hello, world!</div>;";
        let source_type = source_type_for("test.tsx").unwrap();
        let result = parse_tsx(&allocator, "test.tsx", file_content, source_type);

        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_tsx_reports_errors() {
        let allocator = Allocator::default();
        let file_content = "const App = () => <div>Hello, world!</span>;";
        let source_type = source_type_for("test.tsx").unwrap();
        let result = parse_tsx(&allocator, "test.tsx", file_content, source_type);

        assert!(result.is_err());
    }

    #[test]
    fn test_source_type_for() {
        assert!(source_type_for("/p/Button.tsx").unwrap().is_typescript());
        assert!(source_type_for("/p/Button.tsx?v=12").unwrap().is_jsx());
        assert!(!source_type_for("/p/util.ts").unwrap().is_jsx());
        assert!(source_type_for("/p/Button.jsx").unwrap().is_jsx());
        assert!(source_type_for("/p/styles.css").is_none());
        assert!(source_type_for("/p/Makefile").is_none());
    }
}
