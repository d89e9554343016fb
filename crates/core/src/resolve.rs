use crate::util::{split_extension, split_file_name, strip_query, to_posix};

/// Fixture extensions, in the order an existing fixture is looked up.
pub const STORY_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

const STORY_INFIX: &str = "stories";

/// Relative module specifier from a directory to a file, without the file's extension.
///
/// # Example
///
/// ```
/// use storyline_core::resolve::relative_import_path;
///
/// assert_eq!(relative_import_path("/p/src", "/p/src/Button.tsx"), "./Button");
/// assert_eq!(relative_import_path("/p/src/stories", "/p/lib/Icon.tsx"), "../../lib/Icon");
/// ```
pub fn relative_import_path(from_dir: &str, to_file: &str) -> String {
    let from = segments(from_dir);
    let mut to = segments(to_file);

    if let Some(last) = to.last_mut() {
        *last = split_extension(last).0.to_string();
    }

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(to[common..].iter().cloned());

    if parts.is_empty() {
        return ".".to_string();
    }

    let path = parts.join("/");
    if parts[0] == ".." {
        path
    } else {
        format!("./{}", path)
    }
}

/// Normalized path segments; `.` is dropped and `..` pops its parent.
fn segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();

    for segment in to_posix(path).split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().map_or(true, |last| last == "..") {
                    segments.push("..".to_string());
                } else {
                    segments.pop();
                }
            }
            segment => segments.push(segment.to_string()),
        }
    }

    segments
}

/// The path a new fixture for `component_file` is written to:
/// `<dir>[/<stories_dir>]/<stem>.stories.<ext>`, keeping the component's extension.
pub fn fixture_path(component_file: &str, stories_dir: Option<&str>) -> String {
    let (dir, stem, extension) = fixture_parts(component_file, stories_dir);
    join(&dir, &format!("{}.{}.{}", stem, STORY_INFIX, extension.as_deref().unwrap_or("tsx")))
}

/// Every path an existing fixture for `component_file` may live at, in lookup order.
pub fn candidate_fixture_paths(component_file: &str, stories_dir: Option<&str>) -> Vec<String> {
    let (dir, stem, _) = fixture_parts(component_file, stories_dir);

    STORY_EXTENSIONS
        .iter()
        .map(|extension| join(&dir, &format!("{}.{}.{}", stem, STORY_INFIX, extension)))
        .collect()
}

/// Whether a fixture at `path` may carry type syntax.
pub fn is_typed_fixture(path: &str) -> bool {
    let (_, file_name) = split_file_name(path);
    matches!(split_extension(file_name).1, Some("tsx" | "ts" | "mts" | "cts"))
}

fn fixture_parts(component_file: &str, stories_dir: Option<&str>) -> (String, String, Option<String>) {
    let file = to_posix(strip_query(component_file));
    let (dir, file_name) = split_file_name(&file);
    let (stem, extension) = split_extension(file_name);

    let dir = match stories_dir.map(|d| d.trim_matches('/')).filter(|d| !d.is_empty()) {
        Some(stories_dir) => join(dir, stories_dir),
        None => dir.to_string(),
    };

    (dir, stem.to_string(), extension.map(str::to_string))
}

fn join(dir: &str, name: &str) -> String {
    match dir {
        "." => name.to_string(),
        "/" => format!("/{}", name),
        dir => format!("{}/{}", dir, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_import_path() {
        assert_eq!(relative_import_path("/p/src", "/p/src/Button.tsx"), "./Button");
        assert_eq!(relative_import_path("/p/src/__stories__", "/p/src/Button.tsx"), "../Button");
        assert_eq!(relative_import_path("/p/src/a", "/p/lib/Icon.tsx"), "../../lib/Icon");
        assert_eq!(relative_import_path("/p/src", "/p/src/ui/Card.jsx"), "./ui/Card");
        assert_eq!(relative_import_path("/p/src/", "/p/src/./Button.tsx"), "./Button");
    }

    #[test]
    fn test_relative_import_path_same_location() {
        assert_eq!(relative_import_path("/p/src", "/p/src"), ".");
    }

    #[test]
    fn test_relative_import_path_windows_separators() {
        assert_eq!(
            relative_import_path("C:\\p\\src", "C:\\p\\src\\components\\Button.tsx"),
            "./components/Button"
        );
    }

    #[test]
    fn test_relative_import_path_keeps_inner_dots() {
        assert_eq!(
            relative_import_path("/p/src", "/p/src/Button.styles.ts"),
            "./Button.styles"
        );
    }

    #[test]
    fn test_fixture_path() {
        assert_eq!(fixture_path("/p/src/Button.tsx", None), "/p/src/Button.stories.tsx");
        assert_eq!(fixture_path("/p/src/Button.jsx?v=3", None), "/p/src/Button.stories.jsx");
        assert_eq!(
            fixture_path("/p/src/Button.tsx", Some("__stories__/")),
            "/p/src/__stories__/Button.stories.tsx"
        );
        assert_eq!(fixture_path("Button.tsx", Some("")), "Button.stories.tsx");
    }

    #[test]
    fn test_candidate_fixture_paths() {
        assert_eq!(
            candidate_fixture_paths("/p/src/Button.jsx", None),
            vec![
                "/p/src/Button.stories.tsx",
                "/p/src/Button.stories.ts",
                "/p/src/Button.stories.jsx",
                "/p/src/Button.stories.js",
            ]
        );
    }

    #[test]
    fn test_is_typed_fixture() {
        assert!(is_typed_fixture("/p/src/Button.stories.tsx"));
        assert!(is_typed_fixture("/p/src/Button.stories.ts"));
        assert!(!is_typed_fixture("/p/src/Button.stories.jsx"));
        assert!(!is_typed_fixture("/p/src/Button.stories.js"));
    }
}
