/// Components are recognized by the casing of their first character only.
pub fn is_pascal_case(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_uppercase())
}

/// Converts a path to forward slashes so generated sources look the same on every platform.
pub fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Strips a bundler query (`?v=1234`, `?import`) from a module id.
pub fn strip_query(id: &str) -> &str {
    match id.find('?') {
        Some(index) => &id[..index],
        None => id,
    }
}

/// Splits a posix path into `(directory, file name)`.
///
/// A path without any separator has `.` as its directory.
pub fn split_file_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(index) => (&path[..index], &path[index + 1..]),
        None => (".", path),
    }
}

/// Splits a file name into `(stem, extension)`; the extension has no leading dot.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => (&file_name[..index], Some(&file_name[index + 1..])),
        _ => (file_name, None),
    }
}

/// Returns `path` relative to `root` when it lives below it, otherwise `path` unchanged.
pub fn relative_to_root(root: &str, path: &str) -> String {
    let root = to_posix(root);
    let root = root.trim_end_matches('/');
    let path = to_posix(path);

    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => path,
    }
}

#[cfg(test)]
pub mod test_utils {
    use std::fs;

    use tempfile::TempDir;

    pub fn create_mock_project(files: &Vec<(&str, &str)>) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for (path, content) in files {
            // create directories before creating files
            let file_path = root.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(file_path, content).unwrap();
        }

        temp_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pascal_case() {
        assert_eq!(is_pascal_case("PascalCase"), true);
        assert_eq!(is_pascal_case("camelCase"), false);
        assert_eq!(is_pascal_case("kebab-case"), false);
        assert_eq!(is_pascal_case("SCREAMING_SNAKE_CASE"), true);
        assert_eq!(is_pascal_case(""), false);
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/p/src/Button.tsx?v=123"), "/p/src/Button.tsx");
        assert_eq!(strip_query("/p/src/Button.tsx"), "/p/src/Button.tsx");
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("/p/src/Button.tsx"), ("/p/src", "Button.tsx"));
        assert_eq!(split_file_name("/Button.tsx"), ("/", "Button.tsx"));
        assert_eq!(split_file_name("Button.tsx"), (".", "Button.tsx"));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("Button.tsx"), ("Button", Some("tsx")));
        assert_eq!(split_extension("Button.stories.tsx"), ("Button.stories", Some("tsx")));
        assert_eq!(split_extension(".eslintrc"), (".eslintrc", None));
        assert_eq!(split_extension("Makefile"), ("Makefile", None));
    }

    #[test]
    fn test_relative_to_root() {
        assert_eq!(relative_to_root("/p", "/p/src/Button.tsx"), "src/Button.tsx");
        assert_eq!(relative_to_root("/p/", "/p/src/Button.tsx"), "src/Button.tsx");
        assert_eq!(relative_to_root("/p", "/pkg/Button.tsx"), "/pkg/Button.tsx");
        assert_eq!(relative_to_root("C:\\p", "C:\\p\\src\\A.tsx"), "src/A.tsx");
    }
}
