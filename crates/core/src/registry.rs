use std::{collections::BTreeMap, fs, path::Path};

use ignore::{overrides::OverrideBuilder, Walk, WalkBuilder};
use oxc_allocator::Allocator;
use serde::{Deserialize, Serialize};
use storyline_logger::Logger;

use crate::{
    parse::{parse_tsx, source_type_for},
    rewrite::{contains_jsx, find_components},
    util,
};

/// Component name to the file that defines it.
///
/// When two files define the same name, the first one registered wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRegistry(BTreeMap<String, String>);

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `name` was already registered.
    pub fn insert(&mut self, name: &str, file_path: &str) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), util::to_posix(file_path));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<N: AsRef<str>, P: AsRef<str>> FromIterator<(N, P)> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, path) in iter {
            registry.insert(name.as_ref(), path.as_ref());
        }
        registry
    }
}

/// Walks `root` and registers every component the rewriter would instrument.
///
/// `.gitignore` is respected; `include` and `exclude` are glob overrides.
/// Existing fixture files are skipped.
pub fn scan_project(root: &Path, include: &[String], exclude: &[String]) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    Logger::loading(&format!("Scanning {} for components", root.display()));

    for entry in build_walker(root, include, exclude) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                Logger::debug(&format!("Skipping entry: {}", err), 2);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || is_fixture(path) {
            continue;
        }

        scan_file(path, &mut registry);
    }

    Logger::done_loading();
    Logger::debug(&format!("Found {} components", registry.len()), 1);

    registry
}

/// Builds a walker with correct overrides and patterns.
fn build_walker(root: &Path, include: &[String], exclude: &[String]) -> Walk {
    let exclude_patterns: Vec<String> = exclude
        .iter()
        .map(|pattern| format!("!{}", pattern))
        .collect();

    let mut override_builder = OverrideBuilder::new(root);
    for pattern in include.iter().chain(exclude_patterns.iter()) {
        if let Err(err) = override_builder.add(pattern) {
            Logger::warn(&format!("Ignoring invalid pattern {}: {}", pattern, err));
        }
    }

    Logger::debug(&format!("Walking using include patterns: {:?}", include), 1);
    Logger::debug(&format!("Walking using exclude patterns: {:?}", exclude), 1);

    let mut walker = WalkBuilder::new(root);
    walker
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b));

    match override_builder.build() {
        Ok(overrides) => {
            walker.overrides(overrides);
        }
        Err(err) => Logger::warn(&format!("Failed to build file patterns: {}", err)),
    }

    walker.build()
}

fn is_fixture(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.contains(".stories."))
}

/// Parses a file and registers the components found in it.
fn scan_file(path: &Path, registry: &mut ComponentRegistry) {
    let file_path = util::to_posix(&path.to_string_lossy());
    let Some(source_type) = source_type_for(&file_path) else {
        return;
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            Logger::error(&format!("Failed to read file {}: {}", file_path, e));
            return;
        }
    };

    if !content.contains('<') {
        return;
    }

    let allocator = Allocator::default();
    let parsed = match parse_tsx(&allocator, &file_path, &content, source_type) {
        Ok(parsed) => parsed,
        Err(e) => {
            Logger::warn(&format!("Failed to parse file {}: {}", file_path, e));
            return;
        }
    };

    if !contains_jsx(&parsed.program) {
        return;
    }

    for candidate in find_components(&parsed.program, &file_path) {
        if registry.insert(&candidate.name, &file_path) {
            Logger::debug(&format!("Registered {} from {}", candidate.name, file_path), 3);
        } else {
            Logger::debug(
                &format!("{} is already registered, skipping {}", candidate.name, file_path),
                2,
            );
        }
    }
}
