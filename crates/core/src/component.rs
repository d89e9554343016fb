use serde::{Deserialize, Serialize};

use crate::{hash::source_id, util};

/// Identifies one static component definition.
///
/// Created once per definition when the source file is rewritten; every live
/// instance of the component shares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub component_name: String,
    pub file_path: String,
    #[serde(default)]
    pub relative_file_path: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub is_default_export: bool,
}

impl ComponentMeta {
    pub fn new(
        component_name: &str,
        file_path: &str,
        project_root: Option<&str>,
        is_default_export: bool,
    ) -> Self {
        let file_path = util::to_posix(file_path);
        let relative_file_path = match project_root {
            Some(root) => util::relative_to_root(root, &file_path),
            None => file_path.clone(),
        };

        Self {
            component_name: component_name.to_string(),
            source_id: source_id(&file_path, component_name),
            file_path,
            relative_file_path,
            is_default_export,
        }
    }

    /// Renders the meta as a JS object literal, as baked into instrumented source.
    pub fn to_object_literal(&self) -> String {
        format!(
            "{{ componentName: {}, filePath: {}, relativeFilePath: {}, sourceId: {}, isDefaultExport: {} }}",
            quote(&self.component_name),
            quote(&self.file_path),
            quote(&self.relative_file_path),
            quote(&self.source_id),
            self.is_default_export
        )
    }
}

/// JSON string quoting doubles as JS string literal quoting.
pub(crate) fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
