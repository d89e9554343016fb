pub mod component;
pub mod config;
pub mod hash;
mod parse;
pub mod registry;
pub mod resolve;
pub mod rewrite;
pub mod serialize;
pub mod story;
mod util;

pub use component::ComponentMeta;
pub use config::{Config, ConfigValues, CONFIG_FILE_NAME};
pub use registry::{scan_project, ComponentRegistry};
pub use resolve::{candidate_fixture_paths, fixture_path, relative_import_path};
pub use rewrite::{rewrite, RewriteOptions, RewriteOutcome, UnchangedReason};
pub use story::{generate, ExistingFixture, FixtureOptions, GeneratedFixture};
