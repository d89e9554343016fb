use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use storyline_logger::Logger;

use storyline_core::{
    candidate_fixture_paths, generate, rewrite, scan_project, serialize::SerializedProps,
    ComponentMeta, ComponentRegistry, Config, ConfigValues, ExistingFixture, FixtureOptions,
    RewriteOptions, RewriteOutcome, CONFIG_FILE_NAME,
};

const DEFAULT_EXCLUDE: &str =
    "**/node_modules/**,**/dist/**,**/build/**,**/*.stories.*,**/*.test.*";
const DEFAULT_INCLUDE: &str = "**/*.tsx,**/*.jsx";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-l = level 1, -ll = level 2, etc.)
    #[arg(short = 'l', action = clap::ArgAction::Count, global = true)]
    verbosity: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Instrument the components of a module with the tracking adapter
    Transform {
        /// Module to instrument
        file: PathBuf,

        /// Project root, used for relative paths and the config file
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Write the instrumented module here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scan a project and output its component registry
    Registry {
        /// Entry point directory
        #[arg(short, long, default_value = "./")]
        entry: PathBuf,

        /// Output file name
        #[arg(long, default_value = "storyline-registry")]
        file_name: String,

        /// output format
        #[arg(short, long, default_value = "file")]
        format: Format,

        /// Exclude directories/files with glob patterns (comma separated)
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_EXCLUDE)]
        exclude: Vec<String>,

        /// Include directories/files with glob patterns (comma separated)
        #[arg(long, value_delimiter = ',', default_value = DEFAULT_INCLUDE)]
        include: Vec<String>,
    },
    /// Write a story from a captured props payload
    Story {
        /// JSON file with `meta`, `props` and optionally `registry` and `storyName`
        #[arg(short, long)]
        payload: PathBuf,

        /// Project root
        #[arg(short, long, default_value = "./")]
        entry: PathBuf,

        /// Build the registry from the project when the payload has none
        #[arg(long)]
        scan: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, Debug)]
enum Format {
    File,
    Console,
}

/// What the browser sends when a story is requested.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StoryPayload {
    meta: ComponentMeta,
    #[serde(default)]
    props: SerializedProps,
    registry: Option<ComponentRegistry>,
    story_name: Option<String>,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    Logger::set_level(args.verbosity);

    match args.command {
        Command::Transform { file, root, output } => transform(&file, root, output),
        Command::Registry {
            entry,
            file_name,
            format,
            exclude,
            include,
        } => registry(&entry, &file_name, format, exclude, include),
        Command::Story {
            payload,
            entry,
            scan,
        } => story(&payload, &entry, scan),
    }
}

fn transform(file: &Path, root: Option<PathBuf>, output: Option<PathBuf>) -> io::Result<()> {
    let absolute_file = fs::canonicalize(file)?;
    let root = match root {
        Some(root) => fs::canonicalize(root)?,
        None => fs::canonicalize(std::env::current_dir()?)?,
    };
    let config = Config::read(root.join(CONFIG_FILE_NAME));
    let options = RewriteOptions::from_config(
        config.as_ref(),
        Some(root.to_string_lossy().to_string()),
    );

    let source = fs::read_to_string(&absolute_file)?;
    let identity = absolute_file.to_string_lossy().to_string();

    match rewrite(&source, &identity, &options) {
        RewriteOutcome::Rewritten { code, components } => {
            for component in &components {
                Logger::debug(
                    &format!(
                        "Instrumented {} ({})",
                        component.component_name, component.source_id
                    ),
                    1,
                );
            }

            match output {
                Some(output) => {
                    fs::write(&output, code)?;
                    Logger::info(&format!(
                        "Instrumented {} components, written to: {:?}",
                        components.len(),
                        output
                    ));
                }
                None => print!("{}", code),
            }
        }
        RewriteOutcome::Unchanged(reason) => {
            Logger::warn(&format!("{} left unchanged: {}", identity, reason));
        }
    }

    Ok(())
}

fn registry(
    entry: &Path,
    file_name: &str,
    format: Format,
    exclude: Vec<String>,
    include: Vec<String>,
) -> io::Result<()> {
    let absolute_entry = fs::canonicalize(entry)?;
    let config = Config::read(absolute_entry.join(CONFIG_FILE_NAME));
    let (include, exclude) = merge_patterns(config.as_ref(), include, exclude);

    let registry = scan_project(&absolute_entry, &include, &exclude);

    // output to json file in current working directory
    if format == Format::File {
        let current_dir = std::env::current_dir()?;
        let output_path_with_extension = current_dir.join(format!("{}.json", file_name));

        Logger::info(&format!(
            "Writing registry to: {:?}",
            output_path_with_extension
        ));

        let file = File::create(output_path_with_extension)?;
        serde_json::to_writer_pretty(file, &registry)?;
    }

    // output to console
    if format == Format::Console {
        Logger::info("Printing registry to console:");
        println!("{}", serde_json::to_string_pretty(&registry)?);
    }

    Ok(())
}

fn story(payload: &Path, entry: &Path, scan: bool) -> io::Result<()> {
    let absolute_entry = fs::canonicalize(entry)?;
    let config = Config::read(absolute_entry.join(CONFIG_FILE_NAME));
    let options = FixtureOptions::from_config(config.as_ref());

    let payload = fs::read_to_string(payload)?;
    let mut payload: StoryPayload = serde_json::from_str(&payload).map_err(|err| {
        Logger::error("Failed to read story payload");
        io::Error::new(io::ErrorKind::InvalidData, err)
    })?;

    if Path::new(&payload.meta.file_path).is_relative() {
        payload.meta.file_path = absolute_entry
            .join(&payload.meta.file_path)
            .to_string_lossy()
            .to_string();
    }

    let registry = match payload.registry.take() {
        Some(registry) => Some(registry),
        None if scan => {
            let (include, exclude) = merge_patterns(
                config.as_ref(),
                split_patterns(DEFAULT_INCLUDE),
                split_patterns(DEFAULT_EXCLUDE),
            );
            Some(scan_project(&absolute_entry, &include, &exclude))
        }
        None => None,
    };

    let existing = find_existing_fixture(&payload.meta, &options)?;
    if let Some(existing) = &existing {
        Logger::debug(&format!("Appending to {}", existing.path), 1);
    }

    let fixture = generate(
        &payload.meta,
        &payload.props,
        registry.as_ref(),
        payload.story_name.as_deref(),
        existing.as_ref(),
        &options,
    );

    // fixture writes happen one at a time, so no update to the same file is lost
    let target = PathBuf::from(&fixture.file_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::write(&target, &fixture.content) {
        Ok(_) => {
            Logger::info(&format!(
                "Story {} written to: {}",
                fixture.fixture_name, fixture.file_path
            ));
            Ok(())
        }
        Err(e) => {
            Logger::error(&format!("Failed to write story: {}", e));
            Err(e)
        }
    }
}

/// Reads the first fixture that already exists for the component.
fn find_existing_fixture(
    meta: &ComponentMeta,
    options: &FixtureOptions,
) -> io::Result<Option<ExistingFixture>> {
    for path in candidate_fixture_paths(&meta.file_path, options.stories_dir.as_deref()) {
        if Path::new(&path).is_file() {
            let text = fs::read_to_string(&path)?;
            return Ok(Some(ExistingFixture { path, text }));
        }
    }

    Ok(None)
}

/// Merges config values with CLI values
fn merge_patterns(
    config: Option<&ConfigValues>,
    mut include: Vec<String>,
    mut exclude: Vec<String>,
) -> (Vec<String>, Vec<String>) {
    if let Some(config) = config {
        if let Some(config_include) = &config.include {
            include.extend(config_include.clone());
        }
        if let Some(config_exclude) = &config.exclude {
            exclude.extend(config_exclude.clone());
        }
    }

    (include, exclude)
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns.split(',').map(str::to_string).collect()
}
