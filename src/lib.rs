//! Pagetag: named-entity tagging for PAGE XML transcriptions.
//!
//! Pagetag runs an entity tagger over every text line of a set of PAGE XML
//! documents and writes the entities back into each line's `custom`
//! attribute as Transkribus tags (`persoon {offset:0;length:12;}`), so the
//! annotated files can be uploaded to Transkribus again.
//!
//! # Modules
//!
//! - [`tags`]: Label table and the custom-tag grammar
//! - [`page`]: PAGE XML loading, namespace normalization and serialization
//! - [`entity`]: Entity sources (child-process model, gazetteer, HTTP)
//! - [`annotate`]: Merging entity spans into a line's custom attribute
//! - [`process`]: Per-document pipeline
//! - [`batch`]: Running many documents and reporting on them
//! - [`discovery`]: Finding collections on disk and selecting them
//! - [`error`]: Error types and exit codes

pub mod annotate;
pub mod batch;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod page;
pub mod process;
pub mod tags;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use annotate::{AnnotateOptions, MergePolicy};
use batch::BatchEvent;
use discovery::{Layout, Selection};
use entity::command::CommandTagger;
use entity::gazetteer::GazetteerTagger;
use entity::EntitySource;
use process::ProcessOptions;
use tags::LabelTable;

pub use error::{ErrorKind, PagetagError};

/// The pagetag CLI application.
#[derive(Parser)]
#[command(name = "pagetag")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Tag entities in PAGE XML documents, rewriting them in place.
    Tag(TagArgs),
    /// List the collections found under an input directory.
    List(ListArgs),
    /// Show the label to tag-name table.
    Labels(LabelsArgs),
}

/// Arguments for the tag subcommand.
#[derive(clap::Args)]
#[command(group(clap::ArgGroup::new("tagger").required(true).multiple(false)))]
struct TagArgs {
    /// Directory of collections (`<name>/page/*.xml`) or of PAGE files.
    input: PathBuf,

    /// Tagger program and arguments, speaking JSON lines on stdin/stdout.
    #[arg(long, env = "PAGETAG_TAGGER_CMD", value_name = "COMMAND", group = "tagger")]
    tagger_cmd: Option<String>,

    /// Model file passed to the tagger command as its last argument.
    #[arg(long, env = "PAGETAG_MODEL", value_name = "PATH")]
    model: Option<PathBuf>,

    /// Tag with a `surface,label` CSV lexicon instead of a model.
    #[arg(long, value_name = "CSV", group = "tagger")]
    gazetteer: Option<PathBuf>,

    /// Tag by POSTing each line to a JSON tagging endpoint.
    #[cfg(feature = "http")]
    #[arg(long, env = "PAGETAG_TAGGER_URL", value_name = "URL", group = "tagger")]
    tagger_url: Option<String>,

    /// Tag every span as this label (e.g. PER), whatever the tagger reports.
    #[arg(long, value_name = "LABEL")]
    entity: Option<String>,

    /// JSON object of extra or replacement `"LABEL": "tag_name"` entries.
    #[arg(long, value_name = "JSON")]
    label_map: Option<PathBuf>,

    /// How documents are laid out under the input directory.
    #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
    layout: LayoutArg,

    /// Only process these collections (numbers as shown by `list`).
    #[arg(long, value_name = "N", num_args = 1.., value_delimiter = ',', conflicts_with = "exclude")]
    include: Vec<usize>,

    /// Process all collections except these.
    #[arg(long, value_name = "N", num_args = 1.., value_delimiter = ',')]
    exclude: Vec<usize>,

    /// What to do with tags that are already on a line.
    #[arg(long, value_enum, default_value_t = MergeArg::Append)]
    merge: MergeArg,

    /// Tag and report, but do not write any file.
    #[arg(long)]
    dry_run: bool,

    /// Output format for the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the list subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Directory to scan.
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
    layout: LayoutArg,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the labels subcommand.
#[derive(clap::Args)]
struct LabelsArgs {
    /// JSON object of extra or replacement `"LABEL": "tag_name"` entries.
    #[arg(long, value_name = "JSON")]
    label_map: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Document layout, as accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Auto,
    Collections,
    Flat,
}

impl From<LayoutArg> for Layout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Auto => Layout::Auto,
            LayoutArg::Collections => Layout::Collections,
            LayoutArg::Flat => Layout::Flat,
        }
    }
}

/// Merge policy, as accepted on the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MergeArg {
    /// Always append (re-running duplicates tags).
    Append,
    /// Leave out tags the line already has.
    SkipExisting,
}

impl From<MergeArg> for MergePolicy {
    fn from(value: MergeArg) -> Self {
        match value {
            MergeArg::Append => MergePolicy::Append,
            MergeArg::SkipExisting => MergePolicy::SkipExisting,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the pagetag CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PagetagError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tag(args)) => run_tag(args),
        Some(Commands::List(args)) => run_list(args),
        Some(Commands::Labels(args)) => run_labels(args),
        None => {
            println!("pagetag {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Named-entity tagging for PAGE XML transcriptions.");
            println!();
            println!("Run 'pagetag --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the tag subcommand.
fn run_tag(args: TagArgs) -> Result<(), PagetagError> {
    let table = load_label_table(args.label_map.as_deref())?;
    let forced_label = args
        .entity
        .as_deref()
        .map(|code| table.resolve(code))
        .transpose()?;

    // Every configuration check happens before the input is scanned.
    let mut source = open_entity_source(&args, &table, forced_label.is_some())?;

    let collections = discovery::discover_collections(&args.input, args.layout.into())?;
    let collections =
        discovery::select_collections(collections, &selection(&args.include, &args.exclude))?;

    let options = ProcessOptions {
        table,
        annotate: AnnotateOptions {
            policy: args.merge.into(),
            forced_label,
        },
        dry_run: args.dry_run,
    };

    let show_progress = args.output == OutputFormat::Text;
    let report = batch::run_batch(&collections, source.as_mut(), &options, |event| {
        if show_progress {
            print_event(event);
        }
    });
    drop(source);

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => {
            println!();
            print!("{}", report);
        }
    }

    if report.has_failures() {
        Err(PagetagError::BatchIncomplete {
            failed: report.failure_count(),
            succeeded: report.success_count(),
        })
    } else {
        Ok(())
    }
}

/// Execute the list subcommand.
fn run_list(args: ListArgs) -> Result<(), PagetagError> {
    let collections = discovery::discover_collections(&args.input, args.layout.into())?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&collections)?),
        OutputFormat::Text => {
            let width = collections
                .iter()
                .map(|c| c.name.chars().count())
                .max()
                .unwrap_or(0)
                .max("Collection".len());
            println!("{:>3}  {:<width$}  Documents", "#", "Collection");
            for (index, collection) in collections.iter().enumerate() {
                println!(
                    "{:>3}  {:<width$}  {}",
                    index + 1,
                    collection.name,
                    collection.documents.len()
                );
            }
        }
    }

    Ok(())
}

/// Execute the labels subcommand.
fn run_labels(args: LabelsArgs) -> Result<(), PagetagError> {
    let table = load_label_table(args.label_map.as_deref())?;

    match args.output {
        OutputFormat::Json => {
            let map: BTreeMap<&str, &str> = table
                .iter()
                .map(|(label, name)| (label.as_str(), name))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Text => {
            for (label, name) in table.iter() {
                println!("{:<6} {}", label.as_str(), name);
            }
        }
    }

    Ok(())
}

fn load_label_table(label_map: Option<&Path>) -> Result<LabelTable, PagetagError> {
    match label_map {
        Some(path) => LabelTable::from_json_path(path),
        None => Ok(LabelTable::transkribus()),
    }
}

fn selection(include: &[usize], exclude: &[usize]) -> Selection {
    if !include.is_empty() {
        Selection::Include(include.to_vec())
    } else if !exclude.is_empty() {
        Selection::Exclude(exclude.to_vec())
    } else {
        Selection::All
    }
}

fn open_entity_source(
    args: &TagArgs,
    table: &LabelTable,
    relabeled: bool,
) -> Result<Box<dyn EntitySource>, PagetagError> {
    if let Some(command_line) = &args.tagger_cmd {
        let tagger = CommandTagger::from_command_line(command_line, args.model.as_deref())?;
        return Ok(Box::new(tagger));
    }

    if let Some(path) = &args.gazetteer {
        let tagger = GazetteerTagger::from_csv_path(path)?;
        if !relabeled {
            for label in tagger.labels() {
                table.resolve(label.as_str())?;
            }
        }
        return Ok(Box::new(tagger));
    }

    #[cfg(feature = "http")]
    if let Some(url) = &args.tagger_url {
        return Ok(Box::new(entity::http::HttpTagger::new(url.as_str())?));
    }

    Err(PagetagError::TaggerUnavailable {
        message: "no tagger configured".to_string(),
    })
}

fn print_event(event: BatchEvent<'_>) {
    match event {
        BatchEvent::CollectionStarted { number, collection } => {
            println!(
                "[{}] {} ({} document(s))",
                number,
                collection.name,
                collection.documents.len()
            );
        }
        BatchEvent::DocumentDone { outcome } if outcome.stats.tags_added > 0 => {
            println!(
                "  ✓ {} {} tags",
                file_name(&outcome.path),
                outcome.stats.tags_added
            );
        }
        BatchEvent::DocumentFailed { failure } => {
            println!("  ✗ {} {}", file_name(&failure.path), failure.message);
        }
        BatchEvent::DocumentDone { .. } => {}
        BatchEvent::CollectionFinished { report } => {
            println!("  {}", report);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn include_takes_precedence_only_when_given() {
        assert_eq!(selection(&[], &[]), Selection::All);
        assert_eq!(selection(&[2], &[]), Selection::Include(vec![2]));
        assert_eq!(selection(&[], &[1, 3]), Selection::Exclude(vec![1, 3]));
    }

    #[test]
    fn tag_requires_exactly_one_tagger() {
        let missing = Cli::try_parse_from(["pagetag", "tag", "in"]);
        assert!(missing.is_err());

        let both = Cli::try_parse_from([
            "pagetag",
            "tag",
            "in",
            "--gazetteer",
            "lex.csv",
            "--tagger-cmd",
            "python tag.py",
        ]);
        assert!(both.is_err());
    }
}
