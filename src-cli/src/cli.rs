//! Command-line arguments.
//!
//! Purely declarative; parsing has no side effects.

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Allergy Detector: scan labels, recipes and documents for your allergens.
///
/// Use `allergen <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "allergen", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: the platform config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the log filter (e.g. `debug`, `warn,allergen_scan=trace`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the allergen catalog.
    Allergens,

    /// Scan content for the selected allergens.
    Scan(ScanArgs),

    /// Maintain the allergen catalog.
    Admin(AdminArgs),
}

/// Scan text, a photo or a document.
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text", "photo", "document"])
))]
pub struct ScanArgs {
    /// Allergen to scan for, by id or name. Repeat for several.
    #[arg(short, long = "allergen", value_name = "ID_OR_NAME", required = true)]
    pub allergens: Vec<String>,

    /// Ingredient, prescription or recipe text.
    #[arg(long)]
    pub text: Option<String>,

    /// Photo of a label (.jpg, .jpeg, .png).
    #[arg(long, value_name = "PATH")]
    pub photo: Option<PathBuf>,

    /// Document (.pdf, .doc, .docx).
    #[arg(long, value_name = "PATH")]
    pub document: Option<PathBuf>,
}

/// Maintain the allergen catalog.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub action: AdminAction,
}

/// Admin operations.
#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Check whether the backend is reachable.
    Status,

    /// Check the backend and list all allergens.
    Sync,

    /// Add an allergen.
    Add {
        /// Display name.
        name: String,

        /// Comma-separated keywords, e.g. "peanut, groundnut".
        #[arg(short, long)]
        keywords: String,

        /// Severity (high, medium, low).
        #[arg(short, long, default_value = "medium")]
        severity: String,
    },

    /// Edit an allergen; omitted fields keep their current value.
    Edit {
        /// Allergen id.
        id: String,

        /// New display name.
        #[arg(long)]
        name: Option<String>,

        /// New comma-separated keywords.
        #[arg(short, long)]
        keywords: Option<String>,

        /// New severity (high, medium, low).
        #[arg(short, long)]
        severity: Option<String>,
    },

    /// Delete an allergen.
    Delete {
        /// Allergen id.
        id: String,
    },
}
