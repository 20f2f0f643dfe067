//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deep Purple - terminal client for the emotion-analysis service
///
/// Submit text or files for emotion analysis, manage custom emotion
/// models, and render dashboards over the stored analysis history.
///
/// Examples:
///   deep-purple analyze --model default --text "What a day!"
///   deep-purple analyze --model default --file ./letter.txt
///   deep-purple dashboard --output dashboard.md
///   deep-purple dashboard --input export.json --format json
///   deep-purple categories list --model-id 3
///   deep-purple --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the analysis service
    ///
    /// Overrides the `[api] base_url` setting from .deep-purple.toml.
    #[arg(long, global = true, value_name = "URL", env = "DEEP_PURPLE_API_URL")]
    pub api_url: Option<String>,

    /// Access token sent as a bearer token
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env = "DEEP_PURPLE_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .deep-purple.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .deep-purple.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit text or upload a file for emotion analysis
    Analyze {
        /// Custom model to analyse with
        #[arg(short, long, default_value = "")]
        model: String,

        /// Text to analyse
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// File to upload and analyse
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Browse and manage stored communications
    #[command(subcommand)]
    Communications(CommunicationsCommand),

    /// Render the emotion dashboard over all communications
    Dashboard {
        /// Read records from a JSON export instead of the service
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format (markdown, json)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ReportFormat>,
    },

    /// Manage custom emotion models
    #[command(subcommand)]
    Models(ModelsCommand),

    /// Manage emotion categories of a model
    #[command(subcommand)]
    Categories(CategoriesCommand),

    /// Manage word-emotion associations of a model
    #[command(subcommand)]
    Associations(AssociationsCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommunicationsCommand {
    /// List every stored communication
    List,
    /// Re-submit a communication with new content
    Update {
        id: String,
        #[arg(short, long, default_value = "")]
        model: String,
        #[arg(short, long)]
        text: String,
    },
    /// Delete a communication by id
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ModelsCommand {
    /// List custom models
    List,
    /// Create a custom model
    Create { name: String },
    /// Delete a custom model by id
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesCommand {
    /// List the categories of one model
    List {
        #[arg(long, value_name = "ID")]
        model_id: String,
    },
    /// List categories across all models
    All,
    /// Add a category to a model
    Create {
        #[arg(long, value_name = "ID")]
        model_id: String,
        #[arg(long)]
        name: String,
    },
    /// Rename a category
    Rename {
        id: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a category by id
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AssociationsCommand {
    /// List the word associations of one model
    List {
        #[arg(long, value_name = "ID")]
        model_id: String,
    },
    /// Associate a word with an emotion category
    Create {
        #[arg(long)]
        word: String,
        #[arg(long, value_name = "ID")]
        category_id: String,
    },
    /// Delete an association by id
    Delete { id: String },
}

/// Output format for the dashboard report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("No command given. Run with --help to see the commands.".to_string());
        }

        // Validate service URL format
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate dashboard input if provided
        if let Some(Command::Dashboard {
            input: Some(ref input),
            ..
        }) = self.command
        {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("deep-purple").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_analyze_text() {
        let args = parse(&["analyze", "--model", "default", "--text", "hello"]);
        match args.command {
            Some(Command::Analyze { model, text, file }) => {
                assert_eq!(model, "default");
                assert_eq!(text.as_deref(), Some("hello"));
                assert!(file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_analyze_text_conflicts_with_file() {
        let result = Args::try_parse_from([
            "deep-purple",
            "analyze",
            "--text",
            "hi",
            "--file",
            "x.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_nested_subcommands() {
        let args = parse(&["categories", "rename", "11", "--name", "Calm"]);
        assert!(matches!(
            args.command,
            Some(Command::Categories(CategoriesCommand::Rename { ref id, ref name }))
                if id == "11" && name == "Calm"
        ));

        let args = parse(&["dashboard", "--format", "json"]);
        assert!(matches!(
            args.command,
            Some(Command::Dashboard {
                format: Some(ReportFormat::Json),
                ..
            })
        ));
    }

    #[test]
    fn test_validation_requires_command() {
        let args = parse(&[]);
        assert!(args.validate().is_err());

        let args = parse(&["--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = parse(&["models", "list"]);
        args.api_url = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = parse(&["models", "list"]);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let args = parse(&["dashboard", "--input", "/no/such/export.json"]);
        assert!(args.validate().is_err());
    }
}
