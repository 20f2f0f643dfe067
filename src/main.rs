//! Deep Purple - terminal client for the emotion-analysis service
//!
//! Submits text and files for emotion analysis, manages custom emotion
//! models, and renders dashboards over the stored analysis history.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, validation, service error, etc.)

mod analysis;
mod api;
mod cli;
mod config;
mod models;
mod report;

use anyhow::{Context, Result};
use api::{
    validate_category_name, validate_model_name, validate_word, ApiClient, Submission,
    ValidatedSubmission,
};
use cli::{
    Args, AssociationsCommand, CategoriesCommand, Command, CommunicationsCommand, ModelsCommand,
    ReportFormat,
};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{CommunicationRecord, EmotionCategory, NewCommunication};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config(Path::new(CONFIG_FILE_NAME));
    }

    // Load configuration; the log level depends on it
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Deep Purple v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .deep-purple.toml.
fn handle_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            path.display()
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Created {} with default settings.", path.display());
    println!("   Edit it to set the service URL, access token and dashboard options.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems are reported on stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Spinner shown while waiting on the service.
fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Dispatch the parsed command.
async fn run(args: Args, config: Config) -> Result<()> {
    let Some(command) = args.command else {
        return Ok(());
    };

    match command {
        Command::Analyze { model, text, file } => {
            handle_analyze(&config, args.quiet, &model, text, file).await
        }
        Command::Communications(cmd) => handle_communications(&config, args.quiet, cmd).await,
        Command::Dashboard {
            input,
            output,
            format,
        } => handle_dashboard(&config, args.quiet, input, output, format).await,
        Command::Models(cmd) => handle_models(&config, cmd).await,
        Command::Categories(cmd) => handle_categories(&config, cmd).await,
        Command::Associations(cmd) => handle_associations(&config, cmd).await,
    }
}

fn connect(config: &Config) -> Result<ApiClient> {
    ApiClient::new(config.api_config()).context("Failed to create HTTP client")
}

/// Build the form state for `analyze` from the given flags.
fn build_submission(model: &str, text: Option<String>, file: Option<PathBuf>) -> Submission {
    match (text, file) {
        (_, Some(file)) => Submission::upload(model, file),
        (Some(text), None) => Submission::save(model, &text),
        (None, None) => Submission {
            model_name: model.to_string(),
            ..Default::default()
        },
    }
}

async fn handle_analyze(
    config: &Config,
    quiet: bool,
    model: &str,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let validated = build_submission(model, text, file)
        .validate()
        .context("Invalid submission")?;

    let client = connect(config)?;
    let pb = spinner(quiet, "Analysing emotions...");
    let result = match validated {
        ValidatedSubmission::Save(body) => client.save_communication(&body).await,
        ValidatedSubmission::Upload { path, model_name } => {
            info!("Uploading {}", path.display());
            client.upload_file(&path, &model_name).await
        }
    };
    pb.finish_and_clear();

    let record = result.context("Analysis request failed")?;
    print_record(config, &record);
    Ok(())
}

fn print_record(config: &Config, record: &CommunicationRecord) {
    println!("\n📊 Analysis Results:\n");
    println!(
        "{}",
        report::render_analysis_result(record, &config.dashboard.timestamp_format)
    );
}

async fn handle_communications(
    config: &Config,
    quiet: bool,
    cmd: CommunicationsCommand,
) -> Result<()> {
    let client = connect(config)?;

    match cmd {
        CommunicationsCommand::List => {
            let pb = spinner(quiet, "Fetching communications...");
            let records = client.list_communications().await;
            pb.finish_and_clear();
            let records = records.context("Failed to fetch communications")?;

            println!(
                "{}",
                report::render_communication_list(&records, &config.dashboard.timestamp_format)
            );
        }
        CommunicationsCommand::Update { id, model, text } => {
            Submission::save(&model, &text)
                .validate()
                .context("Invalid update")?;
            let body = NewCommunication {
                content: text,
                model_name: model,
            };
            let record = client
                .update_communication(&id, &body)
                .await
                .with_context(|| format!("Failed to update communication {}", id))?;
            print_record(config, &record);
        }
        CommunicationsCommand::Delete { id } => {
            client
                .delete_communication(&id)
                .await
                .with_context(|| format!("Failed to delete communication {}", id))?;
            println!("✅ Communication with ID {} has been deleted.", id);
        }
    }

    Ok(())
}

/// Load records from a local JSON export.
fn load_records(path: &Path) -> Result<Vec<CommunicationRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    analysis::records_from_value(value)
        .with_context(|| format!("Unexpected content in {}", path.display()))
}

async fn handle_dashboard(
    config: &Config,
    quiet: bool,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<ReportFormat>,
) -> Result<()> {
    let (records, source) = match input {
        Some(ref path) => {
            info!("Reading records from {}", path.display());
            (load_records(path)?, path.display().to_string())
        }
        None => {
            let client = connect(config)?;
            let pb = spinner(quiet, "Fetching communications...");
            let records = client.list_communications().await;
            pb.finish_and_clear();
            (
                records.context("Failed to fetch communications")?,
                client.base_url().to_string(),
            )
        }
    };

    if records.is_empty() {
        warn!("No communications to visualise");
    }

    let dashboard =
        analysis::build_dashboard(&records, &source, &config.dashboard.timestamp_format);

    let output_content = match format.unwrap_or(config.general.format) {
        ReportFormat::Json => report::generate_json_report(&dashboard)?,
        ReportFormat::Markdown => {
            report::generate_markdown_report(&dashboard, config.dashboard.confidence_decimals)
        }
    };

    let output = output.or_else(|| {
        (!config.general.output.is_empty()).then(|| PathBuf::from(&config.general.output))
    });

    match output {
        Some(path) => {
            std::fs::write(&path, &output_content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;

            println!("\n📊 Dashboard Summary:");
            println!("   Total communications: {}", dashboard.total);
            println!("   Distinct emotions: {}", dashboard.distribution.len());
            println!("   Model versions: {}", dashboard.models.len());
            println!("\n✅ Dashboard saved to: {}", path.display());
        }
        None => println!("{}", output_content),
    }

    Ok(())
}

async fn handle_models(config: &Config, cmd: ModelsCommand) -> Result<()> {
    let client = connect(config)?;

    match cmd {
        ModelsCommand::List => {
            let models = client.list_models().await.context("Failed to fetch models")?;
            if models.is_empty() {
                println!("No custom models found.");
            }
            for model in models {
                println!("  [{}] {}", model.id, model.name);
            }
        }
        ModelsCommand::Create { name } => {
            let name = validate_model_name(&name)?;
            let model = client
                .create_model(&name)
                .await
                .context("Failed to create model")?;
            println!("✅ Created model {} with ID {}.", model.name, model.id);
        }
        ModelsCommand::Delete { id } => {
            client
                .delete_model(&id)
                .await
                .with_context(|| format!("Failed to delete model {}", id))?;
            println!("✅ Model with ID {} has been deleted.", id);
        }
    }

    Ok(())
}

fn print_categories(categories: &[EmotionCategory]) {
    if categories.is_empty() {
        println!("No categories found.");
    }
    for category in categories {
        println!("  [{}] {}", category.id, category.emotion);
    }
}

async fn handle_categories(config: &Config, cmd: CategoriesCommand) -> Result<()> {
    let client = connect(config)?;

    match cmd {
        CategoriesCommand::List { model_id } => {
            let categories = client
                .list_categories(&model_id)
                .await
                .with_context(|| format!("Failed to fetch categories for model {}", model_id))?;
            print_categories(&categories);
        }
        CategoriesCommand::All => {
            let categories = client
                .list_all_categories()
                .await
                .context("Failed to fetch categories")?;
            print_categories(&categories);
        }
        CategoriesCommand::Create { model_id, name } => {
            let name = validate_category_name(&name)?;
            let category = client
                .create_category(&model_id, &name)
                .await
                .context("Failed to create category")?;
            println!(
                "✅ Added category {} (ID {}) to model {}.",
                category.emotion, category.id, model_id
            );
        }
        CategoriesCommand::Rename { id, name } => {
            let name = validate_category_name(&name)?;
            let category = client
                .rename_category(&id, &name)
                .await
                .with_context(|| format!("Failed to rename category {}", id))?;
            println!("✅ Category {} is now {}.", category.id, category.emotion);
        }
        CategoriesCommand::Delete { id } => {
            client
                .delete_category(&id)
                .await
                .with_context(|| format!("Failed to delete category {}", id))?;
            println!("✅ Category with ID {} has been deleted.", id);
        }
    }

    Ok(())
}

async fn handle_associations(config: &Config, cmd: AssociationsCommand) -> Result<()> {
    let client = connect(config)?;

    match cmd {
        AssociationsCommand::List { model_id } => {
            let (categories, associations) = client
                .model_vocabulary(&model_id)
                .await
                .with_context(|| format!("Failed to fetch associations for model {}", model_id))?;

            println!("Categories:");
            print_categories(&categories);
            println!("\nWord-Emotion Associations:");
            if associations.is_empty() {
                println!("No associations available.");
            }
            for assoc in associations {
                println!(
                    "  [{}] {} - {}",
                    assoc.id,
                    assoc.word,
                    assoc.emotion_category.as_deref().unwrap_or(models::UNKNOWN_LABEL)
                );
            }
        }
        AssociationsCommand::Create { word, category_id } => {
            let word = validate_word(&word)?;
            let assoc = client
                .create_association(&word, &category_id)
                .await
                .context("Failed to create association")?;
            println!("✅ Associated {} with category {}.", assoc.word, category_id);
        }
        AssociationsCommand::Delete { id } => {
            client
                .delete_association(&id)
                .await
                .with_context(|| format!("Failed to delete association {}", id))?;
            println!("✅ Association with ID {} has been deleted.", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::submission::Operation;

    #[test]
    fn test_build_submission() {
        let save = build_submission("m", Some("hi".to_string()), None);
        assert_eq!(save.operation, Some(Operation::Save));

        let upload = build_submission("m", None, Some(PathBuf::from("a.txt")));
        assert_eq!(upload.operation, Some(Operation::Upload));

        let empty = build_submission("m", None, None);
        let errors = empty.validate().unwrap_err();
        assert_eq!(errors.get("operation"), Some("Please select an operation."));
    }

    #[test]
    fn test_init_config_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        handle_init_config(&path).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_load_records_from_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"[{"primaryEmotion": {"emotion": "Joy", "percentage": 80}, "modelVersion": "v1", "confidenceRating": 90}]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].primary_label(), "Joy");

        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();
        let err = load_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid input shape"));
    }

    #[test]
    fn test_dashboard_from_export_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("export.json");
        let output = dir.path().join("dashboard.json");
        std::fs::write(
            &input,
            r#"[
                {"primaryEmotion": {"emotion": "Joy"}, "secondaryEmotions": [{"emotion": "Trust"}], "modelVersion": "v1", "confidenceRating": 90},
                {"primaryEmotion": {"emotion": "Joy"}, "modelVersion": "v1", "confidenceRating": 80},
                {"primaryEmotion": {"emotion": "Anger"}, "secondaryEmotions": [{"emotion": "Trust"}], "modelVersion": "v2", "confidenceRating": 70}
            ]"#,
        )
        .unwrap();

        tokio_test::block_on(handle_dashboard(
            &Config::default(),
            true,
            Some(input),
            Some(output.clone()),
            Some(ReportFormat::Json),
        ))
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["distribution"][2]["name"], "Trust");
        assert_eq!(value["distribution"][2]["Secondary"], 2);
        assert_eq!(value["models"][0]["confidence"], 85.0);
        assert_eq!(value["models"][1]["count"], 1);
    }
}
