// Entry point for the `flipeasy` command-line client

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use flipeasy_cli::collector::MAX_RECORDING;
use flipeasy_cli::image_prep::accept_image;
use flipeasy_cli::progress::with_progress;
use flipeasy_cli::{
    prepare_file, ClientError, ListingApiClient, ListingField, ListingSession, PreparedImage,
    Question, ResultView, Step, Submission, DEFAULT_SERVER_URL,
};
use listing_types::{ListingAnalysis, Platform};

const RETRY_MESSAGE: &str =
    "Something went wrong while generating your listing. Your photo and answers are saved; try again.";

#[derive(Parser)]
#[command(name = "flipeasy")]
#[command(version, about = "Turn a photo of an item into marketplace listings")]
struct Cli {
    /// FlipEasy server base URL
    #[arg(long, env = "FLIPEASY_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    server: String,

    /// Debug logging (RUST_LOG also works)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Guided flow: photo, questions or voice note, then results (default)
    Interactive {
        /// Start with this photo
        photo: Option<PathBuf>,
    },

    /// Generate listings for a photo in one step
    Generate {
        photo: PathBuf,

        /// Free text about the item (answers "Tell me about this item")
        #[arg(short, long)]
        description: Option<String>,

        /// Guided answer as key=value; keys: about, material, condition, age, brand
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(Question, String)>,

        /// Only show one platform: facebook, craigslist or offerup
        #[arg(short, long, value_parser = parse_platform)]
        platform: Option<Platform>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the service-account provider path
    Debug,

    /// Check the API-key provider path
    Test,
}

fn parse_answer(raw: &str) -> Result<(Question, String), String> {
    let (key, answer) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let question =
        Question::from_key(key).ok_or_else(|| format!("unknown question '{}'", key.trim()))?;
    Ok((question, answer.trim().to_string()))
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .map_err(|_| format!("unknown platform '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let client = ListingApiClient::new(&cli.server).context("Failed to build HTTP client")?;

    match cli.command.unwrap_or(Commands::Interactive { photo: None }) {
        Commands::Interactive { photo } => interactive(&client, photo).await,
        Commands::Generate {
            photo,
            description,
            answers,
            platform,
            json,
        } => generate(&client, &photo, description, answers, platform, json).await,
        Commands::Debug => debug(&client).await,
        Commands::Test => test_api_key(&client).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
        Err(_) if verbose => tracing_subscriber::EnvFilter::new("flipeasy_cli=debug"),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Shared steps
// =============================================================================

fn describe_photo(photo: &PreparedImage) -> String {
    let size = format!("{} KB", photo.bytes.len().div_ceil(1024));
    match photo.dimensions {
        Some((w, h)) => format!("{} ({}x{}, {})", photo.file_name, w, h, size),
        None => format!("{} (original, {})", photo.file_name, size),
    }
}

/// Send a submission the session has moved into `Processing`, rotating
/// status messages on stderr.
async fn run_processing(
    client: &ListingApiClient,
    session: &mut ListingSession,
    submission: Submission,
) -> Result<std::result::Result<ListingAnalysis, ClientError>> {
    let term = Term::stderr();

    let result = with_progress(
        client.analyze(&submission.image, &submission.description),
        |message| {
            let _ = term.clear_line();
            let _ = term.write_str(&format!("{} {}", "⏳".yellow(), message.dimmed()));
        },
    )
    .await;
    let _ = term.clear_line();

    match &result {
        Ok(analysis) => session.complete(analysis.clone())?,
        Err(e) => {
            tracing::debug!(error = %e, "Analyze request failed");
            session.fail(RETRY_MESSAGE)?;
        }
    }

    Ok(result)
}

// =============================================================================
// generate
// =============================================================================

async fn generate(
    client: &ListingApiClient,
    photo: &Path,
    description: Option<String>,
    answers: Vec<(Question, String)>,
    platform: Option<Platform>,
    json: bool,
) -> Result<()> {
    let photo = prepare_file(photo)?;
    eprintln!("{} {}", "📷".bright_blue(), describe_photo(&photo));

    let mut session = ListingSession::new();
    session.select_photo(photo)?;
    if let Some(description) = description {
        session.collector_mut().set_answer(Question::About, description);
    }
    for (question, answer) in answers {
        session.collector_mut().set_answer(question, answer);
    }

    let submission = session.begin_processing_photo_only()?;
    let analysis = run_processing(client, &mut session, submission)
        .await?
        .map_err(|e| anyhow::Error::new(e).context("Listing generation failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let mut view = ResultView::new(analysis);
    let platforms = match platform {
        Some(platform) => vec![platform],
        None => Platform::ALL.to_vec(),
    };
    for platform in platforms {
        view.select(platform);
        println!("{}", view.render(Instant::now()));
    }

    Ok(())
}

// =============================================================================
// interactive
// =============================================================================

enum RecordAction {
    Answer(Question),
    StartRecording,
    PlayBack,
    Discard,
    ChangePhoto,
    Generate,
    Quit,
}

enum ResultAction {
    Show(Platform),
    Copy(ListingField),
    TryAnother,
    Quit,
}

async fn interactive(client: &ListingApiClient, photo: Option<PathBuf>) -> Result<()> {
    let term = Term::stdout();
    let theme = ColorfulTheme::default();

    print_banner(&term)?;

    let mut session = ListingSession::new();
    let mut results: Option<ResultView> = None;

    if let Some(path) = photo {
        load_photo(&mut session, &path);
    }

    loop {
        match session.step() {
            Step::Upload => {
                if !upload_step(&mut session, &theme)? {
                    break;
                }
            }
            Step::Record => match record_step(&session, &theme)? {
                RecordAction::Answer(question) => {
                    let answer: String = Input::with_theme(&theme)
                        .with_prompt(question.prompt())
                        .with_initial_text(session.collector().answer(question))
                        .allow_empty(true)
                        .interact_text()?;
                    session.collector_mut().set_answer(question, answer);
                }
                RecordAction::StartRecording => record_voice_note(&mut session, &term).await?,
                RecordAction::PlayBack => {
                    if let Some(recording) = session.collector().recording() {
                        println!("{}", recording.summary().dimmed());
                    }
                }
                RecordAction::Discard => {
                    session.collector_mut().discard_recording();
                    println!("{}", "Voice note discarded".dimmed());
                }
                RecordAction::ChangePhoto => {
                    session.clear_photo()?;
                    upload_step(&mut session, &theme)?;
                }
                RecordAction::Generate => {
                    if !session.can_generate() {
                        println!(
                            "{}",
                            "Add a photo and answer a question or record a voice note first."
                                .yellow()
                        );
                        continue;
                    }
                    let submission = session.begin_processing()?;
                    match run_processing(client, &mut session, submission).await? {
                        Ok(analysis) => results = Some(ResultView::new(analysis)),
                        Err(e) => {
                            println!("{}", RETRY_MESSAGE.red());
                            println!("{}", e.to_string().dimmed());
                        }
                    }
                }
                RecordAction::Quit => break,
            },
            // run_processing always leaves Processing; recover if it ever doesn't
            Step::Processing => session.fail(RETRY_MESSAGE)?,
            Step::Results => {
                let Some(view) = results.as_mut() else {
                    session.reset();
                    continue;
                };
                match results_step(view, &theme)? {
                    ResultAction::Show(platform) => view.select(platform),
                    ResultAction::Copy(field) => {
                        let payload = view.copy(field, Instant::now());
                        print_clipboard(field, &payload);
                    }
                    ResultAction::TryAnother => {
                        results = None;
                        session.reset();
                        print_banner(&term)?;
                    }
                    ResultAction::Quit => break,
                }
            }
        }
    }

    println!("{}", "👋 Goodbye!".bright_blue());
    Ok(())
}

fn print_banner(term: &Term) -> Result<()> {
    term.clear_screen()?;
    println!("{}", "╔════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║   FlipEasy: photo in, listings out     ║".bright_cyan());
    println!("{}", "╚════════════════════════════════════════╝".bright_cyan());
    println!();
    Ok(())
}

fn load_photo(session: &mut ListingSession, path: &Path) -> bool {
    if accept_image(path).is_none() {
        println!("{} {} is not an image", "✗".bright_red(), path.display());
        return false;
    }

    let photo = match prepare_file(path) {
        Ok(photo) => photo,
        Err(e) => {
            println!("{} {}", "✗".bright_red(), e);
            return false;
        }
    };

    let label = describe_photo(&photo);
    match session.select_photo(photo) {
        Ok(()) => {
            println!("{} {}", "✓".bright_green(), label);
            true
        }
        Err(e) => {
            println!("{} {}", "✗".bright_red(), e);
            false
        }
    }
}

/// Ask for a photo path. Returns false when the user leaves.
fn upload_step(session: &mut ListingSession, theme: &ColorfulTheme) -> Result<bool> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt("Path to a photo of the item (empty to quit)")
            .allow_empty(true)
            .interact_text()?;

        let raw = raw.trim().trim_matches(|c| c == '"' || c == '\'');
        if raw.is_empty() {
            return Ok(false);
        }
        if load_photo(session, Path::new(raw)) {
            return Ok(true);
        }
    }
}

fn record_step(session: &ListingSession, theme: &ColorfulTheme) -> Result<RecordAction> {
    println!();
    match session.photo() {
        Some(photo) => println!("{} {}", "📷".bright_blue(), describe_photo(photo)),
        None => println!("{}", "📷 No photo selected".yellow()),
    }
    if let Some(error) = session.last_error() {
        println!("{}", error.red());
    }

    let collector = session.collector();
    let mut items: Vec<(String, RecordAction)> = Question::ALL
        .iter()
        .map(|q| {
            let answer = collector.answer(*q);
            let label = if answer.is_empty() {
                q.prompt().to_string()
            } else {
                format!("{} {}", q.prompt(), format!("[{}]", answer).green())
            };
            (label, RecordAction::Answer(*q))
        })
        .collect();

    match collector.recording() {
        Some(recording) => {
            items.push((
                format!("▶ Play back voice note ({}s)", recording.duration.as_secs()),
                RecordAction::PlayBack,
            ));
            items.push(("🗑  Discard voice note".to_string(), RecordAction::Discard));
        }
        None => items.push((
            format!("🎙  Record a voice note (up to {}s)", MAX_RECORDING.as_secs()),
            RecordAction::StartRecording,
        )),
    }

    items.push(("📷 Change photo".to_string(), RecordAction::ChangePhoto));
    let generate = if session.can_generate() {
        "✨ Generate listings".bright_green().bold().to_string()
    } else {
        "✨ Generate listings (needs a photo and a description)"
            .dimmed()
            .to_string()
    };
    items.push((generate, RecordAction::Generate));
    items.push(("🛑 Quit".to_string(), RecordAction::Quit));

    let labels: Vec<&str> = items.iter().map(|(label, _)| label.as_str()).collect();
    let selection = Select::with_theme(theme)
        .with_prompt("Describe the item")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(items.swap_remove(selection).1)
}

/// Run a voice note until Enter or the time cap.
async fn record_voice_note(session: &mut ListingSession, term: &Term) -> Result<()> {
    session.collector_mut().start_recording(Instant::now())?;
    println!(
        "{} Recording... press Enter to stop (stops automatically after {}s)",
        "🎙".bright_red(),
        MAX_RECORDING.as_secs()
    );

    let mut enter = tokio::task::spawn_blocking({
        let term = term.clone();
        move || term.read_line()
    });

    let pressed = tokio::select! {
        line = &mut enter => {
            line??;
            true
        }
        _ = tokio::time::sleep(MAX_RECORDING) => false,
    };

    let collector = session.collector_mut();
    if !pressed {
        collector.tick(Instant::now());
        println!(
            "{}",
            format!("Reached the {}s limit. Press Enter to continue.", MAX_RECORDING.as_secs())
                .yellow()
        );
        enter.await??;
    } else if collector.is_recording() {
        collector.stop_recording(Instant::now())?;
    }

    if let Some(recording) = collector.recording() {
        println!("{} {}", "✓".bright_green(), recording.summary());
    }
    Ok(())
}

fn results_step(view: &ResultView, theme: &ColorfulTheme) -> Result<ResultAction> {
    println!();
    println!("{}", view.render(Instant::now()));

    let mut items: Vec<(String, ResultAction)> = Platform::ALL
        .iter()
        .filter(|p| **p != view.active_platform())
        .map(|p| (format!("Show {}", p.label()), ResultAction::Show(*p)))
        .collect();

    for field in ListingField::ALL {
        items.push((format!("📋 Copy {}", field.label()), ResultAction::Copy(field)));
    }
    items.push(("🔄 Try another item".to_string(), ResultAction::TryAnother));
    items.push(("🛑 Quit".to_string(), ResultAction::Quit));

    let labels: Vec<&str> = items.iter().map(|(label, _)| label.as_str()).collect();
    let selection = Select::with_theme(theme)
        .with_prompt(view.active_platform().label())
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(items.swap_remove(selection).1)
}

/// Print a copied payload between rules so it can be selected as-is.
fn print_clipboard(field: ListingField, payload: &str) {
    println!();
    println!("{}", format!("── {} ──", field.label()).dimmed());
    println!("{}", payload);
    println!("{}", "────────".dimmed());
}

// =============================================================================
// diagnostics
// =============================================================================

async fn debug(client: &ListingApiClient) -> Result<()> {
    let report = client
        .debug()
        .await
        .with_context(|| format!("Failed to query {}/api/debug", client.base_url()))?;

    let status = report["status"].as_str().unwrap_or("unknown");
    let headline = match status {
        "ok" => format!("✅ Provider reachable ({})", status).bright_green(),
        "not_configured" => format!("⚠ Provider not configured ({})", status).yellow(),
        _ => format!("❌ Provider check failed ({})", status).bright_red(),
    };
    println!("{}", headline);

    for flag in [
        "credentials_exist",
        "credentials_valid",
        "project_id_exists",
        "api_key_exists",
    ] {
        let ok = report[flag].as_bool().unwrap_or(false);
        let mark = if ok { "✓".bright_green() } else { "✗".bright_red() };
        println!("  {} {}", mark, flag);
    }
    for field in ["client_email", "model", "location", "provider_response", "error"] {
        if let Some(value) = report[field].as_str() {
            println!("  {:<18} {}", field.dimmed(), value);
        }
    }

    Ok(())
}

async fn test_api_key(client: &ListingApiClient) -> Result<()> {
    let result = client
        .test_api_key()
        .await
        .context("API key test failed")?;

    if result.success {
        println!("{} {}", "✅ API key works:".bright_green(), result.response);
    } else {
        println!("{} {}", "❌ API key test failed:".bright_red(), result.response);
    }
    Ok(())
}
