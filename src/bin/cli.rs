//! Læringsassistent CLI - curriculum summaries, goal lookup and activity reflections
//!
//! Usage: laeringsassistent-cli [OPTIONS] <COMMAND>
//!
//! One-shot commands run a single workflow step; `shell` keeps a session open
//! so summary, profile and suggestion carry over between commands.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use laeringsassistent_lib::{
    app_state::{Action, AppState, Notice},
    backend::BackendClient,
    db::{Activity, Database},
    error::{Error, Result},
    export::ExportOptions,
    format_goals::format_goals,
    goals::{display_label, GoalCatalog},
    logging,
    session::{Outcome, Session},
    settings::{self, Settings},
    utils::{parse_activity_number, safe_truncate},
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "laeringsassistent-cli")]
#[command(version, about = "Læringsassistent: curriculum summaries and practicum activities", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Activity database path (default: app data dir)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Goal catalog file or URL (overrides settings)
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Backend base URL (overrides settings; LAERINGSASSISTENT_BACKEND_URL still wins)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Detailed logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a curriculum PDF and print its summary
    Summarize {
        pdf: PathBuf,
    },
    /// List practicum profiles in the goal catalog
    Profiles,
    /// Show the goals of one profile
    Goals {
        profile: String,
    },
    /// Summarize a PDF and suggest an activity for a profile
    Suggest {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long)]
        profile: String,
        /// Store the suggestion as an activity
        #[arg(long)]
        save: bool,
    },
    /// Stored activities
    Activities {
        #[command(subcommand)]
        cmd: ActivityCommands,
    },
    /// Write all activities to aktiviteter.pdf
    Export {
        /// Output directory (default: settings export_dir or current dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Interactive session
    Shell,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ActivityCommands {
    /// List activities with reflections
    List,
    /// Store a text as a new activity
    Save { text: String },
    /// Replace the reflection of activity N (1-based)
    Reflect {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
        text: String,
    },
    /// Delete activity N (1-based)
    Delete {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        number: u64,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print current settings
    Show,
    /// Set the backend base URL
    SetBackend { url: String },
    /// Set the goal catalog source (file path or URL)
    SetCatalog { source: String },
    /// Set the backend API key (empty string clears it)
    SetApiKey { key: String },
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() {
    // Ignore SIGPIPE so piping through head/tail doesn't kill the process.
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }

    // println! still panics on a closed pipe; exit quietly instead
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if info.to_string().contains("Broken pipe") {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let data_dir = settings::app_data_dir();
    if let Some(log_path) = logging::init(&data_dir, cli.verbose) {
        if cli.verbose {
            eprintln!("Logging to: {}", log_path.display());
        }
    }

    if let Err(e) = run_cli(cli, &data_dir).await {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct Context {
    settings: Settings,
    config_path: PathBuf,
    db_path: PathBuf,
    json: bool,
}

impl Context {
    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            wrap_columns: self.settings.wrap_columns,
            ..ExportOptions::default()
        }
    }

    async fn catalog(&self) -> GoalCatalog {
        GoalCatalog::load_or_empty(&self.settings.catalog_source).await
    }

    async fn session(&self, with_catalog: bool, export_dir: PathBuf) -> Result<Session<Database>> {
        let catalog = if with_catalog {
            self.catalog().await
        } else {
            GoalCatalog::empty()
        };
        let db = Database::new(&self.db_path)?;
        log::debug!("Using database: {}", db.get_path());
        let state = AppState::new(catalog, db);
        let backend = BackendClient::from_settings(&self.settings)?;
        Ok(Session::new(state, backend, export_dir, self.export_options()))
    }
}

async fn run_cli(cli: Cli, data_dir: &Path) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "laeringsassistent-cli", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = settings::config_path(data_dir);
    let mut settings = Settings::load(&config_path);
    if let Some(url) = &cli.backend {
        settings.set_backend_url(url)?;
    }
    if let Some(source) = &cli.catalog {
        settings.catalog_source = source.clone();
    }
    let db_path = cli
        .db
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.database_path(data_dir));

    let ctx = Context {
        settings,
        config_path,
        db_path,
        json: cli.json,
    };

    match cli.command {
        Commands::Summarize { pdf } => cmd_summarize(&ctx, &pdf).await,
        Commands::Profiles => cmd_profiles(&ctx).await,
        Commands::Goals { profile } => cmd_goals(&ctx, &profile).await,
        Commands::Suggest { pdf, profile, save } => cmd_suggest(&ctx, &pdf, &profile, save).await,
        Commands::Activities { cmd } => cmd_activities(&ctx, cmd).await,
        Commands::Export { out } => {
            let dir = out.unwrap_or_else(|| ctx.settings.export_dir());
            let mut session = ctx.session(false, dir).await?;
            let outcome = session.dispatch(Action::Export).await;
            report(&outcome);
            if let Some(path) = outcome.exported {
                println!("Eksporteret til {}", path.display());
            }
            Ok(())
        }
        Commands::Config { cmd } => cmd_config(ctx, cmd),
        Commands::Shell => run_shell(&ctx).await,
        Commands::Completions { .. } => Ok(()),
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

fn report(outcome: &Outcome) {
    for notice in &outcome.notices {
        println!("{}", notice);
    }
}

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::Pdf(format!("{}: {}", path.display(), e))
    })
}

/// Upload + summarize; returns false when the summary step failed
async fn upload(session: &mut Session<Database>, pdf: &Path) -> Result<bool> {
    let bytes = read_pdf(pdf)?;
    let outcome = session.dispatch(Action::UploadPdf(bytes)).await;
    report(&outcome);
    Ok(outcome.notices.is_empty())
}

async fn cmd_summarize(ctx: &Context, pdf: &Path) -> Result<()> {
    let mut session = ctx.session(false, ctx.settings.export_dir()).await?;
    upload(&mut session, pdf).await?;

    let summary = &session.state().summary;
    if ctx.json {
        println!("{}", serde_json::json!({ "summary": summary }));
    } else if summary.is_empty() {
        println!("Ingen opsummering endnu - upload en PDF for at komme i gang.");
    } else {
        println!("{}", summary);
    }
    Ok(())
}

async fn cmd_profiles(ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog().await;
    if ctx.json {
        let profiles: Vec<&str> = catalog.profiles().collect();
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    if catalog.is_empty() {
        println!("Ingen profiler fundet i {}", ctx.settings.catalog_source);
    }
    for (i, profile) in catalog.profiles().enumerate() {
        println!("{:>2}. {}", i + 1, display_label(profile));
    }
    Ok(())
}

async fn cmd_goals(ctx: &Context, profile: &str) -> Result<()> {
    let catalog = ctx.catalog().await;
    let record = catalog.lookup(profile);
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        if !catalog.contains(profile) {
            log::warn!("Unknown profile '{}'", profile);
        }
        print!("{}", format_goals(&record).to_markdown());
    }
    Ok(())
}

async fn cmd_suggest(ctx: &Context, pdf: &Path, profile: &str, save: bool) -> Result<()> {
    let mut session = ctx.session(true, ctx.settings.export_dir()).await?;
    if !session.state().catalog().contains(profile) {
        log::warn!("Profile '{}' not in catalog, suggesting without goals", profile);
    }

    if !upload(&mut session, pdf).await? {
        // The failure notice is already printed
        return Ok(());
    }
    session.dispatch(Action::SelectProfile(profile.to_string())).await;
    let outcome = session.dispatch(Action::RequestSuggestion).await;
    report(&outcome);

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "summary": session.state().summary,
                "profile": profile,
                "suggestion": session.state().suggestion,
            })
        );
    } else if !session.state().suggestion.is_empty() {
        println!("{}", session.state().suggestion);
    }

    if save {
        report(&session.dispatch(Action::SaveActivity).await);
    }
    Ok(())
}

fn print_activities(activities: &[Activity], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(activities)?);
        return Ok(());
    }
    println!("Mine aktiviteter (max 3)");
    if activities.is_empty() {
        println!("  (ingen)");
    }
    for (i, activity) in activities.iter().enumerate() {
        println!("\nAktivitet {}", i + 1);
        println!("{}", activity.text);
        if activity.reflection.is_empty() {
            println!("Refleksioner: -");
        } else {
            println!("Refleksioner: {}", activity.reflection);
        }
    }
    Ok(())
}

async fn cmd_activities(ctx: &Context, cmd: ActivityCommands) -> Result<()> {
    let mut session = ctx.session(false, ctx.settings.export_dir()).await?;

    let action = match cmd {
        ActivityCommands::List => {
            return print_activities(session.state().activities(), ctx.json);
        }
        ActivityCommands::Save { text } => {
            if text.trim().is_empty() {
                println!("{}", Notice::NothingToSave);
                return Ok(());
            }
            // Saving goes through the same path as a received suggestion
            session.dispatch(Action::SuggestionReceived(Ok(text))).await;
            Action::SaveActivity
        }
        ActivityCommands::Reflect { number, text } => Action::UpdateReflection {
            index: (number - 1) as usize,
            value: text,
        },
        ActivityCommands::Delete { number } => Action::DeleteActivity {
            index: (number - 1) as usize,
        },
    };

    report(&session.dispatch(action).await);
    Ok(())
}

fn cmd_config(mut ctx: Context, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
                return Ok(());
            }
            println!("Config file:   {}", ctx.config_path.display());
            println!("Database:      {}", ctx.db_path.display());
            println!("Backend URL:   {}", ctx.settings.backend_url()?);
            println!(
                "API key:       {}",
                ctx.settings.masked_api_key().unwrap_or_else(|| "(none)".to_string())
            );
            println!("Catalog:       {}", ctx.settings.catalog_source);
            println!("Export dir:    {}", ctx.settings.export_dir().display());
            println!("Wrap columns:  {}", ctx.settings.wrap_columns);
            match ctx.settings.request_timeout_secs {
                Some(secs) => println!("Timeout:       {}s", secs),
                None => println!("Timeout:       none"),
            }
            return Ok(());
        }
        ConfigCommands::SetBackend { url } => ctx.settings.set_backend_url(&url)?,
        ConfigCommands::SetCatalog { source } => ctx.settings.catalog_source = source,
        ConfigCommands::SetApiKey { key } => {
            ctx.settings.api_key = if key.is_empty() { None } else { Some(key) };
        }
    }
    ctx.settings.save(&ctx.config_path)?;
    println!("Settings saved to {}", ctx.config_path.display());
    Ok(())
}

// ============================================================================
// Interactive shell
// ============================================================================

const SHELL_HELP: &str = "\
Kommandoer:
  upload <fil.pdf>       læs og opsummér en læreplan
  profiles               vis praktikprofiler
  profile <navn|nr>      vælg praktikprofil
  goals                  vis mål for valgt profil
  suggest                lav forslag til aktivitet
  save                   gem forslaget som aktivitet
  reflect <nr> <tekst>   skriv refleksion til aktivitet
  delete <nr>            slet aktivitet
  list                   vis aktiviteter
  show                   vis opsummering og forslag
  export                 udskriv alle aktiviteter til PDF
  quit                   afslut";

async fn run_shell(ctx: &Context) -> Result<()> {
    let mut session = ctx.session(true, ctx.settings.export_dir()).await?;
    println!("Læringsassistent - skriv 'help' for kommandoer");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => println!("{}", SHELL_HELP),
            "upload" => {
                if rest.is_empty() {
                    println!("Brug: upload <fil.pdf>");
                    continue;
                }
                println!("📄 Indlæser PDF...");
                match read_pdf(Path::new(rest)) {
                    Ok(bytes) => {
                        let outcome = session.dispatch(Action::UploadPdf(bytes)).await;
                        report(&outcome);
                        if !session.state().summary.is_empty() {
                            println!("\n{}", session.state().summary);
                        }
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        println!("{}", Notice::PdfUnreadable);
                    }
                }
            }
            "profiles" => {
                for (i, profile) in session.state().catalog().profiles().enumerate() {
                    println!("{:>2}. {}", i + 1, display_label(profile));
                }
            }
            "profile" => {
                let chosen = parse_activity_number(rest)
                    .and_then(|i| session.state().catalog().profiles().nth(i))
                    .map(String::from)
                    .unwrap_or_else(|| rest.to_string());
                session.dispatch(Action::SelectProfile(chosen.clone())).await;
                if !session.state().catalog().contains(&chosen) {
                    println!("Ukendt profil: {}", chosen);
                } else {
                    println!("Valgt: {}", display_label(&chosen));
                }
            }
            "goals" => {
                if session.state().profile.is_empty() {
                    println!("Vælg profil");
                } else {
                    print!("{}", format_goals(&session.state().goals).to_markdown());
                }
            }
            "suggest" => {
                let outcome = session.dispatch(Action::RequestSuggestion).await;
                report(&outcome);
                if outcome.notices.is_empty() {
                    println!("{}", session.state().suggestion);
                }
            }
            "save" => report(&session.dispatch(Action::SaveActivity).await),
            "reflect" => {
                let (number, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match parse_activity_number(number) {
                    Some(index) => {
                        let action = Action::UpdateReflection {
                            index,
                            value: text.trim().to_string(),
                        };
                        report(&session.dispatch(action).await);
                    }
                    None => println!("Brug: reflect <nr> <tekst>"),
                }
            }
            "delete" => match parse_activity_number(rest) {
                Some(index) => report(&session.dispatch(Action::DeleteActivity { index }).await),
                None => println!("Brug: delete <nr>"),
            },
            "list" => print_activities(session.state().activities(), false)?,
            "show" => {
                let state = session.state();
                if state.summary.is_empty() {
                    println!("Ingen opsummering endnu - upload en PDF for at komme i gang.");
                } else {
                    println!("Opsummering: {}", safe_truncate(&state.summary, 600));
                }
                if state.suggestion.is_empty() {
                    println!("Intet forslag endnu - skriv 'suggest'.");
                } else {
                    println!("Forslag: {}", state.suggestion);
                }
            }
            "export" => {
                let outcome = session.dispatch(Action::Export).await;
                report(&outcome);
                if let Some(path) = outcome.exported {
                    println!("Eksporteret til {}", path.display());
                }
            }
            other => println!("Ukendt kommando '{}' - skriv 'help'", other),
        }
    }
    Ok(())
}
