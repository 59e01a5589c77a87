use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use console::style;
use docspace::auth::{self, AuthService, HttpAuthService, RegisterRequest};
use docspace::config::{self, Config, DownloadVariant};
use docspace::remote::{HttpDocumentStore, ACCEPT_HINT};
use docspace::session::SessionFile;
use docspace::workspace::{Confirm, DeleteOutcome, DocumentId, DocumentSummary, Segment};
use docspace::{SessionStore, WorkspaceController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Manage documents on a remote PDF/DOC store.
#[derive(Parser, Debug)]
#[command(name = "docspace", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// List every document
    List,
    /// Search documents by filename or content; no query lists everything
    Search { query: Option<String> },
    /// Upload a PDF or DOC file
    Upload { path: PathBuf },
    /// Download a document's extracted text (or the original with --raw)
    Download {
        id: DocumentId,
        #[arg(long)]
        raw: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a document (asks for confirmation)
    Delete { id: DocumentId },
    /// Search inside one document's text
    Grep { id: DocumentId, query: String },
    /// Print the viewer URL for a document, optionally with a search term
    Open { id: DocumentId, query: Option<String> },
}

/// Confirmation on the terminal. Anything but an explicit yes is a no.
struct PromptConfirm;

#[async_trait]
impl Confirm for PromptConfirm {
    async fn confirm(&self, message: &str) -> bool {
        let prompt = message.to_string();
        tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn session_file() -> Result<SessionFile> {
    let path = config::default_session_path()
        .context("Could not determine a data directory for the session file")?;
    Ok(SessionFile::new(path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    let sessions = session_file()?;
    match cli.command {
        Command::Login { username } => login(&config, &sessions, username).await,
        Command::Register { username, email } => register(&config, username, email).await,
        Command::Logout => {
            sessions.clear()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match sessions.load()? {
                Some(s) => println!(
                    "{} (id {}, role {})",
                    s.username.as_deref().unwrap_or("unknown"),
                    s.user_id,
                    s.role
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        command => run_workspace(&config, &sessions, command).await,
    }
}

async fn login(config: &Config, sessions: &SessionFile, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()?;

    let service = HttpAuthService::new(config.users_url(), timeout(config))?;
    let store = SessionStore::new();
    let session = auth::sign_in(&service, &store, &username, &password).await?;
    sessions.save(&session)?;
    println!("Signed in as {} ({}).", username, session.role);
    Ok(())
}

async fn register(config: &Config, username: Option<String>, email: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    let email = match email {
        Some(e) => e,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let service = HttpAuthService::new(config.users_url(), timeout(config))?;
    service
        .register(&RegisterRequest {
            username,
            email,
            password,
        })
        .await?;
    println!("Registered. Sign in with `docspace login`.");
    Ok(())
}

async fn run_workspace(config: &Config, sessions: &SessionFile, command: Command) -> Result<()> {
    let Some(session) = sessions.load()? else {
        bail!("Not signed in. Run `docspace login` first.");
    };
    let store = Arc::new(SessionStore::with_session(session));
    let variant = match &command {
        Command::Download { raw: true, .. } => DownloadVariant::Raw,
        _ => config.transfer.download_variant,
    };
    let controller = WorkspaceController::new(
        Arc::clone(&store),
        Arc::new(HttpDocumentStore::from_config(config)?),
        Arc::new(PromptConfirm),
    )
    .with_policy(config.policy)
    .with_download_variant(variant);

    let result = execute(config, &controller, command).await;
    if !store.is_active() {
        warn!("session rejected by the server; stored credentials cleared");
        sessions.clear()?;
    }
    result
}

async fn execute(config: &Config, controller: &WorkspaceController, command: Command) -> Result<()> {
    match command {
        Command::List => print_documents(&controller.list_documents().await?),
        Command::Search { query } => {
            let documents = controller.search(query.as_deref().unwrap_or("")).await?;
            print_documents(&documents);
        }
        Command::Upload { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !hint_accepts(&filename) {
                warn!(filename = %filename, accepted = ACCEPT_HINT, "file type outside the usual set");
            }
            let created = controller.upload(bytes, &filename).await?;
            println!("Uploaded {} as document {}.", created.filename, created.id);
        }
        Command::Download { id, output, .. } => {
            controller.refresh_quietly().await;
            let artifact = controller.download(id).await?;
            let dir = output.unwrap_or_else(|| config.output_dir());
            let path = artifact.save(&dir).await?;
            println!("Saved {} ({} bytes).", path.display(), artifact.bytes.len());
        }
        Command::Delete { id } => {
            controller.refresh_quietly().await;
            match controller.delete(id).await? {
                DeleteOutcome::Deleted => println!("Deleted document {id}."),
                DeleteOutcome::Declined => println!("Kept document {id}."),
            }
        }
        Command::Grep { id, query } => {
            let lines = controller.search_within_document(id, &query).await?;
            if lines.is_empty() {
                println!("No matches for '{query}'.");
            }
            for segments in controller.highlighted_excerpts(id) {
                println!("{}", render(&segments));
            }
        }
        Command::Open { id, query } => {
            println!("{}", controller.viewer_url(id, query.as_deref())?);
        }
        Command::Login { .. } | Command::Register { .. } | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

fn print_documents(documents: &[DocumentSummary]) {
    if documents.is_empty() {
        println!("No documents found.");
        return;
    }
    for doc in documents {
        println!(
            "{:>6}  {}  {}  {}",
            doc.id,
            style(&doc.filename).bold(),
            doc.uploaded_at_display(),
            doc.owner_name.as_deref().unwrap_or("N/A")
        );
    }
}

fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.is_match {
                style(&s.text).black().on_yellow().to_string()
            } else {
                s.text.clone()
            }
        })
        .collect()
}

fn hint_accepts(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    ACCEPT_HINT.split(',').any(|ext| lower.ends_with(ext))
}

fn timeout(config: &Config) -> Duration {
    Duration::from_secs(config.server.timeout_secs)
}
