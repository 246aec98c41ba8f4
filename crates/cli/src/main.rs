mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keystore::{KeyStore, looks_like_gemini_key};
use relay::{GeminiBackend, ImagePart, Mentor, Orchestrator};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "mentor.toml";
const DATABASE_FILE: &str = "mentor.db";
const FALLBACK_KEYS_ENV: &str = "MENTOR_FALLBACK_KEYS";
const DATA_DIR_ENV: &str = "MENTOR_DATA_DIR";

type CliMentor = Mentor<KeyStore, GeminiBackend>;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "A terminal chat client for the Gemini API", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Ask a single question
    Ask {
        /// The message to send
        message: String,
        /// Attach an image file
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Generate an indented mind map for a topic
    Mindmap {
        /// Topic of the mind map
        topic: String,
    },
    /// Manage your personal API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save your API key
    Set {
        /// The API key (whitespace is removed)
        value: String,
    },
    /// Show the stored API key, masked
    Show,
    /// Remove the stored API key
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(cli.config.as_deref()).await,
        Some(Commands::Ask { message, image }) => {
            cmd_ask(cli.config.as_deref(), &message, image.as_deref()).await
        }
        Some(Commands::Mindmap { topic }) => cmd_mindmap(cli.config.as_deref(), &topic).await,
        Some(Commands::Key { action }) => cmd_key(action),
    }
}

async fn cmd_chat(config_path: Option<&Path>) -> Result<()> {
    println!("mentor v{}", env!("CARGO_PKG_VERSION"));

    let mentor = build_mentor(config_path)?;
    if mentor.keys().user_key()?.is_none() {
        println!("No personal API key stored. Run 'mentor key set <KEY>' to add one.");
    }
    println!("Type 'quit' or Ctrl+D to exit. Use '/image <path> <message>' to attach an image.");
    println!("Quote the path if it contains spaces: /image \"my shot.png\" what is this?\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        let (message, image) = match input.strip_prefix("/image ") {
            Some(rest) => match parse_image_command(rest) {
                Some((path, message)) => match load_image(Path::new(path)) {
                    Ok(image) => (message, Some(image)),
                    Err(e) => {
                        eprintln!("Error: {e}\n");
                        continue;
                    }
                },
                None => {
                    eprintln!("Usage: /image <path> <message> (quote paths with spaces)\n");
                    continue;
                }
            },
            None => (input, None),
        };

        match mentor.chat(message, image).await {
            Ok(response) => println!("\n{response}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    println!("\nGoodbye.");
    Ok(())
}

async fn cmd_ask(config_path: Option<&Path>, message: &str, image: Option<&Path>) -> Result<()> {
    let mentor = build_mentor(config_path)?;
    let image = image.map(load_image).transpose()?;
    let response = mentor.chat(message, image).await?;
    println!("{response}");
    Ok(())
}

async fn cmd_mindmap(config_path: Option<&Path>, topic: &str) -> Result<()> {
    let mentor = build_mentor(config_path)?;
    let map = mentor
        .mind_map(topic)
        .await
        .ok_or_else(|| Error::MindMapUnavailable {
            topic: topic.to_string(),
        })?;
    println!("{map}");
    Ok(())
}

fn cmd_key(action: KeyAction) -> Result<()> {
    let store = open_store()?;

    match action {
        KeyAction::Set { value } => {
            if !store.save_user_key(&value)? {
                println!("Empty key ignored.");
                return Ok(());
            }
            if !looks_like_gemini_key(&value) {
                warn!("key does not start with 'AIza'; Gemini keys usually do");
            }
            println!("API key saved.");
        }
        KeyAction::Show => match store.user_key()? {
            Some(key) => println!("{}", mask_key(&key)),
            None => println!("No API key stored."),
        },
        KeyAction::Clear => {
            if store.clear_user_key()? {
                println!("API key removed.");
            } else {
                println!("No API key stored.");
            }
        }
    }

    Ok(())
}

fn build_mentor(config_path: Option<&Path>) -> Result<CliMentor> {
    let config = load_config(config_path)?;

    let mut backend = GeminiBackend::builder();
    if let Some(base_url) = &config.provider.base_url {
        backend = backend.base_url(base_url);
    }

    let backend = backend.build();
    debug!(%backend, "using backend");

    let orchestrator = Orchestrator::new(backend, config.policy());
    Ok(Mentor::new(open_store()?, orchestrator))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None if Path::new(CONFIG_FILE).exists() => Config::load(CONFIG_FILE)?,
        None => Config::default(),
    };
    let fallback_keys = std::env::var(FALLBACK_KEYS_ENV).ok();
    Ok(config.with_fallback_override(fallback_keys.as_deref()))
}

fn open_store() -> Result<KeyStore> {
    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .or_else(dirs_data_dir)
        .unwrap_or_else(|| ".mentor".into());
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join(DATABASE_FILE);
    debug!(path = %db_path.display(), "opening key store");
    Ok(KeyStore::open(&db_path)?)
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/mentor"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("mentor"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("mentor"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// Split the argument of `/image` into a path and a message.
///
/// The path may be wrapped in double quotes to allow spaces.
fn parse_image_command(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim();
    let (path, message) = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"')?,
        None => rest.split_once(' ')?,
    };
    let message = message.trim();
    if path.is_empty() || message.is_empty() {
        return None;
    }
    Some((path, message))
}

fn load_image(path: &Path) -> Result<ImagePart> {
    let bytes = std::fs::read(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImagePart::from_bytes(mime_type_for(path), &bytes))
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => "application/octet-stream",
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
