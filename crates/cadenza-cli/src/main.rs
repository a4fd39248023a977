use anyhow::Result;
use cadenza_core::Namespace;
use cadenza_embed::Config;
use clap::Parser;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cadenza", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the asset database (default: ~/.local/share/cadenza/cadenza.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Compute the embedding of an audio file
    ///
    /// Decodes the file, downmixes it to mono, takes the full Fourier
    /// transform of the canonical 16-bit samples and reduces the spectrum
    /// to a 1536-component unit vector. Nothing is written anywhere.
    Embed {
        /// Path to the audio file
        path: PathBuf,

        /// Print the full vector as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Ingest audio into the similarity index
    ///
    /// Accepts a single file or a directory. Directories are walked
    /// recursively for FLAC, MP3, OGG, WAV and M4A/AAC files; each one is
    /// embedded and upserted with its title tag as extra metadata.
    ///
    /// Transient index failures (timeouts, rate limiting, 5xx answers) are
    /// retried with exponential backoff. In directory mode a file that
    /// still fails is reported and skipped.
    Ingest {
        /// Audio file or directory
        path: PathBuf,

        /// Namespace to ingest into
        #[arg(long, default_value = Namespace::AUDIO_TRACKS, value_parser = parse_namespace)]
        namespace: Namespace,

        /// Source URL recorded in the metadata (single file only;
        /// defaults to the file's file:// URL)
        #[arg(long)]
        url: Option<String>,

        /// Attempts after the first for transient failures
        #[arg(long, default_value_t = 3)]
        retries: usize,
    },
    /// Find the tracks most similar to an audio file or URL
    Query {
        /// Audio file path, or an http(s) URL to download
        target: String,

        /// Namespace to search
        #[arg(long, default_value = Namespace::AUDIO_TRACKS, value_parser = parse_namespace)]
        namespace: Namespace,

        /// Number of matches (default: default_top_k from config)
        #[arg(long)]
        top_k: Option<usize>,

        /// Print matches (or the error) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a track into a user's playlist
    ///
    /// Stores the raw audio in the blob directory, records the asset in
    /// the database and ingests its embedding into the audio_tracks
    /// namespace.
    Upload {
        /// Path to the audio file
        path: PathBuf,

        /// Owning user
        #[arg(long)]
        user: String,

        /// Target playlist
        #[arg(long)]
        playlist: String,

        /// Title to record (default: the file name)
        #[arg(long)]
        title: Option<String>,
    },
    /// Show uploaded asset counts per playlist
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get { key: Option<String> },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn parse_namespace(s: &str) -> Result<Namespace, String> {
    Namespace::new(s).map_err(|e| e.to_string())
}

fn load_config(db: Option<PathBuf>) -> Result<Config> {
    let config = match db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Embed { path, json } => {
            let config = load_config(cli.db)?;
            commands::run_embed(&path, &config, json).await?;
        }
        Commands::Ingest {
            path,
            namespace,
            url,
            retries,
        } => {
            let config = load_config(cli.db)?;
            let options = commands::ingest::IngestOptions {
                namespace,
                url,
                retries,
            };
            commands::run_ingest(&path, &config, options).await?;
        }
        Commands::Query {
            target,
            namespace,
            top_k,
            json,
        } => {
            let config = load_config(cli.db)?;
            let top_k = top_k.unwrap_or(config.default_top_k);
            commands::run_query(&target, &namespace, top_k, json, &config).await?;
        }
        Commands::Upload {
            path,
            user,
            playlist,
            title,
        } => {
            let config = load_config(cli.db)?;
            commands::run_upload(&path, user, playlist, title, &config).await?;
        }
        Commands::Status => {
            let config = load_config(cli.db)?;
            commands::show_status(&config.database_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Get { key } => commands::config::get_config(key.as_deref())?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
