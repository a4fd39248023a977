use anyhow::{Context, Result};
use cadenza_embed::config::{self, Config};
use toml_edit::{value, DocumentMut};

/// Keys accepted by `config get` and `config set`.
const STRING_KEYS: &[&str] = &[
    "index_url",
    "index_api_key",
    "database_path",
    "blob_dir",
    "blob_base_url",
];

const INTEGER_KEYS: &[&str] = &[
    "max_input_bytes",
    "max_duration_secs",
    "workers",
    "queue_depth",
    "default_top_k",
    "request_timeout_secs",
];

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown config key: {}\n\nValid keys: {}, {}",
        key,
        STRING_KEYS.join(", "),
        INTEGER_KEYS.join(", ")
    )
}

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!(
        "  index_url: {}",
        config.index_url.as_deref().unwrap_or("<not set>")
    );
    println!(
        "  index_api_key: {}",
        if config.index_api_key.is_some() { "<set>" } else { "<not set>" }
    );
    println!("  database_path: {}", config.database_path.display());
    println!("  blob_dir: {}", config.blob_dir.display());
    println!(
        "  blob_base_url: {}",
        config.blob_base_url.as_deref().unwrap_or("<not set>")
    );
    println!("  max_input_bytes: {}", config.max_input_bytes);
    println!("  max_duration_secs: {}", config.max_duration_secs);
    println!("  workers: {}", config.workers);
    println!("  queue_depth: {}", config.queue_depth);
    println!("  default_top_k: {}", config.default_top_k);
    println!("  request_timeout_secs: {}", config.request_timeout_secs);

    println!("\nPriority: CLI args > ENV vars (CADENZA_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the whole file.
pub fn get_config(key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        let config_path = config::config_file_path();
        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'cadenza config init' to create it.");
        }
        return Ok(());
    };

    if !STRING_KEYS.contains(&key) && !INTEGER_KEYS.contains(&key) {
        return Err(unknown_key(key));
    }

    let config = serde_json::to_value(Config::load()?)?;
    match config.get(key) {
        Some(serde_json::Value::String(s)) => println!("{}", s),
        Some(serde_json::Value::Null) | None => println!("<not set>"),
        Some(other) => println!("{}", other),
    }

    Ok(())
}

/// Set a config value, preserving the rest of the file.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = update_document(&contents, key, raw)?;

    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

fn update_document(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc: DocumentMut = contents.parse().context("Config file is not valid TOML")?;

    if STRING_KEYS.contains(&key) {
        doc[key] = value(raw);
    } else if INTEGER_KEYS.contains(&key) {
        let n: i64 = raw
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))?;
        anyhow::ensure!(n >= 0, "{key} must be a non-negative integer, got '{raw}'");
        doc[key] = value(n);
    } else {
        return Err(unknown_key(key));
    }

    Ok(doc.to_string())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure cadenza.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
