// ScriptForge Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | ScriptForge

use scriptforge_core::agent::connectivity::{ApiKeys, ConnectivityRegistry, JsonFileKeys, KeyStore};
use scriptforge_core::agent::core::ScriptCore;
use scriptforge_core::agent::prompt_builder::ScriptRequest;
use scriptforge_core::agent::style_store::{JsonFileStyles, Style, StyleStore};
use scriptforge_core::agent::training::TrainingMethod;
use scriptforge_core::config::AppConfig;
use scriptforge_core::server;
use scriptforge_core::state::AppState;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scriptforge")]
#[command(about = "Style-driven documentary script dispatcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved styles and their training state
    Styles,

    /// Create a new style
    AddStyle {
        /// Display name (the id is derived from it)
        #[arg(short, long)]
        name: String,

        /// Icon shown next to the style
        #[arg(short, long, default_value = "🎬")]
        icon: String,
    },

    /// Set the active training method and its text
    Train {
        /// Style id
        #[arg(short, long)]
        style: String,

        /// instructions, bulk or policy
        #[arg(short, long)]
        method: String,

        /// Instruction text, corpus text, or policy text
        #[arg(short, long)]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long)]
        file: Option<PathBuf>,

        /// Policy document URL (policy method only)
        #[arg(long)]
        policy_url: Option<String>,
    },

    /// Add a before/after example to a style
    AddExample {
        #[arg(short, long)]
        style: String,

        /// File holding the original text
        #[arg(long)]
        before: PathBuf,

        /// File holding the edited text
        #[arg(long)]
        after: PathBuf,
    },

    /// Transform source text into a script in the style's voice
    Transform {
        #[arg(short, long)]
        style: String,

        #[arg(short, long)]
        title: String,

        /// File holding the source text
        #[arg(long)]
        source: PathBuf,

        /// Target duration in minutes
        #[arg(short, long, default_value_t = 22)]
        duration: u32,

        #[arg(short, long, default_value = "ar")]
        language: String,

        /// Write the script JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a script from the title alone
    Generate {
        #[arg(short, long)]
        style: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value_t = 22)]
        duration: u32,

        #[arg(short, long, default_value = "ar")]
        language: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fact-check script content
    FactCheck {
        /// File holding the script content
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Suggest episode ideas for a style
    Ideas {
        #[arg(short, long)]
        style: String,
    },

    /// Research a topic with cited sources
    Research {
        #[arg(short, long)]
        topic: String,
    },

    /// Test and save API keys for the two engines
    TestConnection {
        #[arg(long)]
        fast_key: Option<String>,

        #[arg(long)]
        precise_key: Option<String>,
    },

    /// Start the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

fn read_text(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn find_style(store: &StyleStore, id: &str) -> Result<Style> {
    store
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown style '{}'. Run `scriptforge styles` to list them.", id))
}

fn emit_json<T: serde::Serialize>(value: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("💾 Saved to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("--- SCRIPTFORGE v{} ---", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_env()?;
    let key_store = JsonFileKeys::new(config.keys_path());
    match key_store.load() {
        Ok(saved) => config.merge_saved_keys(&saved),
        Err(e) => warn!("⚠️ Saved API keys unreadable: {}", e),
    }

    let connectivity = Arc::new(ConnectivityRegistry::new(config.min_key_len));
    connectivity.probe_all(&config.keys);

    let mut store = StyleStore::open(Box::new(JsonFileStyles::new(config.styles_path())));
    let core = ScriptCore::from_config(&config, connectivity.clone());

    let args = Cli::parse();

    match args.command {
        Commands::Styles => {
            for style in store.styles() {
                println!(
                    "{} {:<28} id={:<28} method={:<12} trained={} scripts={}",
                    style.icon,
                    style.name,
                    style.id,
                    style.training.active_method().as_str(),
                    style.training.is_trained(),
                    style.script_count
                );
            }
        }
        Commands::AddStyle { name, icon } => {
            let style = store.add_style(&name, &icon)?;
            println!("✅ Added style '{}' (id: {})", style.name, style.id);
        }
        Commands::Train {
            style,
            method,
            text,
            file,
            policy_url,
        } => {
            let body = match (text, file) {
                (Some(t), _) => t,
                (None, Some(path)) => read_text(&path)?,
                (None, None) => String::new(),
            };
            let mut profile = find_style(&store, &style)?.training;
            match TrainingMethod::parse(&method) {
                Some(TrainingMethod::Instructions) => {
                    profile.method = TrainingMethod::Instructions;
                    profile.instructions = body;
                }
                Some(TrainingMethod::Bulk) => {
                    profile.method = TrainingMethod::Bulk;
                    profile.instructions = body;
                }
                Some(TrainingMethod::Policy) => {
                    profile.method = TrainingMethod::Policy;
                    profile.policy_url = policy_url.unwrap_or_default();
                    profile.policy_text = body;
                }
                Some(TrainingMethod::Example) => {
                    bail!("Use `add-example` to train a style by example")
                }
                None => bail!("Unknown training method '{}'", method),
            }
            store.update_training(&style, profile)?;
            println!("✅ Training saved for '{}'", style);
        }
        Commands::AddExample {
            style,
            before,
            after,
        } => {
            let before = read_text(&before)?;
            let after = read_text(&after)?;
            if before.trim() == after.trim() {
                bail!("No changes to add to training: both texts are identical");
            }
            store.add_training_example(&style, &before, &after)?;
            println!("✅ Example added to '{}'", style);
        }
        Commands::Transform {
            style,
            title,
            source,
            duration,
            language,
            output,
        } => {
            let style = find_style(&store, &style)?;
            let request = ScriptRequest {
                title,
                duration_minutes: duration,
                language,
                source_text: read_text(&source)?,
            };
            if request.title.trim().is_empty() || !request.has_source_text() {
                bail!("A title and non-empty source text are required for transformation");
            }
            let outcome = core.transform(&style, &request).await?;
            info!("✨ Transformed with the {} engine", outcome.engine);
            store.record_script(&style.id)?;
            emit_json(&outcome.script, output)?;
        }
        Commands::Generate {
            style,
            title,
            duration,
            language,
            output,
        } => {
            if title.trim().is_empty() {
                bail!("An episode title is required");
            }
            let style = find_style(&store, &style)?;
            let request = ScriptRequest {
                title,
                duration_minutes: duration,
                language,
                source_text: String::new(),
            };
            let outcome = core.generate_from_title(&style, &request).await?;
            store.record_script(&style.id)?;
            emit_json(&outcome.script, output)?;
        }
        Commands::FactCheck { input } => {
            let content = read_text(&input)?;
            if content.trim().is_empty() {
                bail!("There is no script content to check");
            }
            let result = core.fact_check(&content).await?;
            println!("✅ Accuracy: {}%\n\n{}", result.accuracy, result.details);
        }
        Commands::Ideas { style } => {
            let style = find_style(&store, &style)?;
            for idea in core.generate_ideas(&style.name).await? {
                println!("💡 {}", idea);
            }
        }
        Commands::Research { topic } => {
            let report = core.deep_research(&topic).await?;
            println!("{}", report.to_markdown());
        }
        Commands::TestConnection {
            fast_key,
            precise_key,
        } => {
            let keys = ApiKeys {
                fast_api_key: fast_key.unwrap_or(config.keys.fast_api_key.clone()),
                precise_api_key: precise_key.unwrap_or(config.keys.precise_api_key.clone()),
            };
            let statuses = connectivity.probe_all(&keys);
            key_store.save(&keys)?;
            println!("⚡ Fast engine:    {:?}", statuses.fast);
            println!("🧠 Precise engine: {:?}", statuses.precise);
        }
        Commands::Serve { port } => {
            info!("🌐 Starting ScriptForge API on port {}...", port);
            let state = Arc::new(AppState::new(core, store, config, Box::new(key_store)));
            server::start_server(port, state).await?;
        }
    }

    Ok(())
}
