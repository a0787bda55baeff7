//! Mural CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mural")]
#[command(about = "🎨 Mural - chat and image generation in your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Mural settings
    Onboard,

    /// Chat with the model
    Chat {
        /// Message to send; omit for an interactive session
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Generate an image from a prompt
    Imagine {
        /// Image prompt
        prompt: String,

        /// Directory to write generated images to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Serve a directory over HTTP
    Serve {
        /// Serving port
        #[arg(short, long, default_value_t = mural::server::DEFAULT_PORT)]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Open the served page in a browser
        #[arg(long)]
        open: bool,
    },

    /// Inspect or edit settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Show Mural status
    Status,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print all stored settings
    Show,

    /// Set one setting key
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Setup Global Ctrl+C handler
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        } else {
            println!("\n⚠️  Press Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            // Reset flag after 3 seconds
            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            mural::settings::onboard()?;
        }

        Commands::Chat { message } => {
            let mut channel = make_channel(mural::api::CallPurpose::Chat, None)?;

            if let Some(msg) = message {
                // Single message mode
                channel.run_once(&msg).await?;
            } else {
                // Interactive mode
                mural::ui::print_mural_header("chat");
                println!("  Interactive mode (type 'exit' to leave)\n");
                channel.run_interactive().await?;
            }
        }

        Commands::Imagine { prompt, out } => {
            let mut channel = make_channel(mural::api::CallPurpose::ImageGeneration, out)?;
            channel.run_once(&prompt).await?;
        }

        Commands::Serve { port, root, open } => {
            let server = mural::server::StaticServer::new(root, port);
            let url = format!("http://{}", server.address());
            println!("🎨 Serving at {}", url);

            if open {
                let _ = open::that(&url);
            }

            server.run().await?;
        }

        Commands::Settings { command } => match command {
            SettingsCommands::Show => {
                let settings = mural::settings::load()?;
                if settings.is_empty() {
                    mural::ui::print_step("No settings stored yet. Run 'mural onboard'.");
                } else {
                    for (key, value) in settings.entries() {
                        let shown = if key == "apiKey" { "••••••" } else { value };
                        println!("  {} = {}", key, shown);
                    }
                }
            }
            SettingsCommands::Set { key, value } => {
                mural::settings::set_value(&key, &value)?;
                mural::ui::print_success(&format!("{} updated", key));
            }
        },

        Commands::Status => {
            let settings = mural::settings::load()?;
            println!("🎨 Mural Status\n");
            println!("Settings file: {:?}", mural::settings::settings_path());
            println!("Images dir: {:?}", mural::settings::images_dir());
            println!(
                "Chat model: {}",
                mural::api::CallPurpose::Chat.model()
            );
            println!(
                "Image model: {}",
                mural::api::CallPurpose::ImageGeneration.model()
            );
            println!(
                "API key: {}",
                if settings.api_key().is_ok() {
                    "✓"
                } else {
                    "not set (run 'mural onboard')"
                }
            );
        }
    }

    Ok(())
}

fn make_channel(
    purpose: mural::api::CallPurpose,
    out: Option<PathBuf>,
) -> Result<mural::adapters::ChatChannel<mural::api::GeminiClient>> {
    let settings = mural::settings::load()?;
    let client = mural::api::GeminiClient::new();
    let session = mural::session::Session::new(client, purpose, settings);
    let images_dir = out.unwrap_or_else(mural::settings::images_dir);
    Ok(mural::adapters::ChatChannel::new(session, images_dir))
}
