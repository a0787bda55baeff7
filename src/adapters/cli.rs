//! CLI adapter — interactive and single-message command line interface.
//!
//! Wraps a session in a terminal channel: reads prompts from stdin,
//! shows a spinner while a request is in flight, prints model text, and
//! writes generated images under the images directory.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::GenerativeClient;
use crate::session::{InputSurface, SendOutcome, Session};
use crate::transcript::{Artifact, ChatMessage, Role};
use crate::Result;

/// Terminal view surface.
///
/// A submitted readline is already consumed by the time the session
/// runs, so clearing the input is a no-op; scrolling maps to flushing
/// stdout so appended content is visible immediately.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl InputSurface for TerminalSurface {
    fn clear_input(&mut self) {}

    fn scroll_to_bottom(&mut self) {
        let _ = io::stdout().flush();
    }
}

/// CLI channel for chat and image-generation sessions.
pub struct ChatChannel<C: GenerativeClient> {
    session: Session<C>,
    surface: TerminalSurface,
    images_dir: PathBuf,
    rendered: usize,
    saved_images: usize,
}

impl<C: GenerativeClient> ChatChannel<C> {
    /// Create a new CLI channel.
    pub fn new(session: Session<C>, images_dir: PathBuf) -> Self {
        Self {
            session,
            surface: TerminalSurface,
            images_dir,
            rendered: 0,
            saved_images: 0,
        }
    }

    /// Run a single message and render the outcome.
    pub async fn run_once(&mut self, message: &str) -> Result<()> {
        self.send(message).await
    }

    /// Run interactive REPL loop.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("\n{} ", "You:".blue().bold());
            stdout.flush()?;

            // Read input
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            // Check for exit commands
            if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                println!("Goodbye! 👋");
                break;
            }

            if let Err(e) = self.send(input).await {
                eprintln!("\n{} {e}", "Error:".red().bold());
            }
        }

        Ok(())
    }

    async fn send(&mut self, input: &str) -> Result<()> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message("Generating");
        spinner.enable_steady_tick(Duration::from_millis(80));

        let outcome = self.session.handle_send(input, &mut self.surface).await;

        spinner.finish_and_clear();

        if outcome == SendOutcome::Completed {
            self.render_pending()?;
        }
        Ok(())
    }

    /// Render transcript messages appended since the last render.
    fn render_pending(&mut self) -> Result<()> {
        let pending: Vec<ChatMessage> = self.session.transcript().messages()[self.rendered..]
            .iter()
            .cloned()
            .collect();
        self.rendered += pending.len();

        for message in pending {
            // The user typed their own message; only model output needs rendering.
            if message.role != Role::Model {
                continue;
            }
            self.render_model_message(&message)?;
        }
        Ok(())
    }

    fn render_model_message(&mut self, message: &ChatMessage) -> Result<()> {
        println!();
        for artifact in &message.artifacts {
            match artifact {
                Artifact::Text(text) => {
                    println!("{} {}", "Mural:".green().bold(), text);
                }
                Artifact::Image { data, mime_type } => {
                    let path = self.save_image(data, mime_type)?;
                    println!(
                        "{} saved image → {}",
                        "Mural:".green().bold(),
                        path.display().to_string().cyan()
                    );
                }
            }
        }
        Ok(())
    }

    /// Decode a base64 image payload and write it under the images
    /// directory. Returns the written path.
    fn save_image(&mut self, data: &str, mime_type: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.images_dir)?;

        let bytes = STANDARD.decode(data)?;
        self.saved_images += 1;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let name = format!(
            "mural-{}-{:03}.{}",
            stamp,
            self.saved_images,
            extension_for(mime_type)
        );
        let path = self.images_dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}
