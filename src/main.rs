use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swap_memes::app::{App, GenerateOptions};
use swap_memes::models::Config;
use swap_memes::prompts;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "swap-memes")]
#[command(about = "Turn modern life ironies into editorial cartoons")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a cartoon for a concept.
    Generate {
        /// The observation to draw. Required unless --random is given.
        #[arg(value_name = "CONCEPT")]
        concept: Option<String>,

        /// Pick a concept from the curated list.
        #[arg(long, conflicts_with = "concept")]
        random: bool,

        /// Rephrase the concept through a rhetorical template first.
        #[arg(long)]
        enhance: bool,

        /// Gemini API key; stored for later runs.
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Directory for the saved image (defaults to OUTPUT_DIR).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Do not save the image to disk.
        #[arg(long)]
        no_save: bool,

        /// Copy the image to the system clipboard.
        #[arg(long)]
        copy: bool,

        /// Print the image as a data URI.
        #[arg(long)]
        data_uri: bool,
    },
    /// Print a random concept.
    Random,
    /// Rephrase a concept.
    Enhance {
        #[arg(value_name = "CONCEPT", value_parser = parse_concept_arg)]
        concept: String,
    },
    /// List the example concepts.
    Examples,
    /// Print the full prompt that would be sent for a concept.
    Prompt {
        #[arg(value_name = "CONCEPT", value_parser = parse_concept_arg)]
        concept: String,
    },
    /// Manage the stored API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Debug, Subcommand)]
enum KeyAction {
    /// Store a new key.
    Set { key: String },
    /// Remove the stored key.
    Clear,
    /// Show the active key (masked).
    Show,
}

fn parse_concept_arg(input: &str) -> std::result::Result<String, String> {
    if input.trim().is_empty() {
        return Err("Concept must not be empty".to_string());
    }
    Ok(input.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swap_memes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env()?;

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Generate {
            concept,
            random,
            enhance,
            api_key,
            output_dir,
            no_save,
            copy,
            data_uri,
        } => {
            if let Some(dir) = output_dir {
                app.set_output_dir(dir);
            }
            let options = GenerateOptions {
                concept,
                random,
                enhance,
                api_key,
                save: !no_save,
                copy,
            };
            match app.generate(options).await {
                Ok(report) => {
                    println!("Concept: {}", report.concept);
                    if let Some(caption) = &report.caption {
                        println!("Caption: {}", caption);
                    }
                    if let Some(path) = &report.saved_to {
                        println!("Saved: {}", path.display());
                    }
                    if report.copied {
                        println!("Copied to clipboard");
                    }
                    if data_uri {
                        println!("{}", report.image_uri);
                    }
                }
                Err(e) => {
                    let message = app
                        .state()
                        .error_message
                        .clone()
                        .unwrap_or_else(|| e.to_string());
                    error!("{}", message);
                    eprintln!("{}", message);
                    std::process::exit(1);
                }
            }
        }
        Command::Random => println!("{}", app.random_concept()),
        Command::Enhance { concept } => println!("{}", app.enhance(&concept)),
        Command::Examples => {
            for (index, (preview, concept)) in app.examples().iter().enumerate() {
                println!("{}. {}\n   {}", index + 1, preview, concept);
            }
        }
        Command::Prompt { concept } => println!("{}", prompts::build_stylized_prompt(&concept)),
        Command::Key { action } => match action {
            KeyAction::Set { key } => {
                app.set_key(&key)?;
                println!("API key stored");
            }
            KeyAction::Clear => {
                app.clear_key()?;
                println!("API key removed");
            }
            KeyAction::Show => match app.masked_key() {
                Some(masked) => println!("{}", masked),
                None => println!("No API key configured"),
            },
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concept_arg_valid() {
        assert_eq!(
            parse_concept_arg("Smart homes that make us dumber").unwrap(),
            "Smart homes that make us dumber"
        );
    }

    #[test]
    fn test_parse_concept_arg_blank() {
        let err = parse_concept_arg("   ").unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn test_cli_parses_generate_flags() {
        let args = CliArgs::try_parse_from([
            "swap-memes",
            "generate",
            "--random",
            "--enhance",
            "--copy",
            "--no-save",
        ])
        .unwrap();
        match args.command {
            Command::Generate {
                concept,
                random,
                enhance,
                copy,
                no_save,
                ..
            } => {
                assert!(concept.is_none());
                assert!(random && enhance && copy && no_save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_concept_with_random() {
        assert!(CliArgs::try_parse_from(["swap-memes", "generate", "x", "--random"]).is_err());
    }
}
