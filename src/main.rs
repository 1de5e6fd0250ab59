use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sauti::{
    CommandHost, CommandState, Config, ConsoleCapture, ConsolePlayback, DirectoryEntry,
    EncryptedFileVault, IntentParser, ParsedIntent, SpeechFeedback, VoiceCommandController,
    VoiceContact, VoiceContactStore,
};

/// Sauti - voice command gateway for mobile money transfers
#[derive(Parser)]
#[command(name = "sauti", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive voice command loop
    Run,
    /// Manage voice contacts
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
}

#[derive(Subcommand)]
enum ContactsCommand {
    /// List stored contacts
    List,
    /// Add or update a contact
    Add { name: String, phone: String },
    /// Remove a contact by name
    Remove { name: String },
    /// Remove all contacts
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Import contacts from a directory export file
    Import {
        /// JSON file of `{"name": [...], "tel": [...]}` entries
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,sauti=info",
        1 => "info,sauti=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Contacts { command }) => run_contacts(&config, command).await,
        Some(Command::Run) | None => run_pipeline(config).await,
    }
}

fn open_store(config: &Config) -> Arc<VoiceContactStore> {
    let vault = Arc::new(EncryptedFileVault::in_dir(&config.data_dir));
    Arc::new(VoiceContactStore::new(vault))
}

/// Host that hands confirmed intents to the console
///
/// The actual transfer (USSD dial or backend call) belongs to the embedding
/// application; this binary stops at the submit boundary.
struct ConsoleHost;

impl CommandHost for ConsoleHost {
    fn on_submit(&self, intent: ParsedIntent) {
        let amount = intent.amount.map(|a| a.to_string()).unwrap_or_default();
        let phone = intent.resolved_phone.clone().unwrap_or_default();
        println!(
            "→ transfer request submitted: {amount} to {} ({phone})",
            intent.recipient_token
        );
    }

    fn on_dismiss(&self) {}
}

async fn run_pipeline(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config);
    store.initialize().await?;

    let feedback = Arc::new(SpeechFeedback::new(
        Arc::new(ConsolePlayback::new()),
        config.speech.voices.clone(),
        config.speech.rate,
        config.speech.pitch,
    ));
    let controller = VoiceCommandController::new(
        Arc::new(ConsoleCapture::new()),
        feedback,
        IntentParser::new(config.grammar.clone()),
        store,
        Arc::new(ConsoleHost),
        config.lang.clone(),
    );

    println!("Say something like \"send 500 shillings to 0712345678\".");

    loop {
        if !confirm_prompt("Speak a command?", true).await? {
            break;
        }

        controller.start().await;

        match controller.state() {
            CommandState::AwaitingConfirmation => {
                if let Some(intent) = controller.pending_intent() {
                    let amount = intent.amount.map(|a| a.to_string()).unwrap_or_default();
                    let phone = intent.resolved_phone.clone().unwrap_or_default();
                    println!("  {amount} → {} ({phone})", intent.recipient_token);
                }
                if confirm_prompt("Send it?", true).await? {
                    controller.confirm().await;
                } else {
                    controller.cancel().await;
                }
            }
            CommandState::Error => {
                if let Some(message) = controller.error_message() {
                    println!("✗ {message}");
                }
            }
            _ => {}
        }
    }

    Ok(())
}

async fn run_contacts(config: &Config, command: ContactsCommand) -> anyhow::Result<()> {
    let store = open_store(config);
    store.initialize().await?;

    match command {
        ContactsCommand::List => {
            let contacts = store.list();
            if contacts.is_empty() {
                println!("No voice contacts yet.");
            }
            for contact in contacts {
                println!("{:<20} {}", contact.name, contact.phone);
            }
        }
        ContactsCommand::Add { name, phone } => {
            store.save(VoiceContact::new(&name, &phone)).await?;
            println!("Contact saved.");
        }
        ContactsCommand::Remove { name } => {
            if store.delete(&name).await? {
                println!("Contact removed.");
            } else {
                println!("No contact named \"{name}\".");
            }
        }
        ContactsCommand::Clear { yes } => {
            let confirmed = yes
                || confirm_prompt(
                    "Remove all voice contacts? This cannot be undone.",
                    false,
                )
                .await?;
            if confirmed {
                store.clear().await?;
                println!("All voice contacts cleared.");
            }
        }
        ContactsCommand::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let entries: Vec<DirectoryEntry> = serde_json::from_str(&raw)?;
            let added = store.import(&entries).await?;
            println!(
                "{added} contact{} imported.",
                if added == 1 { "" } else { "s" }
            );
        }
    }

    Ok(())
}

/// Blocking dialoguer prompt moved off the async runtime
async fn confirm_prompt(prompt: &str, default: bool) -> anyhow::Result<bool> {
    let prompt = prompt.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
    })
    .await??;
    Ok(answer)
}
