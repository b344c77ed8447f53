use std::path::PathBuf;

use crate::server;
use clap::{Args, Parser, Subcommand};
use portfolio_contact::config::{AppConfig, ConfigError};
use portfolio_contact::contact::{ContactStore, CsvContactStore, StoredContact};
use portfolio_contact::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Portfolio Contact Service",
    about = "Run the portfolio contact-form service or inspect stored submissions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect contact submissions persisted to the CSV store
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    /// Print every stored submission in creation order
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Contact file to read (defaults to CONTACTS_PATH)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Emit JSON instead of a text listing
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Contacts {
            command: ContactsCommand::List(args),
        } => list_contacts(args),
    }
}

fn list_contacts(args: ListArgs) -> Result<(), AppError> {
    let path = match args.path {
        Some(path) => path,
        None => AppConfig::load()?
            .storage
            .contacts_path
            .ok_or(ConfigError::MissingContactsPath)?,
    };

    let contacts = CsvContactStore::open(path)?.list()?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&contacts)?;
        println!("{rendered}");
    } else {
        print!("{}", render_contacts(&contacts));
    }

    Ok(())
}

fn render_contacts(contacts: &[StoredContact]) -> String {
    if contacts.is_empty() {
        return "No contact submissions stored\n".to_string();
    }

    let mut out = format!("{} contact submission(s)\n", contacts.len());
    for contact in contacts {
        out.push_str(&format!(
            "- #{} {} | {} <{}> | {}\n",
            contact.id,
            contact.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            contact.name,
            contact.email,
            contact.subject
        ));
        for line in contact.message.lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}
