use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use ledger_engine::{
    db_types::NewAccessKey,
    helpers::known_cabinets,
    sqlite_db::db_url,
    AccessApi,
    BalanceApi,
    SqliteDatabase,
};
use ledger_server::{config::TelegramConfig, notifier::TelegramNotifier};
use log::*;

mod formatting;
mod keys;

use formatting::{format_access_keys, format_balances, format_login_logs};
use keys::random_access_key;

#[derive(Parser, Debug)]
#[command(version = "0.1.0", author = "Cabinet Ledger")]
pub struct Arguments {
    /// The database to work on. Defaults to CLS_DATABASE_URL
    #[arg(short = 'd', long = "database")]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "migrate", about = "Bring the schema up to date and create any missing balance rows")]
    Migrate,
    #[clap(name = "reset", about = "Delete all orders, requests, withdrawals and balances, then create zero balances")]
    Reset {
        /// Required. Nothing is deleted without it
        #[arg(long = "confirm")]
        confirm: bool,
    },
    #[clap(name = "keys", about = "Manage cabinet access keys")]
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
    #[clap(name = "balances", about = "Print every balance row")]
    Balances,
    #[clap(name = "logs", about = "Print the most recent login attempts")]
    Logs {
        #[arg(short = 'n', long = "limit", default_value = "25")]
        limit: i64,
    },
    #[clap(name = "notify-test", about = "Send a test message to the configured Telegram channel")]
    NotifyTest {
        #[arg(short = 'm', long = "message", default_value = "✅ Cabinet ledger notifications are working")]
        message: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeysCommand {
    #[clap(name = "list")]
    List,
    #[clap(name = "add")]
    Add(AddKeyParams),
    #[clap(name = "activate")]
    Activate { id: i64 },
    #[clap(name = "deactivate")]
    Deactivate { id: i64 },
    #[clap(name = "delete")]
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct AddKeyParams {
    /// The cabinet (or admin name) the key logs in as
    #[arg(short = 'c', long = "cabinet")]
    cabinet: String,
    /// The key itself. A random one is generated if omitted
    #[arg(short = 'k', long = "key")]
    key: Option<String>,
    #[arg(short = 'm', long = "description")]
    description: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Arguments) -> Result<()> {
    let url = cli.database.unwrap_or_else(db_url);
    match cli.command {
        Command::Migrate => migrate(&connect(&url).await?).await,
        Command::Reset { confirm } => reset(&connect(&url).await?, confirm).await,
        Command::Keys { command } => manage_keys(&connect(&url).await?, command).await,
        Command::Balances => {
            let balances = BalanceApi::new(connect(&url).await?).all_balances().await?;
            println!("{}", format_balances(&balances));
            Ok(())
        },
        Command::Logs { limit } => {
            let logs = AccessApi::new(connect(&url).await?, Default::default()).login_logs(Some(limit)).await?;
            println!("{}", format_login_logs(&logs));
            Ok(())
        },
        Command::NotifyTest { message } => send_test_notification(&message).await,
    }
}

async fn connect(url: &str) -> Result<SqliteDatabase> {
    debug!("Connecting to {url}");
    Ok(SqliteDatabase::new_with_url(url, 1).await?)
}

async fn migrate(db: &SqliteDatabase) -> Result<()> {
    db.migrate().await?;
    let created = BalanceApi::new(db.clone()).initialise_balances(&known_cabinets()).await?;
    println!("Migrations complete. {created} new balance rows.");
    Ok(())
}

async fn reset(db: &SqliteDatabase, confirm: bool) -> Result<()> {
    if !confirm {
        bail!("This deletes every order, order request, withdrawal and balance. Re-run with --confirm to go ahead.");
    }
    db.migrate().await?;
    db.clear_ledger_data().await?;
    let created = BalanceApi::new(db.clone()).initialise_balances(&known_cabinets()).await?;
    warn!("Ledger data was reset");
    println!("Ledger data cleared. {created} zero balances created.");
    Ok(())
}

async fn manage_keys(db: &SqliteDatabase, cmd: KeysCommand) -> Result<()> {
    let api = AccessApi::new(db.clone(), Default::default());
    match cmd {
        KeysCommand::List => {
            let keys = api.access_keys().await?;
            println!("{}", format_access_keys(&keys));
        },
        KeysCommand::Add(AddKeyParams { cabinet, key, description }) => {
            let access_key = key.unwrap_or_else(random_access_key);
            let key = api.create_access_key(NewAccessKey { access_key, cabinet, description }).await?;
            println!("Created key #{} for {}: {}", key.id, key.cabinet, key.access_key);
        },
        KeysCommand::Activate { id } => {
            let key = api.activate_access_key(id).await?;
            println!("Key #{} for {} is active", key.id, key.cabinet);
        },
        KeysCommand::Deactivate { id } => {
            let key = api.deactivate_access_key(id).await?;
            println!("Key #{} for {} is inactive", key.id, key.cabinet);
        },
        KeysCommand::Delete { id } => {
            let n = api.delete_access_key(id).await?;
            println!("{n} key(s) deleted");
        },
    }
    Ok(())
}

async fn send_test_notification(message: &str) -> Result<()> {
    let config = TelegramConfig::from_env();
    if !config.notifications_enabled() {
        bail!("Set CLS_TELEGRAM_BOT_TOKEN and CLS_TELEGRAM_CHANNEL_ID to send notifications.");
    }
    let notifier = TelegramNotifier::new(config)?;
    notifier.send_message(message).await?;
    println!("Test message sent.");
    Ok(())
}
