//! Relay-Admin: command-line client for the bridge relay's admin API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use relay_admin::api::RelayApiClient;

/// Admin client for the bridge relay.
#[derive(Parser, Debug)]
#[command(name = "relay-admin", version)]
struct Args {
    /// Relay base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8885")]
    endpoint: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the bridge's status document.
    Status,
    /// Print the conversation history.
    History,
    /// Reset the agent session and clear the history.
    Reset,
    /// Manage the IP allow-list.
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
    /// Show or set the persisted working directory.
    Workdir {
        /// New working directory; omit to print the current one.
        dir: Option<String>,
    },
    /// List clients seen by the relay since startup.
    Clients,
    /// Print relay counters.
    Metrics,
}

#[derive(Subcommand, Debug)]
enum WhitelistAction {
    /// List current entries.
    List,
    /// Add an address.
    Add { address: String },
    /// Remove an entry.
    Remove { address: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = RelayApiClient::new(&args.endpoint)?;

    match args.command {
        Command::Status => print_json(&client.status().await?)?,
        Command::History => {
            for entry in client.history().await? {
                println!("[{}] {}: {}", entry.timestamp, entry.role, entry.content);
            }
        }
        Command::Reset => print_json(&client.reset().await?)?,
        Command::Whitelist { action } => {
            let response = match action {
                WhitelistAction::List => client.whitelist().await?,
                WhitelistAction::Add { address } => client.whitelist_add(&address).await?,
                WhitelistAction::Remove { address } => client.whitelist_remove(&address).await?,
            };
            for entry in response.whitelist {
                println!("{entry}");
            }
        }
        Command::Workdir { dir } => {
            let response = match dir {
                Some(dir) => client.set_work_dir(&dir).await?,
                None => client.work_dir().await?,
            };
            println!("{}", response.work_dir.unwrap_or_else(|| "(unset)".into()));
        }
        Command::Clients => {
            for client_entry in client.clients().await?.clients {
                println!(
                    "{}\trequests={}\tlast seen {}",
                    client_entry.addr, client_entry.requests, client_entry.last_seen
                );
            }
        }
        Command::Metrics => {
            let m = client.metrics().await?;
            println!("requests_total    {}", m.requests_total);
            println!("requests_denied   {}", m.requests_denied);
            println!("sessions_opened   {}", m.sessions_opened);
            println!("sessions_closed   {}", m.sessions_closed);
            println!("events_parsed     {}", m.events_parsed);
            println!("upstream_errors   {}", m.upstream_errors);
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
