use anyhow::{Context, Result};
use beatport::{Client, Config, QueryParams};
use clap::{Parser, Subcommand, ValueEnum};
use futures::{pin_mut, StreamExt};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line access to the Beatport catalog API
#[derive(Parser, Debug)]
#[command(name = "beatport", version, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// API host (overrides the config file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Use plain http instead of https
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the OAuth handshake and store the access token
    Authorize,
    /// Show a track
    Track { id: String },
    /// Fetch a catalog object, optionally one of its relations
    Get {
        #[arg(value_name = "TYPE")]
        object_type: String,
        id: Option<String>,
        relation: Option<String>,
        /// Extra query parameter, key=value
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Raw query against an endpoint, printing its "results"
    Query {
        endpoint: String,
        /// Extra query parameter, key=value
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Search the catalog
    Search {
        query: String,
        /// Restrict to an artist name
        #[arg(long)]
        artist: Option<String>,
    },
    /// Stream every item of a relation, e.g. `relation artist 3547 releases`
    Relation {
        #[arg(value_name = "TYPE")]
        object_type: String,
        id: String,
        relation: String,
        /// Stop after this many items
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", log_path.display());
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("beatport started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("beatport").join("beatport.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".beatport").join("beatport.log");
    }
    PathBuf::from("beatport.log")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    let effective = config.with_overrides(args.host.as_deref(), args.insecure);

    let mut client =
        Client::from_config(&effective).context("Failed to create Beatport client")?;

    match args.command {
        Command::Authorize => authorize(&mut client, &mut config).await?,
        Command::Track { id } => {
            let track = client.get_track(&id).await?;
            print_json(&track)?;
        }
        Command::Get {
            object_type,
            id,
            relation,
            params,
        } => {
            let params: QueryParams = params.into_iter().collect();
            let result = client
                .get_object(&object_type, id.as_deref(), relation.as_deref(), None, &params)
                .await?;
            print_json(&result)?;
        }
        Command::Query { endpoint, params } => {
            let params: QueryParams = params.into_iter().collect();
            let results = client.get_query(&endpoint, &params).await?;
            print_json(&results)?;
        }
        Command::Search { query, artist } => {
            let facets = artist.map(|a| format!("artistName:{a}"));
            let results = client.search(&query, facets.as_deref()).await?;
            print_json(&results)?;
        }
        Command::Relation {
            object_type,
            id,
            relation,
            limit,
        } => stream_relation(&client, &object_type, &id, &relation, limit).await?,
    }

    Ok(())
}

async fn authorize(client: &mut Client, config: &mut Config) -> Result<()> {
    let url = client
        .get_authorize_url()
        .await
        .context("Failed to obtain a request token")?;

    println!("Log in to your Beatport account in: {url}");
    print!("Paste the authorization data shown after login: ");
    io::stdout().flush()?;

    let mut auth_response = String::new();
    io::stdin().lock().read_line(&mut auth_response)?;

    client.authenticate(auth_response.trim()).await?;

    let (Some(token), Some(secret)) = (client.access_token(), client.access_secret()) else {
        anyhow::bail!("authentication did not yield an access token");
    };
    config.set_access(token, secret)?;

    println!("Authenticated. Access token saved.");
    Ok(())
}

async fn stream_relation(
    client: &Client,
    object_type: &str,
    id: &str,
    relation: &str,
    limit: Option<usize>,
) -> Result<()> {
    let kind = client
        .registry()
        .get(object_type)
        .with_context(|| format!("unknown resource type '{object_type}'"))?;
    let owner = client.get_resource(kind, id).await?;

    let items = owner.iter_relation(client, relation, QueryParams::new());
    pin_mut!(items);

    let mut count = 0;
    while let Some(item) = items.next().await {
        let item = item?;
        println!("{}", item);
        count += 1;
        if limit.is_some_and(|l| count >= l) {
            break;
        }
    }

    tracing::info!("Streamed {} {} of {} {}", count, relation, kind, id);
    Ok(())
}
