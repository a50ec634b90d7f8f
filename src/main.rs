use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use reqlab::assertions::AssertionSpec;
use reqlab::config::{load_settings, Settings};
use reqlab::env::{load_env_file_sync, EnvMap};
use reqlab::executor::{
    execute, execute_saved_request, print_execution_result, print_history_entry, BodyType,
    EnvSelection, ExecuteRequest, RequestSpec,
};
use reqlab::store::{
    CollectionStore, CollectionUpdate, EnvironmentStore, EnvironmentUpdate, HistoryStore,
    NewCollection, NewEnvironment, NewRequest, RequestStore, Store,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "reqlab",
    version,
    about = "Personal API testing workbench",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing reqlab.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data file used for storage
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a request described in a JSON file or on the command line
    Run(RunArgs),
    /// Execute a saved request
    Send {
        #[arg(value_name = "REQUEST_ID")]
        id: u64,
        /// Environment to resolve variables from
        #[arg(short, long, conflicts_with = "active")]
        env: Option<u64>,
        /// Use the currently active environment
        #[arg(long)]
        active: bool,
    },
    /// Manage saved requests
    #[command(subcommand)]
    Request(RequestCommand),
    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),
    /// Inspect execution history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Request file (JSON)
    #[arg(value_name = "REQUEST")]
    request: Option<PathBuf>,
    #[arg(short = 'X', long)]
    method: Option<String>,
    #[arg(short, long)]
    url: Option<String>,
    /// Header as NAME:VALUE
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    /// Query parameter as NAME=VALUE
    #[arg(short = 'q', long = "query")]
    params: Vec<String>,
    /// JSON request body
    #[arg(long, conflicts_with = "raw")]
    json: Option<String>,
    /// Raw request body
    #[arg(long)]
    raw: Option<String>,
    /// Environment to resolve variables from
    #[arg(short, long)]
    env: Option<u64>,
    /// Expect this status code
    #[arg(long = "expect-status")]
    expect_status: Option<u16>,
    /// Expect this top-level key in a JSON body
    #[arg(long = "expect-key")]
    expect_keys: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    List {
        #[arg(long)]
        collection: Option<u64>,
    },
    Show {
        id: u64,
    },
    /// Save a request from a JSON file
    Add {
        name: String,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        collection: Option<u64>,
    },
    Delete {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
enum CollectionCommand {
    List,
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    Rename {
        id: u64,
        name: String,
    },
    Delete {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
enum EnvCommand {
    List,
    Show {
        id: u64,
    },
    Add {
        name: String,
        #[arg(long, default_value = "")]
        base_url: String,
        /// Variable as NAME=VALUE
        #[arg(long = "var")]
        vars: Vec<String>,
    },
    /// Create an environment from a dotenv file
    Import {
        name: String,
        file: PathBuf,
        #[arg(long, default_value = "")]
        base_url: String,
    },
    /// Set or replace variables on an environment
    Set {
        id: u64,
        #[arg(required = true)]
        vars: Vec<String>,
    },
    Activate {
        id: u64,
    },
    Delete {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    List {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    Show {
        id: u64,
    },
    Delete {
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&cwd, p))
        .unwrap_or_else(|| cwd.clone());

    let mut settings = load_settings(&config_target).context("loading configuration")?;
    if let Some(data) = &cli.data {
        settings.data_file = resolve_relative(&cwd, data);
    }

    let store = Store::open(&settings.data_file)
        .with_context(|| format!("opening data file {}", settings.data_file.display()))?;

    match cli.command {
        Commands::Run(args) => run_command(&store, &settings, &cwd, args).await,
        Commands::Send { id, env, active } => {
            let selection = match (env, active) {
                (Some(env_id), _) => EnvSelection::Id(env_id),
                (None, true) => EnvSelection::Active,
                (None, false) => EnvSelection::None,
            };
            let result = execute_saved_request(&store, &settings, id, selection)
                .await
                .with_context(|| format!("running saved request {id}"))?;
            print_execution_result(&result);
            Ok(())
        }
        Commands::Request(command) => request_command(&store, &cwd, command),
        Commands::Collection(command) => collection_command(&store, command),
        Commands::Env(command) => env_command(&store, &cwd, command),
        Commands::History(command) => history_command(&store, &settings, command),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(store: &Store, settings: &Settings, cwd: &Path, args: RunArgs) -> Result<()> {
    let mut request = match &args.request {
        Some(path) => read_request_file(&resolve_relative(cwd, path))?,
        None => {
            let Some(url) = &args.url else {
                bail!("either a request file or --url is required");
            };
            ExecuteRequest {
                spec: RequestSpec::new("GET", url.clone()),
                env_id: None,
            }
        }
    };

    let spec = &mut request.spec;
    if let Some(method) = args.method {
        spec.method = method;
    }
    if let Some(url) = args.url {
        spec.url = url;
    }
    for header in &args.headers {
        let (name, value) = parse_pair(header, ':')?;
        spec.headers.insert(name, value);
    }
    for param in &args.params {
        let (name, value) = parse_pair(param, '=')?;
        spec.params.insert(name, value);
    }
    if let Some(json) = &args.json {
        spec.body_type = BodyType::Json;
        spec.body = Some(serde_json::from_str(json).context("parsing --json body")?);
    }
    if let Some(raw) = args.raw {
        spec.body_type = BodyType::Raw;
        spec.body = Some(Value::String(raw));
    }
    if let Some(status) = args.expect_status {
        spec.tests.push(AssertionSpec::status_code(status));
    }
    for key in args.expect_keys {
        spec.tests.push(AssertionSpec::json_key(key));
    }
    if args.env.is_some() {
        request.env_id = args.env;
    }

    let result = execute(store, settings, &request).await?;
    print_execution_result(&result);
    Ok(())
}

fn request_command(store: &Store, cwd: &Path, command: RequestCommand) -> Result<()> {
    match command {
        RequestCommand::List { collection } => {
            for request in store.list_requests(collection)? {
                let collection = request
                    .collection_id
                    .map(|id| format!("[{id}]"))
                    .unwrap_or_default();
                println!(
                    "{} {} {} {} {}",
                    format!("#{}", request.id).bold(),
                    request.name,
                    request.spec.method.to_ascii_uppercase().cyan(),
                    request.spec.url,
                    collection.dimmed()
                );
            }
        }
        RequestCommand::Show { id } => {
            let request = store.get_request(id)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        RequestCommand::Add {
            name,
            file,
            collection,
        } => {
            let parsed = read_request_file(&resolve_relative(cwd, &file))?;
            let saved = store.create_request(NewRequest {
                name,
                collection_id: collection,
                spec: parsed.spec,
            })?;
            println!("Saved request #{}", saved.id);
        }
        RequestCommand::Delete { id } => {
            store.delete_request(id)?;
            println!("Deleted request #{id}");
        }
    }
    Ok(())
}

fn collection_command(store: &Store, command: CollectionCommand) -> Result<()> {
    match command {
        CollectionCommand::List => {
            for collection in store.list_collections()? {
                println!(
                    "{} {} {}",
                    format!("#{}", collection.id).bold(),
                    collection.name,
                    collection.description.dimmed()
                );
            }
        }
        CollectionCommand::Add { name, description } => {
            let created = store.create_collection(NewCollection { name, description })?;
            println!("Created collection #{}", created.id);
        }
        CollectionCommand::Rename { id, name } => {
            store.update_collection(
                id,
                CollectionUpdate {
                    name: Some(name),
                    description: None,
                },
            )?;
            println!("Renamed collection #{id}");
        }
        CollectionCommand::Delete { id } => {
            store.delete_collection(id)?;
            println!("Deleted collection #{id}");
        }
    }
    Ok(())
}

fn env_command(store: &Store, cwd: &Path, command: EnvCommand) -> Result<()> {
    match command {
        EnvCommand::List => {
            for env in store.list_environments()? {
                let marker = if env.is_active { "*".green() } else { " ".normal() };
                println!(
                    "{} {} {} {}",
                    marker,
                    format!("#{}", env.id).bold(),
                    env.name,
                    env.base_url.dimmed()
                );
            }
        }
        EnvCommand::Show { id } => {
            let env = store.get_environment(id)?;
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        EnvCommand::Add {
            name,
            base_url,
            vars,
        } => {
            let variables = parse_vars(&vars)?;
            let created = store.create_environment(NewEnvironment {
                name,
                base_url,
                variables,
            })?;
            println!("Created environment #{}", created.id);
        }
        EnvCommand::Import {
            name,
            file,
            base_url,
        } => {
            let variables = load_env_file_sync(&resolve_relative(cwd, &file))?;
            let count = variables.len();
            let created = store.create_environment(NewEnvironment {
                name,
                base_url,
                variables,
            })?;
            println!(
                "Created environment #{} with {} variables",
                created.id, count
            );
        }
        EnvCommand::Set { id, vars } => {
            let mut variables = store.get_environment(id)?.variables;
            variables.extend(parse_vars(&vars)?);
            store.update_environment(
                id,
                EnvironmentUpdate {
                    variables: Some(variables),
                    ..Default::default()
                },
            )?;
            println!("Updated environment #{id}");
        }
        EnvCommand::Activate { id } => {
            let env = store.set_active(id)?;
            println!("Activated environment #{} ({})", env.id, env.name);
        }
        EnvCommand::Delete { id } => {
            store.delete_environment(id)?;
            println!("Deleted environment #{id}");
        }
    }
    Ok(())
}

fn history_command(store: &Store, settings: &Settings, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List { limit } => {
            let limit = limit.unwrap_or(settings.history_max_items);
            for entry in store.list_history()?.into_iter().take(limit) {
                let request = &entry.request_snapshot;
                let response = &entry.response_snapshot;
                println!(
                    "{} {} {} {} {}",
                    format!("#{}", entry.id).bold(),
                    request.method.cyan(),
                    request.url,
                    response.status_code,
                    format!(
                        "{} ms, {}/{} tests",
                        entry.duration_ms,
                        response.passed_tests(),
                        response.tests.len()
                    )
                    .dimmed()
                );
            }
        }
        HistoryCommand::Show { id } => {
            let entry = store.get_history(id)?;
            print_history_entry(&entry);
        }
        HistoryCommand::Delete { id } => {
            store.delete_history(id)?;
            println!("Deleted history #{id}");
        }
    }
    Ok(())
}

fn read_request_file(path: &Path) -> Result<ExecuteRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading request file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing request file {}", path.display()))
}

fn parse_pair(raw: &str, separator: char) -> Result<(String, String)> {
    match raw.split_once(separator) {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("expected NAME{separator}VALUE, got {raw:?}"),
    }
}

fn parse_vars(raw: &[String]) -> Result<EnvMap> {
    raw.iter().map(|pair| parse_pair(pair, '=')).collect()
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
