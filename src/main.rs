//! Penchant - A storefront feed client for Supabase
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use penchant::api::AuthApi;
use penchant::api::supabase::SupabaseClient;
use penchant::auth::{CredentialStore, restore_session};
use penchant::{Config, ProductStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    match parse_args()? {
        Command::Run => run_session().await,
        Command::Demo => run_demo().await,
        Command::Config { url, anon_key } => configure(url, anon_key),
        Command::Store { args, limit } => store_cli(&args, limit).await,
        Command::Login { email } => login(email).await,
        Command::Logout => logout().await,
        Command::WhoAmI => whoami().await,
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run,
    Demo,
    Config {
        url: String,
        anon_key: String,
    },
    /// One-shot store command (feed, show, upload, ...)
    Store {
        args: Vec<String>,
        limit: Option<usize>,
    },
    Login {
        email: Option<String>,
    },
    Logout,
    WhoAmI,
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

fn parse_args_from(args: &[String]) -> Result<Command> {
    if args.len() == 1 {
        return Ok(Command::Run);
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "--demo" | "demo" => Ok(Command::Demo),

        "config" => match (args.get(2), args.get(3)) {
            (Some(url), Some(anon_key)) => Ok(Command::Config {
                url: url.clone(),
                anon_key: anon_key.clone(),
            }),
            _ => Err(anyhow::anyhow!(
                "Usage: penchant config <supabase-url> <anon-key>"
            )),
        },

        "feed" => {
            let limit = match args.iter().position(|a| a == "--limit" || a == "-l") {
                Some(i) => {
                    let value = args
                        .get(i + 1)
                        .ok_or_else(|| anyhow::anyhow!("Missing value for --limit"))?;
                    Some(value.parse().context("--limit expects a number")?)
                }
                None => None,
            };
            Ok(Command::Store {
                args: vec!["feed".to_string()],
                limit,
            })
        }

        "categories" | "brands" | "products" | "show" | "open" | "upload" | "edit" => {
            Ok(Command::Store {
                args: args[1..].to_vec(),
                limit: None,
            })
        }

        "login" => Ok(Command::Login {
            email: args.get(2).cloned(),
        }),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'penchant --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = penchant::Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
🛍  Penchant - A storefront feed client

USAGE:
    penchant                           Start an interactive session
    penchant [COMMAND]

COMMANDS:
    demo                               Interactive session over sample data
    config <url> <anon-key>            Save the Supabase project to the config file
    feed [OPTIONS]                     Show the feed, newest first
      Options:
        -l, --limit <n>                Number of products (default: config feed_limit)
    categories                         List categories
    brands [category]                  List brands (default: config default_category)
    products [category] [brand]        List products, optionally filtered
    show <id>                          Show product details
    open <id>                          Open the product link in your browser
    upload <image> [FIELDS]            Upload a new product
    edit <id> [FIELDS]                 Edit a product you own
      Fields:
        title=<text>  brand=<text>  category=<text>  price=<text>  url=<link>
        (--title <text> works too; an empty value clears price or url)
      Examples:
        penchant upload samba.jpg title="Samba OG" brand=Adidas price='$100'
        penchant edit 42 --price '$90'

    login [email]                      Sign in with email and password
    logout                             Sign out
    whoami                             Show the signed-in user

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

ENVIRONMENT:
    {}              Supabase project URL
    {}         Supabase anon key
    RUST_LOG                           Log filter (default: warn)

CONFIG:
    {}
"#,
        penchant::LOGO,
        penchant::config::URL_ENV,
        penchant::config::ANON_KEY_ENV,
        config_path
    );
}

fn print_version() {
    println!("penchant {}", penchant::VERSION);
}

async fn run_session() -> Result<()> {
    let (config, store) = connect().await?;
    penchant::app::run(&store, &config).await
}

async fn run_demo() -> Result<()> {
    let config = Config::load()?;
    penchant::app::run_demo(&config).await
}

fn configure(url: String, anon_key: String) -> Result<()> {
    let path = Config::default_path()?;
    let mut config = Config::load_from(&path)?;
    config.supabase_url = Some(url);
    config.supabase_anon_key = Some(anon_key);
    config.save()?;

    println!("✓ Saved {}", path.display());
    Ok(())
}

async fn store_cli(args: &[String], limit: Option<usize>) -> Result<()> {
    let (mut config, store) = connect().await?;
    if let Some(limit) = limit {
        config.feed_limit = limit;
    }

    let command =
        penchant::app::from_tokens(args, &config.default_category).map_err(anyhow::Error::msg)?;
    if command.reads_snapshot() {
        if let Some(error) = store.error() {
            return Err(anyhow::anyhow!("Could not load products: {error}"));
        }
    }

    let output = penchant::app::execute(&store, &config, command).await?;
    println!("{output}");
    Ok(())
}

/// Load config, restore the saved session and run the initial load
async fn connect() -> Result<(Config, ProductStore<SupabaseClient>)> {
    let config = Config::load()?;
    let client = client(&config).await?;
    let store = ProductStore::mount(client, config.products_table.clone()).await;
    Ok((config, store))
}

/// Client for the configured project, signed in when a session is saved
async fn client(config: &Config) -> Result<SupabaseClient> {
    let backend = config.backend()?;
    let client = SupabaseClient::new(&backend.url, &backend.anon_key);
    let credentials = CredentialStore::open()?;

    let session = {
        let client = &client;
        restore_session(&credentials, &backend.url, move |token| async move {
            client.refresh_session(&token).await
        })
        .await?
    };

    Ok(match session {
        Some(session) => client.with_session(session),
        None => client,
    })
}

async fn login(email: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let backend = config.backend()?;

    let email = match email {
        Some(email) => email,
        None => {
            println!("Email:");
            read_line()?
        }
    };
    println!("Password:");
    let password = read_line()?;

    println!("🔑 Signing in to {}...", backend.url);
    let client = SupabaseClient::new(&backend.url, &backend.anon_key);
    let session = client.sign_in_with_password(&email, &password).await?;

    CredentialStore::open()?.save_session(&backend.url, &session)?;

    println!("\n✓ Logged in as {}", session.user.label());
    println!("✓ Session saved");
    Ok(())
}

async fn logout() -> Result<()> {
    let config = Config::load()?;
    let backend = config.backend()?;
    let credentials = CredentialStore::open()?;

    let Some(session) = credentials.load_session(&backend.url).unwrap_or_default() else {
        println!("Not signed in.");
        return Ok(());
    };

    let client = SupabaseClient::new(&backend.url, &backend.anon_key).with_session(session);
    if let Err(e) = client.sign_out().await {
        // The local session goes away regardless
        tracing::warn!("Server sign out failed: {e}");
    }
    credentials.remove_session(&backend.url)?;

    println!("✓ Logged out");
    Ok(())
}

async fn whoami() -> Result<()> {
    let config = Config::load()?;
    let client = client(&config).await?;

    match client.current_user().await? {
        Some(user) => println!("Signed in as {} ({})", user.label(), user.id),
        None => {
            println!("Not signed in.");
            println!("\nSign in with:");
            println!("  penchant login <email>");
        }
    }
    Ok(())
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
