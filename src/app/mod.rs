//! Interactive shopping session
//!
//! One [`ProductStore`] lives for the whole session. Each input line is
//! parsed into a [`Command`] and run by [`execute`], which the one-shot CLI
//! commands share.

mod commands;
mod render;

pub use commands::{Command, from_tokens, parse};

use std::io::Write as _;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::actions::{ImageSource, UploadRequest, edit_product, upload_product};
use crate::api::Backend;
use crate::api::memory::MemoryBackend;
use crate::config::Config;
use crate::error::Error;
use crate::store::ProductStore;

const PROMPT: &str = "penchant> ";

/// Run the session until `quit` or end of input
pub async fn run<B: Backend>(store: &ProductStore<B>, config: &Config) -> Result<()> {
    println!("{}", crate::LOGO);
    println!("{}", render::status(&store.snapshot()));
    println!("Type 'help' for commands, 'quit' to leave.\n");

    let mut updates = store.subscribe();
    updates.mark_unchanged();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let command = match parse(&line, &config.default_category) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("❌ {message}");
                continue;
            }
        };

        match execute(store, config, command).await {
            Ok(output) if !output.is_empty() => println!("{output}"),
            Ok(_) => {}
            Err(e) => println!("❌ {e:#}"),
        }

        // Loads and inserts change the snapshot; likes only touch the set
        if updates.has_changed().unwrap_or(false) {
            let state = updates.borrow_and_update().clone();
            tracing::debug!("Store changed: {}", render::status(&state));
        }
    }

    Ok(())
}

/// Run the session over an in-memory catalog
pub async fn run_demo(config: &Config) -> Result<()> {
    let backend = MemoryBackend::demo(&config.products_table);
    let store = ProductStore::mount(backend, config.products_table.clone()).await;
    println!("Demo mode | nothing leaves this machine");
    run(&store, config).await
}

/// Run one command against the store and return what to print
pub async fn execute<B: Backend>(
    store: &ProductStore<B>,
    config: &Config,
    command: Command,
) -> Result<String> {
    match command {
        Command::Feed => Ok(render::feed(&store.snapshot(), config.feed_limit)),

        Command::Like(id) => {
            let liked = store.toggle_like(&id);
            let title = store.find(&id).map(|p| format!(" {}", p.title)).unwrap_or_default();
            Ok(if liked {
                format!("{} Liked{title}", render::LIKED)
            } else {
                format!("{} Unliked{title}", render::NOT_LIKED)
            })
        }

        Command::Show(id) => {
            let product = store.find(&id).ok_or(Error::NotFound(id.clone()))?;
            Ok(render::detail(&product, store.is_liked(&id)))
        }

        Command::Open(id) => {
            let product = store.find(&id).ok_or(Error::NotFound(id))?;
            match product.link() {
                Some(link) => {
                    open::that(link).with_context(|| format!("Failed to open {link}"))?;
                    Ok(format!("🔗 Opened {link}"))
                }
                None => Ok("No link available".to_string()),
            }
        }

        Command::Categories => Ok(render::categories(&store.snapshot())),

        Command::Brands(category) => {
            let category = category.as_deref().unwrap_or(&config.default_category);
            Ok(render::brands(&store.snapshot(), category))
        }

        Command::Products { category, brand } => Ok(render::products(
            &store.snapshot(),
            category.as_deref(),
            brand.as_deref(),
        )),

        Command::Refresh => {
            store.refresh().await;
            match store.error() {
                Some(error) => Err(anyhow::anyhow!("Could not load products: {error}")),
                None => Ok(format!("✓ Loaded {} products", store.products().len())),
            }
        }

        Command::Upload { image, form } => {
            let image = ImageSource::read(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let request = UploadRequest {
                image: Some(image),
                form,
            };
            let outcome = upload_product(store, &config.storage_bucket, request).await?;
            Ok(format!("✓ Product saved!\n  Image: {}", outcome.image_url))
        }

        Command::Edit { id, fields } => {
            let product = store.find(&id).ok_or(Error::NotFound(id.clone()))?;
            let mut form = product.to_form();
            for (field, value) in &fields {
                form.set(field, value)?;
            }
            edit_product(store, &id, &form).await?;
            Ok(format!("✓ Saved {}", form.title.trim()))
        }

        Command::WhoAmI => Ok(match store.backend().current_user().await? {
            Some(user) => format!("Signed in as {} ({})", user.label(), user.id),
            None => "Not signed in. Run: penchant login <email>".to_string(),
        }),

        Command::Help => Ok(session_help()),

        Command::Quit => Ok(String::new()),
    }
}

/// Commands available inside the session
pub fn session_help() -> String {
    r#"COMMANDS:
    feed                               Show the feed (liked first)
    like <id>                          Like or unlike a product
    show <id>                          Show product details
    open <id>                          Open the product link in your browser
    categories                         List categories
    brands [category]                  List brands in a category
    products [category] [brand]        List products, optionally filtered
    refresh                            Reload products
    upload <image> key=value...        Upload a new product
      Fields: title, brand, category, price, url
      Example:
        upload samba.jpg title="Samba OG" brand=Adidas price=$100
    edit <id> key=value...             Edit a product you own
      Example:
        edit 42 price="$90" url=
    whoami                             Show the signed-in user
    help                               Show this help
    quit                               Leave"#
        .to_string()
}
