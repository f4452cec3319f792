//! # Penchant 🛍
//!
//! A storefront feed client for a Supabase backend.
//!
//! ## Overview
//!
//! Penchant lets you browse a shared product feed, like items, drill into
//! categories and brands, and upload new listings (image plus details) from
//! your terminal. Everything is stored in Supabase: rows in PostgREST,
//! images in Storage, accounts in GoTrue.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    App / CLI commands                       │
//! │   Parse input, run it against the store, print the result   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Actions     │ │      Store      │ │      Views      │
//! │                 │ │                 │ │                 │
//! │ • Upload        │ │ • Products      │ │ • Categories    │
//! │ • Edit (owner)  │ │ • Liked set     │ │ • Brands        │
//! │                 │ │ • Refresh/add   │ │ • Feed order    │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │
//!          └─────────┬─────────┘
//!                    ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │       API       │ │      Auth       │ │     Config      │
//! │                 │ │                 │ │                 │
//! │ • Supabase      │ │ • Sessions      │ │ • Load/Save     │
//! │ • In-memory     │ │ • Encrypted     │ │ • Env overrides │
//! │ • Backend trait │ │   on disk       │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`actions`]: Upload and edit workflows
//! - [`api`]: Backend traits, Supabase client, in-memory backend
//! - [`app`]: Interactive session and command execution
//! - [`auth`]: Encrypted session storage
//! - [`config`]: Configuration management
//! - [`models`]: Data models (Product, User, Session)
//! - [`store`]: Shared product store
//! - [`views`]: Derived views over a product list
//!
//! ## Example
//!
//! ```no_run
//! use penchant::{Config, ProductStore};
//! use penchant::api::memory::MemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let backend = MemoryBackend::demo(&config.products_table);
//!     let store = ProductStore::mount(backend, config.products_table.clone()).await;
//!     penchant::app::run(&store, &config).await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/penchant/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod actions;
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;
pub mod store;
pub mod views;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use models::{NewProduct, Product, ProductForm, ProductId, Session, User};
pub use store::{ProductStore, StoreState};

/// ASCII logo for the application
pub const LOGO: &str = r"
    ____                  __                __
   / __ \___  ____  _____/ /_  ____ _____  / /_
  / /_/ / _ \/ __ \/ ___/ __ \/ __ `/ __ \/ __/
 / ____/  __/ / / / /__/ / / / /_/ / / / / /_
/_/    \___/_/ /_/\___/_/ /_/\__,_/_/ /_/\__/
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
