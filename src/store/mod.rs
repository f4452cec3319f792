//! Shared product store
//!
//! One store per session owns the product list and the liked set. Front ends
//! read snapshots (or subscribe to them) and change state only through
//! [`ProductStore::refresh`], [`ProductStore::add_product`] and
//! [`ProductStore::toggle_like`].
//!
//! State lives in a watch channel and is modified between awaits, never
//! across one, so overlapping operations interleave freely: whichever
//! `refresh` response arrives last wins.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{Backend, Order};
use crate::error::Result;
use crate::models::{NewProduct, Product, ProductId};

/// Default products table
pub const PRODUCTS_TABLE: &str = "products";

/// Column the feed is ordered by (newest first)
pub const ORDER_COLUMN: &str = "created_at";

/// Snapshot of the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Products in remote order (newest first after a refresh)
    pub products: Arc<Vec<Product>>,
    /// Ids liked during this session
    pub liked_ids: HashSet<ProductId>,
    /// Whether a load is in flight
    pub loading: bool,
    /// Message of the last failed load
    pub error: Option<String>,
}

impl StoreState {
    /// Whether an id is in the liked set
    pub fn is_liked(&self, id: &ProductId) -> bool {
        self.liked_ids.contains(id)
    }

    /// Product with this id
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }
}

/// Product list and liked set shared by every front end
pub struct ProductStore<B> {
    backend: B,
    table: String,
    state: watch::Sender<StoreState>,
}

impl<B: Backend> ProductStore<B> {
    /// Create a store without loading anything yet
    ///
    /// `loading` starts out true: nothing has been loaded.
    pub fn new(backend: B, table: impl Into<String>) -> Self {
        let (state, _) = watch::channel(StoreState {
            loading: true,
            ..StoreState::default()
        });

        Self {
            backend,
            table: table.into(),
            state,
        }
    }

    /// Create a store and run the initial load
    ///
    /// A failed load is recorded in the state, not returned.
    pub async fn mount(backend: B, table: impl Into<String>) -> Self {
        let store = Self::new(backend, table);
        store.refresh().await;
        store
    }

    /// The backend, for workflows that write directly
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Table the products are read from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Reload every product, newest first
    ///
    /// Success replaces the list wholesale. Failure keeps the current list
    /// and records the message in `error`.
    pub async fn refresh(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self
            .backend
            .select_all::<Product>(&self.table, &Order::desc(ORDER_COLUMN))
            .await;

        match result {
            Ok(products) => {
                tracing::debug!("Loaded {} products", products.len());
                self.state.send_modify(|s| {
                    s.products = Arc::new(products);
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!("Error loading products: {e}");
                self.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                });
            }
        }
    }

    /// Flip an id in the liked set and return whether it is now liked
    ///
    /// The id does not have to belong to a loaded product.
    pub fn toggle_like(&self, id: &ProductId) -> bool {
        let mut liked = false;
        self.state.send_modify(|s| {
            liked = if s.liked_ids.remove(id) {
                false
            } else {
                s.liked_ids.insert(id.clone());
                true
            };
        });
        liked
    }

    /// Insert a product remotely and put the stored row at the front
    ///
    /// Failures are returned to the caller and leave the list untouched.
    pub async fn add_product(&self, input: NewProduct) -> Result<Product> {
        input.validate()?;

        let created: Product = self
            .backend
            .insert(&self.table, &input)
            .await
            .inspect_err(|e| tracing::warn!("Error adding product: {e}"))?;

        tracing::info!("Added product {} ({})", created.id, created.title);
        self.state.send_modify(|s| {
            let products = Arc::make_mut(&mut s.products);
            // A refresh that finished first may already hold the row
            products.retain(|p| p.id != created.id);
            products.insert(0, created.clone());
        });

        Ok(created)
    }

    /// Current state
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Current products
    pub fn products(&self) -> Arc<Vec<Product>> {
        Arc::clone(&self.state.borrow().products)
    }

    /// Product with this id in the current list
    pub fn find(&self, id: &ProductId) -> Option<Product> {
        self.state.borrow().find(id).cloned()
    }

    /// Whether an id is liked
    pub fn is_liked(&self, id: &ProductId) -> bool {
        self.state.borrow().is_liked(id)
    }

    /// Whether a load is in flight
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Message of the last failed load
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Receive every state change from now on
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }
}
