//! Remote data service clients
//!
//! The store and the upload/edit workflows only see these traits. Two
//! implementations exist: [`supabase::SupabaseClient`] talks to a hosted
//! backend over HTTP, [`memory::MemoryBackend`] keeps everything in process.

pub mod memory;
pub mod supabase;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::User;

/// Row ordering for a read-all query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort on
    pub column: String,
    /// Sort direction
    pub ascending: bool,
}

impl Order {
    /// Descending order on a column
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }

    /// `column.asc` / `column.desc`
    pub fn to_query(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Row storage
#[allow(async_fn_in_trait)]
pub trait TableApi {
    /// Read every row of a table in the given order
    async fn select_all<T: DeserializeOwned>(&self, table: &str, order: &Order) -> Result<Vec<T>>;

    /// Insert one row and return it as stored (server-assigned columns included)
    async fn insert<T: Serialize, R: DeserializeOwned>(&self, table: &str, row: &T) -> Result<R>;

    /// Apply column changes to the row with the given id
    async fn update<T: Serialize>(&self, table: &str, changes: &T, id: &str) -> Result<()>;
}

/// Object storage
#[allow(async_fn_in_trait)]
pub trait StorageApi {
    /// Store bytes at `path` in `bucket`; an existing object is an error
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Public URL for an object
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Authentication
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// The signed-in user, if any
    async fn current_user(&self) -> Result<Option<User>>;
}

/// Everything the store and its workflows need from a backend
pub trait Backend: TableApi + StorageApi + AuthApi {}

impl<T: TableApi + StorageApi + AuthApi> Backend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query() {
        assert_eq!(Order::desc("created_at").to_query(), "created_at.desc");
        let ascending = Order {
            column: "title".to_string(),
            ascending: true,
        };
        assert_eq!(ascending.to_query(), "title.asc");
    }
}
