//! In-process backend
//!
//! Behaves like the hosted service as far as the store can tell: the server
//! assigns ids and strictly increasing `created_at` values, reads honor the
//! requested ordering (nulls sort as the largest value), uploads never
//! overwrite. Failures can be injected for reads and writes separately.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::models::User;

use super::{AuthApi, Order, StorageApi, TableApi};

const BASE_URL: &str = "memory://penchant";

type Row = Map<String, Value>;

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes
    pub bytes: Vec<u8>,
    /// Content type given at upload
    pub content_type: String,
}

#[derive(Debug, Default)]
struct Failures {
    reads: Option<String>,
    writes: Option<String>,
}

/// In-memory rows, objects and auth
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    user: Mutex<Option<User>>,
    failures: Mutex<Failures>,
    clock: Mutex<DateTime<Utc>>,
    next_id: AtomicUsize,
    write_attempts: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty backend with nobody signed in
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            user: Mutex::new(None),
            failures: Mutex::new(Failures::default()),
            clock: Mutex::new(Utc::now()),
            next_id: AtomicUsize::new(1),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// Backend seeded with a small catalog and a signed-in demo user
    pub fn demo(table: &str) -> Self {
        let backend = Self::new();
        backend.sign_in_as(User {
            id: "demo-user".to_string(),
            email: Some("demo@penchant.app".to_string()),
        });

        let catalog = [
            ("Samba OG", "Adidas", "shoes", Some("$100"), "demo-user"),
            ("Puzzle Bag", "Loewe", "bags", Some("$3,200"), "someone-else"),
            ("Air Force 1", "Nike", "shoes", Some("$115"), "someone-else"),
            ("Gazelle", "Adidas", "shoes", None, "demo-user"),
            ("Le Bambino", "Jacquemus", "bags", Some("$690"), "someone-else"),
            ("990v6", "New Balance", "shoes", Some("$200"), "someone-else"),
        ];

        for (title, brand, category, price, owner) in catalog {
            let row = json!({
                "title": title,
                "brand": brand,
                "category": category,
                "price": price,
                "url": format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
                "image_url": null,
                "owner_id": owner,
            });
            if let Value::Object(row) = row {
                backend.store_row(table, row);
            }
        }

        backend
    }

    /// Put rows in a table exactly as given (no server-assigned columns)
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.lock();
        let stored = tables.entry(table.to_string()).or_default();
        stored.extend(rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Make `current_user` report this user
    pub fn sign_in_as(&self, user: User) {
        *self.user.lock() = Some(user);
    }

    /// Make `current_user` report nobody
    pub fn sign_out(&self) {
        *self.user.lock() = None;
    }

    /// Fail every read with this message (`None` to stop failing)
    pub fn fail_reads(&self, message: Option<&str>) {
        self.failures.lock().reads = message.map(str::to_string);
    }

    /// Fail every write with this message (`None` to stop failing)
    pub fn fail_writes(&self, message: Option<&str>) {
        self.failures.lock().writes = message.map(str::to_string);
    }

    /// Number of insert, update and upload calls received
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(AtomicOrdering::SeqCst)
    }

    /// Raw rows of a table in storage order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// A stored object, if present
    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    fn check_reads(&self) -> Result<()> {
        match &self.failures.lock().reads {
            Some(message) => Err(Error::service(Some(503), message.clone())),
            None => Ok(()),
        }
    }

    fn check_writes(&self) -> Result<()> {
        self.write_attempts.fetch_add(1, AtomicOrdering::SeqCst);
        match &self.failures.lock().writes {
            Some(message) => Err(Error::service(Some(400), message.clone())),
            None => Ok(()),
        }
    }

    /// Assign id and creation time, then store
    fn store_row(&self, table: &str, mut row: Row) -> Row {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let created_at = {
            let mut clock = self.clock.lock();
            *clock = (*clock + Duration::milliseconds(1)).max(Utc::now());
            clock.to_rfc3339_opts(SecondsFormat::Micros, false)
        };

        row.insert("id".to_string(), json!(id));
        row.insert("created_at".to_string(), json!(created_at));

        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }
}

impl TableApi for MemoryBackend {
    async fn select_all<T: DeserializeOwned>(&self, table: &str, order: &Order) -> Result<Vec<T>> {
        self.check_reads()?;

        let mut rows = self.tables.lock().get(table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(&order.column), b.get(&order.column));
            if order.ascending { ord } else { ord.reverse() }
        });

        rows.into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(Error::from))
            .collect()
    }

    async fn insert<T: Serialize, R: DeserializeOwned>(&self, table: &str, row: &T) -> Result<R> {
        self.check_writes()?;

        let Value::Object(row) = serde_json::to_value(row)? else {
            return Err(Error::service(Some(400), "Row must be a JSON object"));
        };

        let stored = self.store_row(table, row);
        tracing::debug!("Inserted row into {table}");
        Ok(serde_json::from_value(Value::Object(stored))?)
    }

    async fn update<T: Serialize>(&self, table: &str, changes: &T, id: &str) -> Result<()> {
        self.check_writes()?;

        let Value::Object(changes) = serde_json::to_value(changes)? else {
            return Err(Error::service(Some(400), "Changes must be a JSON object"));
        };

        let mut tables = self.tables.lock();
        // No matching row is not an error, same as a filtered PATCH
        if let Some(row) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| id_text(r.get("id")).as_deref() == Some(id)))
        {
            row.extend(changes);
        }
        Ok(())
    }
}

impl StorageApi for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.check_writes()?;

        let mut objects = self.objects.lock();
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(Error::service(Some(409), "The resource already exists"));
        }

        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{BASE_URL}/storage/v1/object/public/{bucket}/{path}")
    }
}

impl AuthApi for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>> {
        Ok(self.user.lock().clone())
    }
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Column ordering; missing and null values sort after everything else
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProduct, Product};

    fn new_product(title: &str) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            brand: "Brand".to_string(),
            category: "shoes".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_inserts_come_back_newest_first() {
        let backend = MemoryBackend::new();
        for title in ["first", "second", "third"] {
            let _: Product = backend.insert("products", &new_product(title)).await.unwrap();
        }

        let rows: Vec<Product> = backend
            .select_all("products", &Order::desc("created_at"))
            .await
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
        assert!(rows[0].created_at > rows[1].created_at);
    }

    #[tokio::test]
    async fn test_update_merges_columns() {
        let backend = MemoryBackend::new();
        let created: Product = backend.insert("products", &new_product("old")).await.unwrap();

        backend
            .update("products", &json!({"title": "new", "price": null}), created.id.as_str())
            .await
            .unwrap();

        let rows = backend.rows("products");
        assert_eq!(rows[0]["title"], "new");
        assert_eq!(rows[0]["brand"], "Brand");
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let backend = MemoryBackend::new();
        backend
            .upload("products", "products/1.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        let err = backend
            .upload("products", "products/1.jpg", vec![4], "image/jpeg")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The resource already exists");
        assert_eq!(backend.object("products", "products/1.jpg").unwrap().bytes, [1, 2, 3]);
        assert_eq!(backend.write_attempts(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = MemoryBackend::new();
        backend.fail_reads(Some("offline"));
        let err = backend
            .select_all::<Product>("products", &Order::desc("created_at"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "offline");

        backend.fail_reads(None);
        let rows: Vec<Product> = backend
            .select_all("products", &Order::desc("created_at"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_nulls_sort_last_ascending() {
        let one = json!(1);
        let two = json!(2);
        let null = Value::Null;
        assert_eq!(compare_values(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_values(Some(&null), Some(&one)), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&null)), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_demo_catalog() {
        let backend = MemoryBackend::demo("products");
        let rows: Vec<Product> = backend
            .select_all("products", &Order::desc("created_at"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows.last().unwrap().title, "Samba OG");
        assert!(backend.current_user().await.unwrap().is_some());
    }
}
