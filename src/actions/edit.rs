//! Edit an existing listing (owner only)

use crate::api::Backend;
use crate::error::{Error, Result};
use crate::models::{Product, ProductForm, ProductId, User};
use crate::store::ProductStore;

/// Find the product and make sure the signed-in user owns it
///
/// Only a client-side courtesy check; the backend enforces the real rule.
pub async fn authorize_edit<B: Backend>(
    store: &ProductStore<B>,
    id: &ProductId,
) -> Result<(Product, User)> {
    let product = store.find(id).ok_or_else(|| Error::NotFound(id.clone()))?;
    let user = store
        .backend()
        .current_user()
        .await?
        .ok_or(Error::NotSignedIn)?;

    if !product.is_owned_by(&user.id) {
        tracing::debug!("{} does not own product {id}", user.id);
        return Err(Error::NotOwner);
    }

    Ok((product, user))
}

/// Save form changes to a listing the signed-in user owns, then refresh
pub async fn edit_product<B: Backend>(
    store: &ProductStore<B>,
    id: &ProductId,
    form: &ProductForm,
) -> Result<()> {
    authorize_edit(store, id).await?;

    let changes = form.validate()?.into_changes();

    store
        .backend()
        .update(store.table(), &changes, id.as_str())
        .await
        .inspect_err(|e| tracing::warn!("Update failed: {e}"))?;
    tracing::info!("Updated product {id}");

    store.refresh().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::api::memory::MemoryBackend;
    use crate::store::PRODUCTS_TABLE;

    async fn store() -> ProductStore<MemoryBackend> {
        let backend = MemoryBackend::new();
        backend.seed(
            PRODUCTS_TABLE,
            [
                json!({"id": 1, "title": "Samba", "brand": "Adidas", "category": "shoes",
                       "price": "$100", "url": "https://example.com/samba",
                       "owner_id": "user-1", "created_at": "2025-01-02T00:00:00+00:00"}),
                json!({"id": 2, "title": "Tote", "brand": "Loewe", "category": "bags",
                       "owner_id": "user-2", "created_at": "2025-01-01T00:00:00+00:00"}),
                json!({"id": 3, "title": "Legacy", "brand": "Nike", "category": "shoes",
                       "created_at": "2024-12-01T00:00:00+00:00"}),
            ],
        );
        backend.sign_in_as(User {
            id: "user-1".into(),
            email: None,
        });
        ProductStore::mount(backend, PRODUCTS_TABLE).await
    }

    #[tokio::test]
    async fn test_owner_can_edit() {
        let store = store().await;
        let id = ProductId::from("1");
        let mut form = store.find(&id).unwrap().to_form();
        form.title = "Samba OG ".into();
        form.price = String::new();

        assert_ok!(edit_product(&store, &id, &form).await);

        let product = store.find(&id).unwrap();
        assert_eq!(product.title, "Samba OG");
        assert_eq!(product.price, None);
        assert_eq!(product.url.as_deref(), Some("https://example.com/samba"));
    }

    #[tokio::test]
    async fn test_other_users_product_is_refused_without_request() {
        let store = store().await;
        let id = ProductId::from("2");
        let form = store.find(&id).unwrap().to_form();

        let err = assert_err!(edit_product(&store, &id, &form).await);
        assert!(matches!(err, Error::NotOwner));
        assert_eq!(store.backend().write_attempts(), 0);
    }

    #[tokio::test]
    async fn test_ownerless_product_is_refused() {
        let store = store().await;
        let id = ProductId::from("3");

        let err = assert_err!(authorize_edit(&store, &id).await);
        assert!(err.is_authorization());
    }

    #[tokio::test]
    async fn test_signed_out_user_is_refused() {
        let store = store().await;
        store.backend().sign_out();

        let err = assert_err!(authorize_edit(&store, &ProductId::from("1")).await);
        assert!(matches!(err, Error::NotSignedIn));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let store = store().await;
        let err = assert_err!(authorize_edit(&store, &ProductId::from("99")).await);
        assert_eq!(err.to_string(), "Product not found: 99");
    }

    #[tokio::test]
    async fn test_update_failure_leaves_store_alone() {
        let store = store().await;
        let id = ProductId::from("1");
        let before = store.products();
        store.backend().fail_writes(Some("permission denied for table products"));

        let err = assert_err!(edit_product(&store, &id, &store.find(&id).unwrap().to_form()).await);
        assert_eq!(err.to_string(), "permission denied for table products");
        assert_eq!(*store.products(), *before);
    }
}
