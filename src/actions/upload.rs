//! Upload a new listing: image to storage, row to the products table

use std::path::Path;

use chrono::Utc;

use crate::api::Backend;
use crate::error::{Error, Result};
use crate::models::{Product, ProductForm};
use crate::store::ProductStore;

/// Folder inside the bucket that product images go to
pub const UPLOAD_FOLDER: &str = "products";

/// Extension used when nothing better is known
const FALLBACK_EXTENSION: &str = "jpg";

/// Picked image: where it came from and its bytes
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Local path or URI of the image (used for the extension)
    pub source: String,
    /// Image bytes
    pub bytes: Vec<u8>,
}

impl ImageSource {
    /// Read an image file from disk
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            source: path.display().to_string(),
            bytes,
        })
    }
}

/// Everything the upload form collects
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Picked image, if any
    pub image: Option<ImageSource>,
    /// Text fields
    pub form: ProductForm,
}

/// Where the uploaded image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Object path inside the bucket
    pub object_path: String,
    /// Public URL stored on the row
    pub image_url: String,
}

/// Upload the image, insert the row owned by the signed-in user, refresh
///
/// Checks run before anything is sent: an image must be picked, required
/// fields must be filled in, and someone must be signed in.
pub async fn upload_product<B: Backend>(
    store: &ProductStore<B>,
    bucket: &str,
    request: UploadRequest,
) -> Result<UploadOutcome> {
    let Some(image) = request.image else {
        return Err(Error::Invalid("Please pick an image first.".to_string()));
    };
    if image.bytes.is_empty() {
        return Err(Error::Image(format!("{} is empty", image.source)));
    }

    let form = request.form.validate()?;

    let backend = store.backend();
    let user = backend.current_user().await?.ok_or(Error::NotSignedIn)?;

    let ext = image_extension(&image.source, &image.bytes);
    let object_path = format!("{UPLOAD_FOLDER}/{}.{ext}", Utc::now().timestamp_millis());

    backend
        .upload(bucket, &object_path, image.bytes, &content_type_for(&ext))
        .await
        .inspect_err(|e| tracing::warn!("Upload failed: {e}"))?;

    let image_url = backend.public_url(bucket, &object_path);

    let row = form.into_new_product(Some(image_url.clone()), Some(user.id));
    let created: Product = backend
        .insert(store.table(), &row)
        .await
        .inspect_err(|e| tracing::warn!("Save error: {e}"))?;
    tracing::info!("Saved product {} with image {object_path}", created.id);

    store.refresh().await;

    Ok(UploadOutcome {
        object_path,
        image_url,
    })
}

/// File extension for an upload
///
/// Taken from the source name (query string dropped, lowercased, `jpeg`
/// spelled `jpg`); sniffed from the bytes when the name has none.
pub fn image_extension(source: &str, bytes: &[u8]) -> String {
    let without_query = source.split(['?', '#']).next().unwrap_or(source);
    let file_name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .or_else(|| sniff_extension(bytes))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    if ext == "jpeg" {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}

/// `image/jpeg` for `jpg`, otherwise `image/{ext}`
pub fn content_type_for(ext: &str) -> String {
    if ext == "jpg" {
        "image/jpeg".to_string()
    } else {
        format!("image/{ext}")
    }
}

fn sniff_extension(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    format.extensions_str().first().map(|ext| (*ext).to_string())
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;
    use crate::api::memory::MemoryBackend;
    use crate::models::User;
    use crate::store::PRODUCTS_TABLE;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn form() -> ProductForm {
        ProductForm {
            title: " Samba ".into(),
            brand: "Adidas".into(),
            category: "shoes".into(),
            price: "".into(),
            url: "".into(),
        }
    }

    fn request() -> UploadRequest {
        UploadRequest {
            image: Some(ImageSource {
                source: "file:///tmp/picked/IMG_0001.JPEG?size=full".into(),
                bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            }),
            form: form(),
        }
    }

    async fn signed_in_store() -> ProductStore<MemoryBackend> {
        let backend = MemoryBackend::new();
        backend.sign_in_as(User {
            id: "user-1".into(),
            email: None,
        });
        ProductStore::mount(backend, PRODUCTS_TABLE).await
    }

    #[test]
    fn test_extension_from_source() {
        assert_eq!(image_extension("photo.PNG", &[]), "png");
        assert_eq!(image_extension("IMG_1.jpeg?x=1", &[]), "jpg");
        assert_eq!(image_extension("/a.b/c/photo.webp", &[]), "webp");
    }

    #[test]
    fn test_extension_sniffed_or_defaulted() {
        assert_eq!(image_extension("/tmp/no-extension", PNG_MAGIC), "png");
        assert_eq!(image_extension("/tmp.d/no-extension", b"not an image"), "jpg");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("png"), "image/png");
    }

    #[tokio::test]
    async fn test_upload_stores_image_and_row() {
        let store = signed_in_store().await;

        let outcome = upload_product(&store, "products", request()).await.unwrap();

        assert!(outcome.object_path.starts_with("products/"));
        assert!(outcome.object_path.ends_with(".jpg"));
        let object = store.backend().object("products", &outcome.object_path).unwrap();
        assert_eq!(object.content_type, "image/jpeg");

        let products = store.products();
        assert_eq!(products.len(), 1);
        let saved = &products[0];
        assert_eq!(saved.title, "Samba");
        assert_eq!(saved.owner_id.as_deref(), Some("user-1"));
        assert_eq!(saved.image_url.as_deref(), Some(outcome.image_url.as_str()));
        assert_eq!(saved.price, None);
        assert_eq!(saved.url, None);
    }

    #[tokio::test]
    async fn test_upload_requires_image() {
        let store = signed_in_store().await;
        let request = UploadRequest {
            image: None,
            form: form(),
        };

        let err = assert_err!(upload_product(&store, "products", request).await);
        assert_eq!(err.to_string(), "Please pick an image first.");
        assert_eq!(store.backend().write_attempts(), 0);
    }

    #[tokio::test]
    async fn test_upload_requires_fields() {
        let store = signed_in_store().await;
        let mut request = request();
        request.form.brand = "  ".into();

        let err = assert_err!(upload_product(&store, "products", request).await);
        assert!(err.is_validation());
        assert_eq!(store.backend().write_attempts(), 0);
    }

    #[tokio::test]
    async fn test_upload_requires_sign_in() {
        let store = signed_in_store().await;
        store.backend().sign_out();

        let err = assert_err!(upload_product(&store, "products", request()).await);
        assert!(matches!(err, Error::NotSignedIn));
        assert_eq!(store.backend().write_attempts(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_insert() {
        let store = signed_in_store().await;
        store.backend().fail_writes(Some("Bucket not found"));

        let err = assert_err!(upload_product(&store, "products", request()).await);
        assert_eq!(err.to_string(), "Bucket not found");
        assert_eq!(store.backend().write_attempts(), 1);
        assert!(store.backend().rows(PRODUCTS_TABLE).is_empty());
    }
}
