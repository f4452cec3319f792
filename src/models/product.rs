//! Product listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Message shown when a required listing field is blank
pub const REQUIRED_FIELDS_MESSAGE: &str = "Title, brand, and category are required.";

/// Server-assigned product identifier
///
/// The backend may hand ids out as text (uuid) or as integers (bigserial);
/// both are held as text and compared as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Borrow the id as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Integer(n) => Self(n.to_string()),
        })
    }
}

/// A product listing shown in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned id
    pub id: ProductId,
    /// Listing title
    pub title: String,
    /// Brand name
    pub brand: String,
    /// Free-form price text
    #[serde(default)]
    pub price: Option<String>,
    /// Outbound link
    #[serde(default)]
    pub url: Option<String>,
    /// Category name (e.g. "shoes")
    pub category: String,
    /// Public URL of the uploaded image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Account that created the listing
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Server-assigned creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether `user_id` owns this listing
    ///
    /// A listing without an owner belongs to nobody.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref().is_some_and(|owner| owner == user_id)
    }

    /// Price text, if one should be shown
    pub fn display_price(&self) -> Option<&str> {
        self.price.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Outbound link, if one is available
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Pre-filled form for editing this listing
    pub fn to_form(&self) -> ProductForm {
        ProductForm {
            title: self.title.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            price: self.price.clone().unwrap_or_default(),
            url: self.url.clone().unwrap_or_default(),
        }
    }
}

/// Fields for a new row; the server fills in `id` and `created_at`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    /// Listing title
    pub title: String,
    /// Brand name
    pub brand: String,
    /// Free-form price text (sent as null when absent)
    pub price: Option<String>,
    /// Outbound link (omitted when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Category name
    pub category: String,
    /// Public URL of the uploaded image
    pub image_url: Option<String>,
    /// Creator account id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl NewProduct {
    /// Reject rows whose required fields are blank
    pub fn validate(&self) -> Result<()> {
        if [&self.title, &self.brand, &self.category]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(Error::Invalid(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// Column changes sent when editing a listing
///
/// Blank optional fields are sent as explicit nulls so they get cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductChanges {
    /// Listing title
    pub title: String,
    /// Brand name
    pub brand: String,
    /// Category name
    pub category: String,
    /// Free-form price text
    pub price: Option<String>,
    /// Outbound link
    pub url: Option<String>,
}

/// Raw text fields as typed by a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    /// Title input
    pub title: String,
    /// Brand input
    pub brand: String,
    /// Category input
    pub category: String,
    /// Price input (optional)
    pub price: String,
    /// Link input (optional)
    pub url: String,
}

/// A form that passed validation: trimmed, blanks turned into `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
    /// Trimmed title
    pub title: String,
    /// Trimmed brand
    pub brand: String,
    /// Trimmed category
    pub category: String,
    /// Trimmed price, if any
    pub price: Option<String>,
    /// Trimmed link, if any
    pub url: Option<String>,
}

impl ProductForm {
    /// Trim every field and check the required ones
    pub fn validate(&self) -> Result<ValidForm> {
        let title = self.title.trim();
        let brand = self.brand.trim();
        let category = self.category.trim();

        if title.is_empty() || brand.is_empty() || category.is_empty() {
            return Err(Error::Invalid(REQUIRED_FIELDS_MESSAGE.to_string()));
        }

        Ok(ValidForm {
            title: title.to_string(),
            brand: brand.to_string(),
            category: category.to_string(),
            price: non_blank(&self.price),
            url: non_blank(&self.url),
        })
    }

    /// Set a field by name (`title`, `brand`, `category`, `price`, `url`)
    pub fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = match field.to_lowercase().as_str() {
            "title" => &mut self.title,
            "brand" => &mut self.brand,
            "category" => &mut self.category,
            "price" => &mut self.price,
            "url" | "link" => &mut self.url,
            other => return Err(Error::Invalid(format!("Unknown field: {other}"))),
        };
        *slot = value.to_string();
        Ok(())
    }
}

impl ValidForm {
    /// Row for inserting a new listing
    pub fn into_new_product(self, image_url: Option<String>, owner_id: Option<String>) -> NewProduct {
        NewProduct {
            title: self.title,
            brand: self.brand,
            price: self.price,
            url: self.url,
            category: self.category,
            image_url,
            owner_id,
        }
    }

    /// Column changes for updating a listing
    pub fn into_changes(self) -> ProductChanges {
        ProductChanges {
            title: self.title,
            brand: self.brand,
            category: self.category,
            price: self.price,
            url: self.url,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
