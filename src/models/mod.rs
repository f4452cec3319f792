//! Data models for Penchant

mod product;
mod user;

pub use product::{
    NewProduct, Product, ProductChanges, ProductForm, ProductId, REQUIRED_FIELDS_MESSAGE,
    ValidForm,
};
pub use user::{Session, User};
