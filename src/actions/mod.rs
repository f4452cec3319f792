//! Listing workflows that write to the backend directly
//!
//! Both workflows finish by refreshing the store so every reader sees the
//! server's version of the change.

mod edit;
mod upload;

pub use edit::{authorize_edit, edit_product};
pub use upload::{
    ImageSource, UPLOAD_FOLDER, UploadOutcome, UploadRequest, content_type_for, image_extension,
    upload_product,
};
