pub mod upload_store;

pub use upload_store::{resolve_image, ImageRole, StorageError, StoredImage, UploadStore};
