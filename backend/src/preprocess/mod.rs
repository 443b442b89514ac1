pub mod resize;
pub mod validation;

pub use resize::{resize_if_needed, ResizeOutcome, DEFAULT_MAX_DIMENSIONS};
pub use validation::{allowed_file, secure_filename, validate_filename, validate_upload_size, ValidationError};
