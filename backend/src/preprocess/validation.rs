pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Both images are required")]
    MissingFile,
    #[error("No selected files")]
    EmptyFilename,
    #[error("Invalid file types. Please use jpg, jpeg, png, or gif.")]
    DisallowedExtension,
    #[error("Filename {0:?} contains no usable characters")]
    UnusableFilename(String),
    #[error("File too large. Maximum size is {max_mib}MB.")]
    FileTooLarge { max_mib: usize },
}

/// Text after the last `.`, as written. `".png"` yields `"png"`.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Reduces a user-supplied filename to a flat ASCII name safe to join onto
/// the upload directory. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// `received` is the running byte count of the whole upload.
pub fn validate_upload_size(received: usize, max_bytes: usize) -> Result<(), ValidationError> {
    if received > max_bytes {
        return Err(ValidationError::FileTooLarge {
            max_mib: max_bytes / (1024 * 1024),
        });
    }
    Ok(())
}

/// Checks one upload's filename and returns its sanitized form. Empty names
/// are the caller's concern; they fail here as a disallowed extension.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if !allowed_file(filename) {
        return Err(ValidationError::DisallowedExtension);
    }
    let sanitized = secure_filename(filename);
    if sanitized.is_empty() || !allowed_file(&sanitized) {
        return Err(ValidationError::UnusableFilename(filename.to_string()));
    }
    Ok(sanitized)
}
