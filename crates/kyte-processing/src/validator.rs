use kyte_core::{AppError, AssetSubmission, Config};

/// Validation errors for inbound submissions
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file too large")]
    FileTooLarge { size: usize, max: usize },

    #[error("unsupported media type")]
    UnsupportedMediaType { content_type: String },

    #[error("empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ValidationError::UnsupportedMediaType { .. } | ValidationError::EmptyFile => {
                AppError::ValidationRejected(err.to_string())
            }
        }
    }
}

/// Media file validator
///
/// Pure checks on the submission; runs before any provider call.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type; parameters are ignored and matching is case-insensitive.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &essence) {
            return Err(ValidationError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate size then media type
    pub fn validate(&self, submission: &AssetSubmission) -> Result<(), ValidationError> {
        self.validate_file_size(submission.byte_len())?;
        self.validate_content_type(&submission.content_type)?;
        Ok(())
    }
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self::new(
            10 * 1024 * 1024,
            ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}
