use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::asset::{AbsentReason, DerivedAsset, StoredAsset};
use crate::error::{AppError, ErrorMetadata};

/// Terminal value of one pipeline run.
#[derive(Debug)]
pub enum PipelineResult {
    Stored {
        stored: StoredAsset,
        derived: DerivedAsset,
    },
    Failed(AppError),
}

impl PipelineResult {
    pub fn is_stored(&self) -> bool {
        matches!(self, PipelineResult::Stored { .. })
    }

    pub fn stored(&self) -> Option<&StoredAsset> {
        match self {
            PipelineResult::Stored { stored, .. } => Some(stored),
            PipelineResult::Failed(_) => None,
        }
    }

    pub fn derived(&self) -> Option<&DerivedAsset> {
        match self {
            PipelineResult::Stored { derived, .. } => Some(derived),
            PipelineResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            PipelineResult::Failed(err) => Some(err),
            PipelineResult::Stored { .. } => None,
        }
    }

    /// Caller-facing shape: an image URL (plus placeholder for avatars) or a
    /// single error message, never both.
    pub fn to_response(&self) -> UploadResponse {
        match self {
            PipelineResult::Stored { stored, derived } => UploadResponse {
                image_url: Some(stored.public_url().to_string()),
                blurpfp: match derived {
                    DerivedAsset::Absent(AbsentReason::NotRequested) => None,
                    other => Some(other.encoded_payload().to_string()),
                },
                error: None,
            },
            PipelineResult::Failed(err) => UploadResponse {
                image_url: None,
                blurpfp: None,
                error: Some(err.client_message()),
            },
        }
    }
}

/// Response body of `POST /api/images/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored image
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Base64 JPEG placeholder; empty when derivation failed, omitted for non-avatars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blurpfp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body of `GET /api/images/getuploadurl`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponse {
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    pub id: String,
}

/// Request body of `POST /api/images/createblurpfp`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PlaceholderRequest {
    /// Publicly reachable image URL
    #[serde(default)]
    #[validate(length(min = 1, max = 2048, message = "Image URL is required"))]
    pub imageurl: Option<String>,
}

/// Successful response body of `POST /api/images/createblurpfp`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceholderResponse {
    pub success: bool,
    pub blurpfp: String,
}
