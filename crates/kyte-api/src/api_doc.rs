//! OpenAPI documentation, served at `crate::constants::OPENAPI_PATH`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use kyte_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kyte Media API",
        version = "0.1.0",
        description = "Image ingestion for Kyte: uploads to Cloudflare Images, direct upload URLs and blurred avatar placeholders."
    ),
    paths(
        handlers::upload::upload_image,
        handlers::upload_url::get_upload_url,
        handlers::placeholder::create_placeholder,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::UploadResponse,
            models::UploadUrlResponse,
            models::PlaceholderRequest,
            models::PlaceholderResponse,
            handlers::upload_url::UploadUrlErrorResponse,
            handlers::placeholder::PlaceholderErrorResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "images", description = "Image upload and placeholder operations"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
