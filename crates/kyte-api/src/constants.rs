//! API route constants

pub const UPLOAD_PATH: &str = "/api/images/upload";
pub const UPLOAD_URL_PATH: &str = "/api/images/getuploadurl";
pub const PLACEHOLDER_PATH: &str = "/api/images/createblurpfp";
pub const HEALTH_PATH: &str = "/health";
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Room for multipart boundaries and the non-file fields on top of the
/// configured file ceiling.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
