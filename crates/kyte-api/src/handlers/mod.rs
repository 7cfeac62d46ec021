pub mod health;
pub mod placeholder;
pub mod upload;
pub mod upload_url;
