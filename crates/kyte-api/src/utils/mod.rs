pub mod source_guard;
pub mod upload;
