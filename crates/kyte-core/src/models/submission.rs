use bytes::Bytes;

/// Inbound binary plus the metadata the client declared for it.
#[derive(Debug, Clone)]
pub struct AssetSubmission {
    pub data: Bytes,
    /// Declared media type, as sent by the client.
    pub content_type: String,
    pub filename: String,
    /// Avatars get a placeholder derived after upload.
    pub is_avatar: bool,
}

impl AssetSubmission {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
        is_avatar: bool,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            filename: filename.into(),
            is_avatar,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Media type without parameters, lowercased (`image/PNG; q=1` -> `image/png`).
    pub fn essence(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase()
    }
}
