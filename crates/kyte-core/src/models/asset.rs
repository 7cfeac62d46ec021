use serde::Serialize;

/// One-time destination issued by the storage provider.
///
/// Not `Clone`: the transmitter takes it by value, so a target can back at
/// most one upload.
#[derive(Debug)]
pub struct UploadTarget {
    target_url: String,
    reference: String,
}

impl UploadTarget {
    pub fn new(target_url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            reference: reference.into(),
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Split into `(target_url, reference)`.
    pub fn into_parts(self) -> (String, String) {
        (self.target_url, self.reference)
    }
}

/// Durable artifact that exists only after the provider accepted an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    reference: String,
    public_url: String,
    variants: Vec<String>,
}

impl StoredAsset {
    /// Build from a successful provider response. Returns `None` unless at
    /// least one non-empty variant URL is present; the first one becomes the
    /// public URL.
    pub fn from_variants(reference: impl Into<String>, variants: Vec<String>) -> Option<Self> {
        let variants: Vec<String> = variants
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        let public_url = variants.first()?.clone();
        Some(Self {
            reference: reference.into(),
            public_url,
            variants,
        })
    }

    /// Direct constructor for in-memory stores and test doubles.
    pub fn new(reference: impl Into<String>, public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        Self {
            reference: reference.into(),
            variants: vec![public_url.clone()],
            public_url,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

/// Why no placeholder accompanies a stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    /// Submission was not an avatar.
    NotRequested,
    Failed,
    DeadlineExceeded,
    Cancelled,
}

/// Optional placeholder derived from a stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedAsset {
    Present(String),
    Absent(AbsentReason),
}

impl DerivedAsset {
    pub fn is_present(&self) -> bool {
        matches!(self, DerivedAsset::Present(_))
    }

    pub fn present(&self) -> Option<&str> {
        match self {
            DerivedAsset::Present(payload) => Some(payload.as_str()),
            DerivedAsset::Absent(_) => None,
        }
    }

    /// Encoded placeholder, or the empty string when absent.
    pub fn encoded_payload(&self) -> &str {
        self.present().unwrap_or("")
    }

    pub fn absent_reason(&self) -> Option<AbsentReason> {
        match self {
            DerivedAsset::Present(_) => None,
            DerivedAsset::Absent(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_asset_requires_a_variant() {
        assert!(StoredAsset::from_variants("id", vec![]).is_none());
        assert!(StoredAsset::from_variants("id", vec!["  ".to_string()]).is_none());
    }

    #[test]
    fn stored_asset_uses_first_non_empty_variant() {
        let asset = StoredAsset::from_variants(
            "id-1",
            vec![
                "".to_string(),
                "https://imagedelivery.net/h/id-1/public".to_string(),
                "https://imagedelivery.net/h/id-1/thumb".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(asset.public_url(), "https://imagedelivery.net/h/id-1/public");
        assert_eq!(asset.variants().len(), 2);
        assert_eq!(asset.reference(), "id-1");
    }

    #[test]
    fn absent_payload_encodes_as_empty_string() {
        let derived = DerivedAsset::Absent(AbsentReason::Failed);
        assert_eq!(derived.encoded_payload(), "");
        assert!(derived.present().is_none());
        assert_eq!(derived.absent_reason(), Some(AbsentReason::Failed));

        let derived = DerivedAsset::Present("abc".to_string());
        assert_eq!(derived.encoded_payload(), "abc");
        assert!(derived.is_present());
    }

    #[test]
    fn upload_target_exposes_parts() {
        let target = UploadTarget::new("https://upload.example/abc", "ref-1");
        assert_eq!(target.target_url(), "https://upload.example/abc");
        let (url, reference) = target.into_parts();
        assert_eq!(url, "https://upload.example/abc");
        assert_eq!(reference, "ref-1");
    }
}
