//! Custom metadata and the naming conventions that drive data binding.
//!
//! The `id` string doubles as the binding key:
//!
//! ```text
//! PLACEHOLDER-<column>                  data anchor, filled from recipient data
//! SIGNATURE-<signerId>-<displayName>    signature block for one signer
//! background-image                      the certificate background
//! ```

use uuid::Uuid;

/// Prefix of data anchor ids.
pub const PLACEHOLDER_PREFIX: &str = "PLACEHOLDER-";

/// Prefix of signature block ids.
pub const SIGNATURE_PREFIX: &str = "SIGNATURE-";

/// Fixed id of the background image.
pub const BACKGROUND_ID: &str = "background-image";

/// Custom metadata carried by every scene object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub id: String,
    /// Bound column name for data anchors.
    pub db_field: Option<String>,
    pub is_anchor: bool,
    pub is_qr_anchor: bool,
    pub undeleteable: bool,
    pub name: Option<String>,
}

/// Semantic role derived from metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRole {
    Background,
    QrAnchor,
    DataAnchor { column: String },
    SignatureBlock,
    Plain,
}

impl Metadata {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Classify this object. The QR flag wins over the id conventions.
    pub fn role(&self) -> ObjectRole {
        if self.is_qr_anchor {
            return ObjectRole::QrAnchor;
        }
        if self.id == BACKGROUND_ID {
            return ObjectRole::Background;
        }
        if self.id.starts_with(SIGNATURE_PREFIX) {
            return ObjectRole::SignatureBlock;
        }
        if self.is_anchor {
            if let Some(column) = self.bound_column() {
                return ObjectRole::DataAnchor {
                    column: column.to_string(),
                };
            }
        }
        ObjectRole::Plain
    }

    /// Column this anchor reads from: the id suffix, else `db_field`.
    pub fn bound_column(&self) -> Option<&str> {
        column_from_id(&self.id).or(self.db_field.as_deref())
    }

    pub fn is_background(&self) -> bool {
        self.id == BACKGROUND_ID
    }

    pub fn is_signature_block(&self) -> bool {
        self.id.starts_with(SIGNATURE_PREFIX)
    }
}

/// Id of the data anchor bound to `column`.
pub fn placeholder_id(column: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{column}")
}

/// Column name encoded in a data anchor id.
pub fn column_from_id(id: &str) -> Option<&str> {
    id.strip_prefix(PLACEHOLDER_PREFIX).filter(|c| !c.is_empty())
}

/// Id of the signature block for a signer.
pub fn signature_id(signer_id: &str, display_name: &str) -> String {
    format!("{SIGNATURE_PREFIX}{signer_id}-{display_name}")
}

/// Id prefix that identifies every block belonging to `signer_id`.
pub fn signature_prefix_for(signer_id: &str) -> String {
    format!("{SIGNATURE_PREFIX}{signer_id}")
}

/// Generate a session-unique id such as `rect-3f2a...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_roundtrip() {
        let id = placeholder_id("email");
        assert_eq!(id, "PLACEHOLDER-email");
        assert_eq!(column_from_id(&id), Some("email"));
        assert_eq!(column_from_id("PLACEHOLDER-"), None);
        assert_eq!(column_from_id("rect-1"), None);
    }

    #[test]
    fn test_roles() {
        let bg = Metadata::with_id(BACKGROUND_ID);
        assert_eq!(bg.role(), ObjectRole::Background);

        let mut anchor = Metadata::with_id("PLACEHOLDER-name");
        anchor.is_anchor = true;
        assert_eq!(
            anchor.role(),
            ObjectRole::DataAnchor {
                column: "name".to_string()
            }
        );

        let sig = Metadata::with_id(signature_id("42", "Dean"));
        assert_eq!(sig.role(), ObjectRole::SignatureBlock);

        let mut qr = Metadata::with_id("qr-1");
        qr.is_qr_anchor = true;
        assert_eq!(qr.role(), ObjectRole::QrAnchor);

        assert_eq!(Metadata::with_id("rect-1").role(), ObjectRole::Plain);
    }

    #[test]
    fn test_anchor_falls_back_to_db_field() {
        let mut meta = Metadata::with_id("text-legacy");
        meta.is_anchor = true;
        meta.db_field = Some("course".to_string());
        assert_eq!(meta.bound_column(), Some("course"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id("rect");
        let b = generate_id("rect");
        assert_ne!(a, b);
        assert!(a.starts_with("rect-"));
    }
}
