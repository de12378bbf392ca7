//! Object key naming scheme.
//!
//! Every photo is stored at `{product_id}/{file_id}.{extension}`. The product
//! id doubles as the listing prefix, so a product's photos are exactly the
//! immediate children of `{product_id}/`.

use std::fmt;
use std::str::FromStr;

use photostore_shared::types::{FileId, ProductId};
use thiserror::Error;

/// Longest accepted file extension.
const MAX_EXTENSION_LEN: usize = 16;

/// Naming errors. All of them are caller input problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// Original file name has no extension.
    #[error("file name '{0}' has no extension")]
    MissingExtension(String),

    /// Extension contains characters that are not allowed in keys.
    #[error("unsupported file extension '{0}'")]
    InvalidExtension(String),

    /// Key does not follow the `{product_id}/{file_id}.{extension}` scheme.
    #[error("'{0}' is not a valid photo path")]
    MalformedKey(String),
}

/// Parsed photo object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoKey {
    product_id: ProductId,
    file_id: FileId,
    extension: String,
}

impl PhotoKey {
    /// Build the key for a new upload.
    ///
    /// The extension is taken from the last `.` of the file name component of
    /// `original_file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file name has no usable extension.
    pub fn resolve(
        product_id: ProductId,
        file_id: FileId,
        original_file_name: &str,
    ) -> Result<Self, NamingError> {
        let extension = extension_of(original_file_name)?;
        Ok(Self {
            product_id,
            file_id,
            extension: extension.to_string(),
        })
    }

    /// Parse a stored key back into its parts.
    ///
    /// Only the canonical form produced by [`PhotoKey::resolve`] is accepted.
    ///
    /// # Errors
    ///
    /// Returns `MalformedKey` for anything outside the naming scheme.
    pub fn parse(key: &str) -> Result<Self, NamingError> {
        let malformed = || NamingError::MalformedKey(key.to_string());

        let (product, file) = key.split_once('/').ok_or_else(malformed)?;
        let (file_id, extension) = file.split_once('.').ok_or_else(malformed)?;

        let parsed = Self {
            product_id: ProductId::from_str(product).map_err(|_| malformed())?,
            file_id: FileId::from_str(file_id).map_err(|_| malformed())?,
            extension: validate_extension(extension)
                .map_err(|_| malformed())?
                .to_string(),
        };

        // Rejects uppercase, braced and simple uuid spellings.
        if parsed.to_string() != key {
            return Err(malformed());
        }

        Ok(parsed)
    }

    /// Listing prefix holding all photos of a product.
    #[must_use]
    pub fn product_prefix(product_id: ProductId) -> String {
        format!("{product_id}/")
    }

    /// Owning product.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Stored file id.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Last path segment, `{file_id}.{extension}`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_id, self.extension)
    }
}

impl fmt::Display for PhotoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.product_id, self.file_id, self.extension)
    }
}

/// Extension of an uploaded file name, without the dot.
fn extension_of(original_file_name: &str) -> Result<&str, NamingError> {
    let name = original_file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_file_name);

    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => validate_extension(ext),
        _ => Err(NamingError::MissingExtension(original_file_name.to_string())),
    }
}

fn validate_extension(ext: &str) -> Result<&str, NamingError> {
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(NamingError::InvalidExtension(ext.to_string()));
    }
    Ok(ext)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn product_id() -> impl Strategy<Value = ProductId> {
        any::<u128>().prop_map(|v| ProductId::from_uuid(Uuid::from_u128(v)))
    }

    fn file_id() -> impl Strategy<Value = FileId> {
        any::<u128>().prop_map(|v| FileId::from_uuid(Uuid::from_u128(v)))
    }

    // Resolution is a pure function of its inputs.
    proptest! {
        #[test]
        fn prop_resolve_deterministic(
            product in product_id(),
            file in file_id(),
            name in "[a-zA-Z0-9 _-]{0,20}\\.[a-z0-9]{1,5}",
        ) {
            let first = PhotoKey::resolve(product, file, &name).expect("valid name");
            let second = PhotoKey::resolve(product, file, &name).expect("valid name");
            prop_assert_eq!(first.to_string(), second.to_string());
        }
    }

    // Distinct file ids never collide in key space.
    proptest! {
        #[test]
        fn prop_resolve_injective_in_file_id(
            product in product_id(),
            a in file_id(),
            b in file_id(),
            name in "[a-z]{1,10}\\.[a-z]{2,4}",
        ) {
            prop_assume!(a != b);
            let key_a = PhotoKey::resolve(product, a, &name).expect("valid name");
            let key_b = PhotoKey::resolve(product, b, &name).expect("valid name");
            prop_assert_ne!(key_a.to_string(), key_b.to_string());
        }
    }

    // The product id is recoverable from every resolved key.
    proptest! {
        #[test]
        fn prop_parse_recovers_product(
            product in product_id(),
            file in file_id(),
            name in "[a-z]{1,10}\\.[a-zA-Z0-9]{1,8}",
        ) {
            let key = PhotoKey::resolve(product, file, &name).expect("valid name");
            let parsed = PhotoKey::parse(&key.to_string()).expect("own key parses");
            prop_assert_eq!(parsed.product_id(), product);
            prop_assert!(key.to_string().starts_with(&PhotoKey::product_prefix(product)));
        }
    }

    // Names without a dot never resolve.
    proptest! {
        #[test]
        fn prop_resolve_without_dot_fails(
            product in product_id(),
            file in file_id(),
            name in "[a-zA-Z0-9 _-]{0,30}",
        ) {
            let result = PhotoKey::resolve(product, file, &name);
            let is_missing = matches!(result, Err(NamingError::MissingExtension(_)));
            prop_assert!(is_missing);
        }
    }
}
