use crate::types::error::TransferError;

const KEY_DELIMITER: char = '/';

/// An object key split into destination folder segments and a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub segments: Vec<String>,
    pub leaf_name: String,
}

impl ObjectPath {
    /// Empty segments (leading, trailing or doubled slashes) are dropped.
    pub fn parse(key: &str) -> Result<Self, TransferError> {
        let mut segments: Vec<String> = key
            .split(KEY_DELIMITER)
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_string())
            .collect();

        let Some(leaf_name) = segments.pop() else {
            return Err(TransferError::EmptyKey);
        };

        Ok(Self {
            segments,
            leaf_name,
        })
    }

    pub fn folder_key(&self) -> String {
        folder_key(&self.segments)
    }
}

/// Normalized cache key of a folder path, e.g. `a/b/c`. The root is `""`.
pub fn folder_key(segments: &[String]) -> String {
    segments.join("/")
}
