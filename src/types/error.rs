use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("object key is empty.")]
    EmptyKey,
    #[error("cancelled")]
    Cancelled,
    #[error("failed to resolve folder '{path}': {message}")]
    FolderResolution {
        path: String,
        message: String,
        fatal: bool,
    },
    #[error("failed to list folder '{folder_id}': {message}")]
    FolderListing {
        folder_id: String,
        message: String,
        fatal: bool,
    },
}

impl TransferError {
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::FolderResolution { fatal, .. } | Self::FolderListing { fatal, .. } => *fatal,
            _ => false,
        }
    }
}
