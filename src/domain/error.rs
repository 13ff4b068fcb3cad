use thiserror::Error;

/// Permanent rejections raised while turning a raw message into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid log: empty ID")]
    EmptyId,

    #[error("Invalid log: empty message")]
    EmptyMessage,
}
