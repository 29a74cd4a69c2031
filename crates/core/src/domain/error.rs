// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Statement chain must not be empty")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, DomainError>;
