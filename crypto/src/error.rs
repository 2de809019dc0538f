use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Argon2 error: {0}")]
    Argon2(String),

    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    #[error("randomness error: {0}")]
    Random(#[from] rollcall_types::RollcallError),
}
