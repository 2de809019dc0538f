use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] rollcall_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] rollcall_store_lmdb::LmdbError),

    #[error("database integrity check failed: {0}")]
    Integrity(String),

    #[error("engine error: {0}")]
    Engine(#[from] rollcall_verification::EngineError),

    #[error("HTTP server error: {0}")]
    Rpc(#[from] rollcall_rpc::RpcError),

    #[error("metrics registry error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
