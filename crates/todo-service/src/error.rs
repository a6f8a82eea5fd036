use todo_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad or missing caller input. Maps to HTTP 400 at the endpoint layer.
    #[error("{0}")]
    Validation(String),

    /// The operation could not be completed against storage. Maps to 500.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
