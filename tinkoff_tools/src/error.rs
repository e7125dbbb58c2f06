use thiserror::Error;

#[derive(Debug, Error)]
pub enum TinkoffApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the gateway: {0}")]
    TransportError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Gateway rejected the request. Error {error_code}. {message}")]
    Rejected { error_code: String, message: String },
}
