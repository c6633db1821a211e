use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import error at row {row}: {message}")]
    Import { row: usize, message: String },

    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Unknown supplier id {0}")]
    UnknownSupplier(u64),

    #[error("Unknown product id {0} referenced by order {1}")]
    DanglingOrder(u64, i64),
}

impl DashError {
    pub fn import(row: usize, message: impl Into<String>) -> Self {
        DashError::Import {
            row,
            message: message.into(),
        }
    }

    /// Errors caused by the uploaded data rather than server state
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DashError::Csv(_) | DashError::Import { .. } | DashError::MissingColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
