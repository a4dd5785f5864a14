use crate::model::ExpenseId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error during {op}: {message}")]
    Storage { op: &'static str, message: String },

    #[error("invalid stored json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("attachment error: {0}")]
    Attachment(String),

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unable to open the statement preview ({0}). Allow the system viewer or download the statement instead.")]
    PreviewUnavailable(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn not_found(id: &ExpenseId) -> Self {
        Error::ExpenseNotFound(id.to_string())
    }

    pub(crate) fn no_position(position: usize) -> Self {
        Error::ExpenseNotFound(format!("no expense at position {position}"))
    }
}

impl From<printpdf::Error> for Error {
    fn from(e: printpdf::Error) -> Self {
        Error::Pdf(e.to_string())
    }
}
