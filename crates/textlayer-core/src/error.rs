use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid PDF input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {0} does not exist")]
    PageOutOfRange(u32),

    #[error("Export failed: {0}")]
    ExportError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
