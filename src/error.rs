use thiserror::Error;

use crate::parser::DocumentKind;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no handler for {0} yet")]
    Unsupported(DocumentKind),

    #[error("failed to read PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF has no pages")]
    EmptyDocument,
}
