pub type CapgifResult<T> = Result<T, CapgifError>;

#[derive(thiserror::Error, Debug)]
pub enum CapgifError {
    #[error("source load error: {0}")]
    SourceLoad(String),

    #[error("an export session is already active")]
    SessionBusy,

    #[error("export error: {0}")]
    ExportFailed(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CapgifError {
    pub fn source_load(msg: impl Into<String>) -> Self {
        Self::SourceLoad(msg.into())
    }

    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
