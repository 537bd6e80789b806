use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("No objects were provided for the {0} action")]
    EmptyInput(String),

    #[error("Only objects of a single type can be pushed to a table, got: {}", .0.join(", "))]
    MixedTypePush(Vec<String>),

    #[error("Worksheet '{0}' cannot be found")]
    SheetNotFound(String),

    #[error("Nothing to update: {0}")]
    NoTargetToUpdate(String),

    #[error("Push type {0} is not supported by the Excel adapter")]
    UnsupportedPushType(String),

    #[error("Requests of type {0} are not supported by the Excel adapter")]
    UnsupportedRequest(String),

    #[error("Range cannot be resolved: {0}")]
    RangeResolutionFailure(String),

    #[error("Type {0} cannot be built from a table: {1}")]
    SchemaMismatch(String, String),

    #[error("Failed to set property '{property}' from {value}: {reason}")]
    PropertyAssignmentError {
        property: String,
        value: String,
        reason: String,
    },

    #[error("The workbook could not be opened: {0}")]
    StoreOpenError(String),

    #[error("Finalisation and saving of the workbook failed: {0}")]
    StoreSaveError(String),

    #[error("Workbook operation failed: {0}")]
    Store(String),

    #[error("Invalid adapter settings: {0}")]
    InvalidSettings(String),
}

impl AdapterError {
    /// Short variant name, used when printing diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::EmptyInput(_) => "EmptyInput",
            AdapterError::MixedTypePush(_) => "MixedTypePush",
            AdapterError::SheetNotFound(_) => "SheetNotFound",
            AdapterError::NoTargetToUpdate(_) => "NoTargetToUpdate",
            AdapterError::UnsupportedPushType(_) => "UnsupportedPushType",
            AdapterError::UnsupportedRequest(_) => "UnsupportedRequest",
            AdapterError::RangeResolutionFailure(_) => "RangeResolutionFailure",
            AdapterError::SchemaMismatch(..) => "SchemaMismatch",
            AdapterError::PropertyAssignmentError { .. } => "PropertyAssignmentError",
            AdapterError::StoreOpenError(_) => "StoreOpenError",
            AdapterError::StoreSaveError(_) => "StoreSaveError",
            AdapterError::Store(_) => "Store",
            AdapterError::InvalidSettings(_) => "InvalidSettings",
        }
    }
}

impl From<crate::excel::StoreError> for AdapterError {
    fn from(e: crate::excel::StoreError) -> Self {
        AdapterError::Store(e.to_string())
    }
}
