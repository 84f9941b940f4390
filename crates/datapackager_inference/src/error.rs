use std::path::PathBuf;
use thiserror::Error;

/// Every way schema inference can fail. Callers see one category
/// ("could not infer schema") with the cause attached.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("could not infer schema: cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not infer schema: file is empty")]
    Empty,

    #[error("could not infer schema: file is not valid UTF-8")]
    Utf8,

    #[error("could not infer schema: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not infer schema: header row has no columns")]
    NoColumns,

    /// Column positions are zero-based.
    #[error("could not infer schema: column {column} has no header")]
    BlankHeader { column: usize },

    #[error("could not infer schema: header '{name}' appears more than once")]
    DuplicateHeader { name: String },
}
