use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `source,target`, found {content:?}")]
    Format { line: usize, content: String },

    #[error("line {line}: more than one comma in {content:?}")]
    ExtraComma { line: usize, content: String },

    #[error("not a .csv file: {}", .0.display())]
    NotCsv(PathBuf),

    #[error("graph has a cycle through node {0:?}")]
    Cyclic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
