use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("student name cannot be empty")]
    EmptyName,
    #[error("invalid semester: {0} (must be between 1 and 8)")]
    InvalidSemester(i32),
    #[error("invalid grade value: {0} (must be between 0.0 and 10.0)")]
    InvalidGrade(f64),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("student already exists: {0}")]
    Duplicate(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed history entry {0:?}")]
    History(String),
}
