use thiserror::Error;

/// Main error type for the tuner
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parameter-space and configuration validation errors
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Duplicate parameter name: {name}")]
    DuplicateName { name: String },

    #[error("Parameter {name} has an empty value grid")]
    EmptyGrid { name: String },

    #[error("Parameter {name} has an inverted range: {low} > {high}")]
    InvertedRange { name: String, low: f64, high: f64 },

    #[error("Configuration is missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("Configuration names unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Value {value} for parameter {name} is outside its declared domain")]
    OutOfDomain { name: String, value: f64 },
}

/// Text-format errors from the properties file or the tournament log
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed properties line {line_no}: {line:?}")]
    MalformedLine { line_no: usize, line: String },

    #[error("Non-numeric value for {key}: {value:?}")]
    NonNumericValue { key: String, value: String },

    #[error("Malformed tournament log: {message}")]
    MalformedLog { message: String },
}

/// Failures of the external harness invocation
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Harness exited with status {status}")]
    NonZeroExit { status: i32 },

    #[error("Harness did not finish within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Failed to launch {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("Agent build failed with status {status}")]
    BuildFailed { status: i32 },
}

/// Result type alias for tuner operations
pub type TunerResult<T> = Result<T, TunerError>;
