use colored::Colorize;
use std::fmt;
use std::process;

/// Exit codes for the CLI.
pub const EXIT_SUBTYPE: i32 = 0;
pub const EXIT_NOT_SUBTYPE: i32 = 1;
pub const EXIT_INPUT: i32 = 2;
pub const EXIT_UNSUPPORTED: i32 = 3;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Bad file path, unreadable input, parse failure, malformed schema.
    Input(String),
    /// A construct outside the supported dialect.
    Unsupported(String),
}

impl CliError {
    /// The process exit code this error maps to
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input(_) => EXIT_INPUT,
            CliError::Unsupported(_) => EXIT_UNSUPPORTED,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Unsupported(msg) => {
                write!(f, "{} {msg}", "unsupported:".yellow().bold())
            }
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<subsume_lattice::Error> for CliError {
    fn from(e: subsume_lattice::Error) -> Self {
        match e {
            subsume_lattice::Error::Unsupported { .. } => CliError::Unsupported(e.to_string()),
            other => CliError::Input(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Print the error and exit with its code.
pub fn exit_with_error(e: CliError) -> ! {
    eprintln!("{e}");
    process::exit(e.exit_code());
}
