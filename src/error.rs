use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, SimErr>;

/// The simulation's error type.
///
/// Numeric divergence (NaN or infinite losses and parameters) is *not* represented here, it is
/// a legitimate outcome of the optimization and flows through the regular return values.
#[derive(Debug)]
pub enum SimErr {
    InvalidArgument {
        what: &'static str,
        got: usize,
    },
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    SvdFailed {
        rows: usize,
        cols: usize,
    },
    InvalidConfig(String),
    ConfigParse(serde_json::Error),
}

impl Display for SimErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimErr::InvalidArgument { what, got } => {
                write!(f, "Invalid argument {what}, got {got} but it must be positive")
            }
            SimErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            SimErr::SvdFailed { rows, cols } => {
                write!(f, "The SVD of a {rows}x{cols} matrix did not converge")
            }
            SimErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            SimErr::ConfigParse(e) => write!(f, "invalid config JSON: {e}"),
        }
    }
}

impl Error for SimErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimErr::ConfigParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SimErr {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse(value)
    }
}
