use crate::types::{DeviceId, TuningMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status code reported by an algorithm engine call.
///
/// Values match the bit flags used by the engine's C ABI so codes can be
/// logged and compared against vendor traces unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum IaErr {
    None = 0,
    General = 1 << 1,
    NoMemory = 1 << 2,
    Data = 1 << 3,
    Internal = 1 << 4,
    Argument = 1 << 5,
    Disabled = 1 << 6,
    NotRun = 1 << 7,
}

impl IaErr {
    pub fn is_ok(&self) -> bool {
        matches!(self, IaErr::None)
    }

    /// Raw numeric value of the code
    pub fn raw(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for IaErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IaErr::None => "none",
            IaErr::General => "general",
            IaErr::NoMemory => "nomemory",
            IaErr::Data => "data",
            IaErr::Internal => "internal",
            IaErr::Argument => "argument",
            IaErr::Disabled => "disabled",
            IaErr::NotRun => "not_run",
        };
        write!(f, "{}({})", name, self.raw())
    }
}

#[derive(Error, Debug)]
pub enum CcaError {
    #[error("Invalid argument in {operation}: {argument} is missing")]
    InvalidArgument {
        operation: &'static str,
        argument: &'static str,
    },

    #[error("Engine error in {operation}: {code}")]
    Engine {
        operation: &'static str,
        code: IaErr,
    },

    #[error("Engine facade for device {device} mode {mode:?} has been released")]
    Released { device: DeviceId, mode: TuningMode },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("System error: {message}")]
    System { message: String },
}

impl CcaError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn invalid_argument(operation: &'static str, argument: &'static str) -> Self {
        Self::InvalidArgument {
            operation,
            argument,
        }
    }

    /// Engine-level result code for this error, if it maps to one.
    pub fn code(&self) -> Option<IaErr> {
        match self {
            CcaError::InvalidArgument { .. } => Some(IaErr::Argument),
            CcaError::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CcaError>;
