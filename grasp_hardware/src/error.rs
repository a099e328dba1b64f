use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HwError {
    #[error("finger {finger}: {mode} not supported by the simulated hand")]
    UnsupportedMode { finger: u8, mode: &'static str },
    #[error("finger {finger}: command value {value} is not finite")]
    InvalidValue { finger: u8, value: f64 },
}

pub type Result<T> = std::result::Result<T, HwError>;
