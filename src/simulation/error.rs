//! Error types and handling
//!
//! This module contains error types for the simulation. Broken internal
//! contracts (releasing an idle line, scheduling into the past, mixing hybrid
//! types in one module) are reported as errors and abort the run. Running out
//! of capacity is not an error; it is recorded as a loss.

use crate::types::{ConfigError, ConfigValidationError};
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// An internal invariant of the plant model was broken
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// An event was scheduled before the current clock or at a non-finite time
    #[error("Scheduling error: {0}")]
    SchedulingError(String),

    /// The arrival source could not produce a day's arrivals
    #[error("Arrival source error: {0}")]
    ArrivalSourceError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<ConfigError> for SimulationError {
    fn from(error: ConfigError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a contract violation error
    pub fn contract_violation(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    /// Create a scheduling error
    pub fn scheduling_error(msg: impl Into<String>) -> Self {
        Self::SchedulingError(msg.into())
    }

    /// Create an arrival source error
    pub fn arrival_source_error(msg: impl Into<String>) -> Self {
        Self::ArrivalSourceError(msg.into())
    }

    /// Whether this error means the model itself is in an inconsistent state
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SimulationError::ContractViolation(_) | SimulationError::SchedulingError(_)
        )
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::ContractViolation(_) => "Contract Violation",
            SimulationError::SchedulingError(_) => "Scheduling",
            SimulationError::ArrivalSourceError(_) => "Arrival Source",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = SimulationError::configuration_error("Invalid dryer list");
        assert!(matches!(config_error, SimulationError::ConfigurationError(_)));
        assert_eq!(config_error.to_string(), "Configuration validation failed: Invalid dryer list");

        let violation = SimulationError::contract_violation("line UL1 is idle");
        assert!(violation.is_contract_violation());
        assert_eq!(violation.to_string(), "Contract violation: line UL1 is idle");
    }

    #[test]
    fn test_config_file_error_is_not_a_violation() {
        let error: SimulationError = ConfigError::UnsupportedFormat("plant.yaml".to_string()).into();
        assert!(matches!(error, SimulationError::ConfigurationError(_)));
        assert!(!error.is_contract_violation());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let sim_error: SimulationError = io_error.into();
        assert!(matches!(sim_error, SimulationError::IoError(_)));
        assert!(!sim_error.is_contract_violation());
    }

    #[test]
    fn test_error_from_validation_error() {
        let validation = ConfigValidationError::InvalidDaysCount(0);
        let sim_error: SimulationError = validation.into();
        assert!(matches!(sim_error, SimulationError::ConfigurationError(_)));
        assert!(sim_error.to_string().contains("Days count"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SimulationError::configuration_error("x").category(), "Configuration");
        assert_eq!(SimulationError::contract_violation("x").category(), "Contract Violation");
        assert_eq!(SimulationError::scheduling_error("x").category(), "Scheduling");
        assert_eq!(SimulationError::arrival_source_error("x").category(), "Arrival Source");
    }

    #[test]
    fn test_simulation_result_type() {
        let success: SimulationResult<i32> = Ok(42);
        assert!(success.is_ok());

        let failure: SimulationResult<i32> = Err(SimulationError::scheduling_error("t < now"));
        assert!(failure.is_err());
    }
}
