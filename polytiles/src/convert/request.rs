//! Conversion request and its validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors found while validating a conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// A required path is empty.
    #[error("'{field}' must not be empty")]
    EmptyPath { field: &'static str },

    /// A path contains whitespace.
    #[error("'{field}' must not contain whitespace")]
    Whitespace { field: &'static str },

    /// Input and output point to the same file.
    #[error("'input' and 'output' must be different paths")]
    SamePath,
}

/// Request to convert a polygon file into a tile container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Polygon geometry file (GeoJSON, FlatGeobuf, CSV, ...).
    pub input: String,
    /// Destination tile container.
    pub output: String,
}

impl ConvertRequest {
    /// Creates a request.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Checks both paths are non-empty, free of whitespace, and distinct.
    pub fn validate(&self) -> Result<(), ConvertError> {
        validate_path("input", &self.input)?;
        validate_path("output", &self.output)?;
        if self.input == self.output {
            return Err(ConvertError::SamePath);
        }
        Ok(())
    }
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ConvertError> {
    if value.is_empty() {
        return Err(ConvertError::EmptyPath { field });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConvertError::Whitespace { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let request = ConvertRequest::new("data/districts.geojson", "tiles/districts.versatiles");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_empty_input_rejected() {
        let request = ConvertRequest::new("", "out.versatiles");
        assert_eq!(
            request.validate(),
            Err(ConvertError::EmptyPath { field: "input" })
        );
    }

    #[test]
    fn test_whitespace_output_rejected() {
        let request = ConvertRequest::new("in.geojson", "my tiles.versatiles");
        assert_eq!(
            request.validate(),
            Err(ConvertError::Whitespace { field: "output" })
        );
    }

    #[test]
    fn test_same_path_rejected() {
        let request = ConvertRequest::new("same.geojson", "same.geojson");
        assert_eq!(request.validate(), Err(ConvertError::SamePath));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConvertError::EmptyPath { field: "input" }.to_string(),
            "'input' must not be empty"
        );
    }
}
