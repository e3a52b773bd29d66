//! Error normalization at the tool boundary.

use serde::{Deserialize, Serialize};

/// The `{message, stack}` shape reported to the host on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub stack: String,
}

impl From<&anyhow::Error> for ErrorReport {
    fn from(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            stack: format!("{:?}", err),
        }
    }
}

impl From<anyhow::Error> for ErrorReport {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}
