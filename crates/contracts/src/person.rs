//! Person - demo record used by the mapping scenarios

use serde::{Deserialize, Serialize};

/// Immutable contact record
///
/// Transforms return a new value instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    /// Same person with the name upper-cased
    pub fn with_upper_name(self) -> Self {
        Self {
            name: self.name.to_uppercase(),
            ..self
        }
    }
}
