//! Record value type moved across the adapter boundary.

use std::fmt::{Display, Formatter};

/// Immutable record with structural equality.
///
/// The adapters in this crate are generic over any `Send + 'static` item;
/// `Record` is the collaborator-facing value type with the identifier,
/// given-name and family-name fields the repository contracts speak in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    id: String,
    given_name: String,
    family_name: String,
}

impl Record {
    pub fn new(id: &str, given_name: &str, family_name: &str) -> Self {
        Self {
            id: id.to_string(),
            given_name: given_name.to_string(),
            family_name: family_name.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.id, self.given_name, self.family_name)
    }
}
