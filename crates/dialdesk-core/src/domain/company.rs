use crate::domain::ids::CompanyId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_CONTACT_PAIRS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPair {
    pub person: String,
    pub phone: String,
}

impl ContactPair {
    pub fn is_empty(&self) -> bool {
        self.person.trim().is_empty() && self.phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub identification_code: String,
    pub name: String,
    pub contacts: Vec<ContactPair>,
    pub tender: BTreeMap<String, String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Company fields as they arrive from a form or a spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub identification_code: String,
    pub name: String,
    pub contacts: Vec<ContactPair>,
    pub tender: BTreeMap<String, String>,
}

impl CompanyDraft {
    /// Trims fields, drops empty contact pairs and checks required values.
    pub fn validated(self) -> Result<Self, CoreError> {
        let identification_code = self.identification_code.trim().to_string();
        if identification_code.is_empty() {
            return Err(CoreError::EmptyIdentificationCode);
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::EmptyCompanyName);
        }
        let contacts = validate_contacts(self.contacts)?;
        let tender = self
            .tender
            .into_iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .collect();
        Ok(Self {
            identification_code,
            name,
            contacts,
            tender,
        })
    }
}

pub fn validate_contacts(contacts: Vec<ContactPair>) -> Result<Vec<ContactPair>, CoreError> {
    let contacts: Vec<ContactPair> = contacts
        .into_iter()
        .filter(|pair| !pair.is_empty())
        .map(|pair| ContactPair {
            person: pair.person.trim().to_string(),
            phone: pair.phone.trim().to_string(),
        })
        .collect();
    if contacts.len() > MAX_CONTACT_PAIRS {
        return Err(CoreError::TooManyContacts {
            max: MAX_CONTACT_PAIRS,
            got: contacts.len(),
        });
    }
    Ok(contacts)
}
