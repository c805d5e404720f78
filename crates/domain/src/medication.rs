use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: ID,
    pub user_id: ID,
    pub name: String,
    /// Free text like "500mg" or "2 puffs"
    pub dose_info: Option<String>,
    /// PRN ("as needed") medication, these are never reminded about
    pub as_needed: bool,
}

impl Medication {
    pub fn new(user_id: ID, name: impl Into<String>) -> Self {
        Self {
            id: Default::default(),
            user_id,
            name: name.into(),
            dose_info: None,
            as_needed: false,
        }
    }
}

impl Entity for Medication {
    fn id(&self) -> &ID {
        &self.id
    }
}
