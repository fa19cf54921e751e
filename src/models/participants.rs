use serde::{Deserialize, Serialize};

/// Additional team member as written to the `participants` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub contact: String,
    pub email: String,
}
