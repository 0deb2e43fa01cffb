use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    id: Uuid,
    code: String,
    name: String,
}

impl Course {
    pub fn new(id: Uuid, code: String, name: String) -> Self {
        Self { id, code, name }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Short uppercase code used in certificate numbers, e.g. `RUST101`.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
