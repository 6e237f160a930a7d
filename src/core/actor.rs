//! Acting-user identity supplied by the session layer.
//!
//! The engine never authenticates anyone; every mutating call carries
//! the already-resolved identity of whoever is making the change so it
//! can be recorded in the audit trail and checked against the
//! manager/owner fields on PTO requests.

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}
