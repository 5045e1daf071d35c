use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat-platform user ID (e.g. `U024BE7LH`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The only persisted entity: what the bot remembers about one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<i64>,
}

impl UserRecord {
    /// In-memory default for a user with no stored record.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self { id: id.into(), name: None, counter: None }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Starts the swear jar at zero on first use, increments afterwards.
    pub fn bump_counter(&mut self) -> i64 {
        let next = match self.counter {
            None => 0,
            Some(current) => current.saturating_add(1),
        };
        self.counter = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::{UserId, UserRecord};

    #[test]
    fn new_record_only_carries_the_id() {
        let record = UserRecord::new("U1");
        assert_eq!(record.id, UserId::from("U1"));
        assert_eq!(record.name, None);
        assert_eq!(record.counter, None);
    }

    #[test]
    fn counter_starts_at_zero_then_increments() {
        let mut record = UserRecord::new("U1");
        assert_eq!(record.bump_counter(), 0);
        assert_eq!(record.bump_counter(), 1);
        assert_eq!(record.bump_counter(), 2);
        assert_eq!(record.counter, Some(2));
    }

    #[test]
    fn bumping_keeps_the_stored_name() {
        let mut record = UserRecord::new("U1");
        record.set_name("Ah Beng");
        record.bump_counter();
        assert_eq!(record.name.as_deref(), Some("Ah Beng"));
    }

    #[test]
    fn json_shape_omits_absent_fields() {
        let mut record = UserRecord::new("U1");
        record.set_name("Siti");

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json, serde_json::json!({ "id": "U1", "name": "Siti" }));

        let parsed: UserRecord =
            serde_json::from_str(r#"{"id":"U2","counter":4}"#).expect("deserialize");
        assert_eq!(parsed.counter, Some(4));
        assert_eq!(parsed.name, None);
    }
}
