//! Roster data types and directory error definitions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

/// Member identifier as issued by the upstream directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single community member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    /// Role ids held by the member.
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Unordered set of members keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet {
    members: HashMap<MemberId, Member>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert a member, replacing any previous record with the same id.
    pub fn insert(&mut self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    pub fn get(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Union another set into this one. Records from `other` win on conflict.
    pub fn merge(&mut self, other: MemberSet) {
        self.members.extend(other.members);
    }

    /// Members holding `role`.
    pub fn with_role(&self, role: &str) -> MemberSet {
        self.iter()
            .filter(|m| m.has_role(role))
            .cloned()
            .collect()
    }

    /// Narrow by an optional role filter; `None` keeps everything.
    pub fn filtered(self, filter: Option<&str>) -> MemberSet {
        match filter {
            Some(role) => self.with_role(role),
            None => self,
        }
    }
}

impl FromIterator<Member> for MemberSet {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        let mut set = MemberSet::new();
        for member in iter {
            set.insert(member);
        }
        set
    }
}

impl Extend<Member> for MemberSet {
    fn extend<I: IntoIterator<Item = Member>>(&mut self, iter: I) {
        for member in iter {
            self.insert(member);
        }
    }
}

/// One page of the upstream roster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterPage {
    pub members: Vec<Member>,
    /// Cursor for the next page; `None` means the roster is exhausted.
    #[serde(default)]
    pub next_cursor: Option<MemberId>,
}

/// Errors raised by a roster directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport-level failure talking to the directory.
    #[error("directory request failed: {0}")]
    Transport(String),

    /// Directory answered with a non-success status.
    #[error("directory returned status {0}")]
    Status(u16),

    /// Directory payload could not be decoded.
    #[error("invalid directory payload: {0}")]
    Decode(String),

    /// Retryable failures persisted past the retry budget.
    #[error("directory still failing after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<DirectoryError> },

    /// Bad client configuration (e.g. base URL).
    #[error("directory misconfigured: {0}")]
    Config(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> MemberSet {
        vec![
            Member::new("1", "ada").with_role("mod"),
            Member::new("2", "brian"),
            Member::new("3", "cleo").with_role("mod").with_role("veteran"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_with_role() {
        let mods = roster().with_role("mod");
        assert_eq!(mods.len(), 2);
        assert!(mods.contains(&MemberId::from("1")));
        assert!(!mods.contains(&MemberId::from("2")));
        assert!(roster().with_role("nobody").is_empty());
    }

    #[test]
    fn test_filtered_none_keeps_all() {
        assert_eq!(roster().filtered(None).len(), 3);
        assert_eq!(roster().filtered(Some("veteran")).len(), 1);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut set = roster();
        set.insert(Member::new("2", "brian-renamed"));
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.get(&MemberId::from("2")).map(|m| m.display_name.as_str()),
            Some("brian-renamed")
        );
    }

    #[test]
    fn test_merge_unions_pages() {
        let mut set = roster();
        let page: MemberSet = vec![
            Member::new("3", "cleo renamed"),
            Member::new("4", "dana").with_role("mod"),
        ]
        .into_iter()
        .collect();

        set.merge(page);

        assert_eq!(set.len(), 4);
        assert_eq!(set.get(&MemberId::from("3")).unwrap().display_name, "cleo renamed");
        assert_eq!(set.with_role("mod").len(), 2);
    }

    #[test]
    fn test_member_set_serializes_as_map() {
        let json = serde_json::to_value(roster()).unwrap();
        assert!(json.is_object());
        assert_eq!(json["3"]["display_name"], "cleo");
    }

    #[test]
    fn test_error_display() {
        let err = DirectoryError::Exhausted {
            attempts: 3,
            last: Box::new(DirectoryError::Status(429)),
        };
        assert_eq!(
            err.to_string(),
            "directory still failing after 3 attempts: directory returned status 429"
        );
    }
}
