//! Resource metadata (`Resource.meta`) and codings
//!
//! [`Meta::merge`] and [`Meta::remove`] follow the server-side semantics of the
//! `$meta-add` and `$meta-delete` operations, so a local copy can be kept in
//! step with what the server will hold after the operation.

use serde::{Deserialize, Serialize};

/// A code from a code system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Create a coding from a system and a code
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }

    /// Set the display text
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// True when system and code are equal; display is not compared
    pub fn same_concept(&self, other: &Coding) -> bool {
        self.system == other.system && self.code == other.code
    }

    fn is(&self, system: &str, code: &str) -> bool {
        self.system.as_deref() == Some(system) && self.code.as_deref() == Some(code)
    }
}

/// Metadata about a resource: version, profiles, security labels and tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<Coding>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile URI
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile.push(profile.into());
        self
    }

    /// Add a security label
    pub fn with_security(mut self, coding: Coding) -> Self {
        self.security.push(coding);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, coding: Coding) -> Self {
        self.tag.push(coding);
        self
    }

    pub fn has_profile(&self, profile: &str) -> bool {
        self.profile.iter().any(|p| p == profile)
    }

    pub fn has_tag(&self, system: &str, code: &str) -> bool {
        self.tag.iter().any(|c| c.is(system, code))
    }

    pub fn has_security(&self, system: &str, code: &str) -> bool {
        self.security.iter().any(|c| c.is(system, code))
    }

    /// True when there are no profiles, security labels or tags
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty() && self.security.is_empty() && self.tag.is_empty()
    }

    /// Adds every profile, security label and tag of `other` not already present
    ///
    /// Existing entries keep their position; new ones are appended in the
    /// order they appear in `other`. Version and timestamp are left alone.
    pub fn merge(&mut self, other: &Meta) {
        for profile in &other.profile {
            if !self.has_profile(profile) {
                self.profile.push(profile.clone());
            }
        }
        merge_codings(&mut self.security, &other.security);
        merge_codings(&mut self.tag, &other.tag);
    }

    /// Removes every profile, security label and tag that appears in `other`
    ///
    /// Codings match on system and code only.
    pub fn remove(&mut self, other: &Meta) {
        self.profile.retain(|p| !other.profile.contains(p));
        self.security
            .retain(|c| !other.security.iter().any(|o| o.same_concept(c)));
        self.tag.retain(|c| !other.tag.iter().any(|o| o.same_concept(c)));
    }

    /// Copy holding only profiles, security labels and tags
    pub fn labels_only(&self) -> Meta {
        Meta {
            version_id: None,
            last_updated: None,
            ..self.clone()
        }
    }
}

fn merge_codings(target: &mut Vec<Coding>, additions: &[Coding]) {
    for coding in additions {
        if !target.iter().any(|c| c.same_concept(coding)) {
            target.push(coding.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_set() -> Meta {
        Meta::new()
            .with_profile("http://someserver.org/fhir/Profile/XYZ1")
            .with_security(Coding::new("http://mysystem.com/sec", "1234"))
            .with_tag(Coding::new("http://mysystem.com/tag", "sometag1"))
    }

    fn second_set() -> Meta {
        Meta::new()
            .with_profile("http://someserver.org/fhir/Profile/XYZ2")
            .with_security(Coding::new("http://mysystem.com/sec", "5678"))
            .with_tag(Coding::new("http://mysystem.com/tag", "sometag2"))
    }

    #[test]
    fn test_merge_adds_new_entries() {
        let mut meta = first_set();
        meta.merge(&second_set());

        assert_eq!(meta.profile.len(), 2);
        assert!(meta.has_profile("http://someserver.org/fhir/Profile/XYZ2"));
        assert!(meta.has_security("http://mysystem.com/sec", "5678"));
        assert!(meta.has_tag("http://mysystem.com/tag", "sometag1"));
        assert!(meta.has_tag("http://mysystem.com/tag", "sometag2"));
    }

    #[test]
    fn test_merge_does_not_duplicate() {
        let mut meta = first_set();
        let again = first_set().with_tag(
            Coding::new("http://mysystem.com/tag", "sometag1").with_display("other display"),
        );
        meta.merge(&again);

        assert_eq!(meta.profile.len(), 1);
        assert_eq!(meta.security.len(), 1);
        assert_eq!(meta.tag.len(), 1);
    }

    #[test]
    fn test_remove_restores_previous_state() {
        let mut meta = first_set();
        meta.merge(&second_set());
        meta.remove(&second_set());

        assert_eq!(meta, first_set());
        assert!(!meta.has_profile("http://someserver.org/fhir/Profile/XYZ2"));
        assert!(!meta.has_tag("http://mysystem.com/tag", "sometag2"));
    }

    #[test]
    fn test_remove_ignores_display() {
        let mut meta = Meta::new()
            .with_tag(Coding::new("http://mysystem.com/tag", "a").with_display("Shown"));
        meta.remove(&Meta::new().with_tag(Coding::new("http://mysystem.com/tag", "a")));
        assert!(meta.tag.is_empty());
    }

    #[test]
    fn test_merge_keeps_version() {
        let mut meta = Meta {
            version_id: Some("3".to_string()),
            ..first_set()
        };
        let incoming = Meta {
            version_id: Some("9".to_string()),
            ..second_set()
        };
        meta.merge(&incoming);
        assert_eq!(meta.version_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let meta = Meta {
            version_id: Some("1".to_string()),
            last_updated: Some("2015-02-07T13:28:17.239+02:00".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["versionId"], "1");
        assert_eq!(json["lastUpdated"], "2015-02-07T13:28:17.239+02:00");
        assert!(json.get("tag").is_none());
    }
}
