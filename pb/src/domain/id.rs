//! Domain ID generation and resolution
//!
//! All IDs use the format: `{type}-{8-char-hex}`
//! Example: `task-3fa2b1c0`

use std::collections::BTreeMap;

/// Generate a domain ID for the given entity type
///
/// The hex suffix comes from the random tail of a v7 UUID.
pub fn generate_id(domain_type: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    format!("{}-{}", domain_type, &uuid[uuid.len() - 8..])
}

/// Domain ID wrapper for type-safe ID handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(String);

impl DomainId {
    /// Create a fresh ID for the given entity type
    pub fn new(domain_type: &str) -> Self {
        Self(generate_id(domain_type))
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the type portion
    pub fn domain_type(&self) -> Option<&str> {
        self.0.split_once('-').map(|(kind, _)| kind)
    }

    /// Get the hex portion (after type)
    pub fn suffix(&self) -> &str {
        self.0.split_once('-').map(|(_, hex)| hex).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DomainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DomainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DomainId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for DomainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for DomainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Resolves user-typed references against the IDs of one arena
pub struct IdResolver<'a, T> {
    ids: &'a BTreeMap<DomainId, T>,
}

impl<'a, T> IdResolver<'a, T> {
    pub fn new(ids: &'a BTreeMap<DomainId, T>) -> Self {
        Self { ids }
    }

    /// Resolve a partial reference to a full ID
    ///
    /// Returns:
    /// - Ok(Some(id)) if exactly one match
    /// - Ok(None) if no matches
    /// - Err with candidates if ambiguous
    pub fn resolve(&self, reference: &str) -> Result<Option<DomainId>, Vec<DomainId>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }

        // Exact match wins even if it is also a prefix of something else
        if let Some((id, _)) = self.ids.get_key_value(&DomainId::from(reference)) {
            return Ok(Some(id.clone()));
        }

        let mut matches: Vec<DomainId> = self
            .ids
            .keys()
            .filter(|id| Self::matches(id, reference))
            .cloned()
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(matches),
        }
    }

    fn matches(id: &DomainId, reference: &str) -> bool {
        id.as_str().starts_with(reference) || id.suffix().starts_with(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(ids: &[&str]) -> BTreeMap<DomainId, ()> {
        ids.iter().map(|id| (DomainId::from(*id), ())).collect()
    }

    #[test]
    fn test_generate_id() {
        let id = generate_id("task");
        assert!(id.starts_with("task-"));
        assert_eq!(id.len(), "task-".len() + 8);
        assert!(id["task-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = DomainId::new("task");
        let b = DomainId::new("task");
        assert_ne!(a, b);
    }

    #[test]
    fn test_domain_id_parts() {
        let id = DomainId::from("milestone-0a1b2c3d");
        assert_eq!(id.domain_type(), Some("milestone"));
        assert_eq!(id.suffix(), "0a1b2c3d");
    }

    #[test]
    fn test_id_resolver_exact() {
        let ids = arena(&["task-0a1b2c3d", "task-0a1b2c3e"]);
        let resolver = IdResolver::new(&ids);
        assert_eq!(
            resolver.resolve("task-0a1b2c3d").unwrap(),
            Some(DomainId::from("task-0a1b2c3d"))
        );
    }

    #[test]
    fn test_id_resolver_hex_prefix() {
        let ids = arena(&["task-0a1b2c3d", "task-ffee0011"]);
        let resolver = IdResolver::new(&ids);
        assert_eq!(resolver.resolve("ffe").unwrap(), Some(DomainId::from("task-ffee0011")));
        assert_eq!(resolver.resolve("task-0a").unwrap(), Some(DomainId::from("task-0a1b2c3d")));
    }

    #[test]
    fn test_id_resolver_ambiguous() {
        let ids = arena(&["task-0a1b2c3d", "task-0a1b2c3e", "task-99999999"]);
        let resolver = IdResolver::new(&ids);
        let candidates = resolver.resolve("0a1b").unwrap_err();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_id_resolver_no_match() {
        let ids = arena(&["task-0a1b2c3d"]);
        let resolver = IdResolver::new(&ids);
        assert_eq!(resolver.resolve("nonexistent").unwrap(), None);
        assert_eq!(resolver.resolve("  ").unwrap(), None);
    }
}
