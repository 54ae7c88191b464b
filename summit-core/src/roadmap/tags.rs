use std::collections::HashSet;

use crate::{validation::check_length, DomainError, DomainResult, Key};

pub type RoadmapTagId = Key<RoadmapTag>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoadmapTagName(String);

impl RoadmapTagName {
    const MIN_LENGTH: usize = 1;
    const MAX_LENGTH: usize = 10;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into().trim().to_string();
        check_length("tag name", &value, Self::MIN_LENGTH, Self::MAX_LENGTH)?;

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapTag {
    id: Option<RoadmapTagId>,
    name: RoadmapTagName,
}

impl RoadmapTag {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            id: None,
            name: RoadmapTagName::new(name)?,
        })
    }

    pub fn restore(id: RoadmapTagId, name: impl Into<String>) -> DomainResult<Self> {
        let mut tag = Self::new(name)?;
        tag.id = Some(id);

        Ok(tag)
    }

    pub fn id(&self) -> Option<RoadmapTagId> {
        self.id
    }

    pub fn name(&self) -> &RoadmapTagName {
        &self.name
    }
}

/// The tags of a roadmap: at most five, names unique.
#[derive(Debug, Clone, Default)]
pub struct RoadmapTags {
    values: Vec<RoadmapTag>,
}

impl RoadmapTags {
    pub const MAX_COUNT: usize = 5;

    /// Validates the candidate list as given, before anything is deduplicated.
    pub fn new(candidates: Vec<RoadmapTag>) -> DomainResult<Self> {
        if candidates.len() > Self::MAX_COUNT {
            return Err(DomainError::Validation(format!(
                "max {} tags",
                Self::MAX_COUNT
            )));
        }

        let unique_names: HashSet<_> = candidates.iter().map(|tag| &tag.name).collect();

        if unique_names.len() != candidates.len() {
            return Err(DomainError::validation("tag names must be unique"));
        }

        Ok(Self { values: candidates })
    }

    /// Merges already validated tags. Tags whose name is present are skipped.
    /// Nothing is merged when the result would hold more than five tags.
    pub(crate) fn add_all(&mut self, tags: RoadmapTags) -> DomainResult<()> {
        let new_tags: Vec<_> = tags
            .values
            .into_iter()
            .filter(|tag| !self.contains_name(&tag.name))
            .collect();

        if self.values.len() + new_tags.len() > Self::MAX_COUNT {
            return Err(DomainError::Validation(format!(
                "max {} tags",
                Self::MAX_COUNT
            )));
        }

        self.values.extend(new_tags);
        Ok(())
    }

    pub fn contains_name(&self, name: &RoadmapTagName) -> bool {
        self.values.iter().any(|tag| &tag.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadmapTag> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::{RoadmapTag, RoadmapTags};

    fn tags(names: &[&str]) -> Vec<RoadmapTag> {
        names.iter().map(|n| RoadmapTag::new(*n).unwrap()).collect()
    }

    #[test]
    fn five_distinct_tags_are_accepted() {
        let result = RoadmapTags::new(tags(&["rust", "java", "go", "kotlin", "swift"]));
        assert_eq!(result.unwrap().len(), 5);
    }

    #[test]
    fn more_than_five_tags_fail() {
        let error = RoadmapTags::new(tags(&["a", "b", "c", "d", "e", "f"])).unwrap_err();
        assert_eq!(error.to_string(), "max 5 tags");
    }

    #[test]
    fn duplicate_names_fail_case_sensitively() {
        let error = RoadmapTags::new(tags(&["rust", "rust"])).unwrap_err();
        assert_eq!(error.to_string(), "tag names must be unique");

        assert!(RoadmapTags::new(tags(&["rust", "Rust"])).is_ok());
    }

    #[test]
    fn tag_name_length() {
        assert!(RoadmapTag::new("").is_err());
        assert!(RoadmapTag::new("   ").is_err());
        assert!(RoadmapTag::new("abcdefghijk").is_err());
        assert_eq!(RoadmapTag::new(" rust ").unwrap().name().as_str(), "rust");
    }

    #[test]
    fn merging_dedupes_by_name() {
        let mut existing = RoadmapTags::new(tags(&["rust", "go"])).unwrap();
        existing
            .add_all(RoadmapTags::new(tags(&["go", "zig"])).unwrap())
            .unwrap();

        let names: Vec<_> = existing.iter().map(|t| t.name().as_str()).collect();
        assert_eq!(names, vec!["rust", "go", "zig"]);
    }

    #[test]
    fn merging_past_five_tags_fails_and_keeps_the_old_set() {
        let mut existing = RoadmapTags::new(tags(&["a", "b", "c"])).unwrap();
        let error = existing
            .add_all(RoadmapTags::new(tags(&["d", "e", "f"])).unwrap())
            .unwrap_err();

        assert_eq!(error.to_string(), "max 5 tags");
        assert_eq!(existing.len(), 3);

        existing
            .add_all(RoadmapTags::new(tags(&["c", "d", "e"])).unwrap())
            .unwrap();
        assert_eq!(existing.len(), 5);
    }
}
