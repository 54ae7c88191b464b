mod contents;
mod reviews;
mod tags;

use std::{fmt::Display, str::FromStr};

pub use contents::*;
pub use reviews::*;
pub use tags::*;

use serde::{Deserialize, Serialize};

use crate::{
    time::{self, Timestamp},
    validation::{check_length, check_max_length, check_range},
    DomainError, DomainResult, Key, MemberId,
};

pub type RoadmapId = Key<Roadmap>;
pub type CategoryId = Key<RoadmapCategory>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadmapStatus {
    Created,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadmapDifficulty {
    VeryEasy,
    Easy,
    Normal,
    Difficult,
    VeryDifficult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapCategory {
    pub id: CategoryId,
    pub name: String,
}

/// An authored, multi-step plan.
///
/// Bounds on title, introduction, body and required period are checked on
/// construction and hold for the lifetime of the roadmap. Contents, tags and
/// reviews only change through the roadmap's own methods.
#[derive(Debug, Clone)]
pub struct Roadmap {
    id: Option<RoadmapId>,
    title: String,
    introduction: String,
    body: Option<String>,
    required_period: i32,
    difficulty: RoadmapDifficulty,
    status: RoadmapStatus,
    creator: MemberId,
    category: CategoryId,
    contents: RoadmapContents,
    tags: RoadmapTags,
    reviews: RoadmapReviews,
    created_at: Timestamp,
}

/// Everything needed to rebuild a persisted roadmap
#[derive(Debug, Clone)]
pub struct RoadmapParts {
    pub id: RoadmapId,
    pub title: String,
    pub introduction: String,
    pub body: Option<String>,
    pub required_period: i32,
    pub difficulty: RoadmapDifficulty,
    pub status: RoadmapStatus,
    pub creator: MemberId,
    pub category: CategoryId,
    pub created_at: Timestamp,
    /// In ordinal order
    pub nodes: Vec<RoadmapNode>,
    pub tags: Vec<RoadmapTag>,
    pub reviews: Vec<RoadmapReview>,
}

impl Roadmap {
    const TITLE_MIN_LENGTH: usize = 1;
    const TITLE_MAX_LENGTH: usize = 40;
    const INTRODUCTION_MIN_LENGTH: usize = 1;
    const INTRODUCTION_MAX_LENGTH: usize = 150;
    const BODY_MAX_LENGTH: usize = 2000;
    const REQUIRED_MIN_PERIOD: i32 = 0;
    const REQUIRED_MAX_PERIOD: i32 = 1000;

    pub fn create(
        title: impl Into<String>,
        introduction: impl Into<String>,
        body: Option<String>,
        required_period: i32,
        difficulty: RoadmapDifficulty,
        creator: MemberId,
        category: CategoryId,
    ) -> DomainResult<Self> {
        let title = title.into();
        let introduction = introduction.into();

        check_length(
            "title",
            &title,
            Self::TITLE_MIN_LENGTH,
            Self::TITLE_MAX_LENGTH,
        )?;
        check_length(
            "introduction",
            &introduction,
            Self::INTRODUCTION_MIN_LENGTH,
            Self::INTRODUCTION_MAX_LENGTH,
        )?;
        if let Some(body) = &body {
            check_max_length("body", body, Self::BODY_MAX_LENGTH)?;
        }
        check_range(
            "required period",
            required_period,
            Self::REQUIRED_MIN_PERIOD,
            Self::REQUIRED_MAX_PERIOD,
        )?;

        Ok(Self {
            id: None,
            title,
            introduction,
            body,
            required_period,
            difficulty,
            status: RoadmapStatus::Created,
            creator,
            category,
            contents: Default::default(),
            tags: Default::default(),
            reviews: Default::default(),
            created_at: time::now(),
        })
    }

    /// Rebuilds a persisted roadmap, running the same validation as [Roadmap::create]
    pub fn restore(parts: RoadmapParts) -> DomainResult<Self> {
        let mut roadmap = Self::create(
            parts.title,
            parts.introduction,
            parts.body,
            parts.required_period,
            parts.difficulty,
            parts.creator,
            parts.category,
        )?;

        roadmap.id = Some(parts.id);
        roadmap.status = parts.status;
        roadmap.created_at = time::truncate(parts.created_at);

        for node in parts.nodes {
            roadmap.add_content(node)?;
        }

        roadmap.add_tags(RoadmapTags::new(parts.tags)?)?;

        for review in parts.reviews {
            roadmap.add_review(review)?;
        }

        Ok(roadmap)
    }

    /// Appends a step. The node is bound to this roadmap unless it already is.
    pub fn add_content(&mut self, mut node: RoadmapNode) -> DomainResult<()> {
        if let Some(other) = node.roadmap().filter(|r| Some(*r) != self.id) {
            return Err(DomainError::Validation(format!(
                "roadmap node already belongs to roadmap {other}"
            )));
        }

        if let Some(id) = self.id.filter(|_| node.is_not_same_roadmap(self.id)) {
            node.bind_roadmap(id)?;
        }

        self.contents.add(node);
        Ok(())
    }

    /// Merges tags by name. The merged set still holds at most five tags.
    pub fn add_tags(&mut self, tags: RoadmapTags) -> DomainResult<()> {
        self.tags.add_all(tags)
    }

    /// Adds a review. A member reviews a roadmap at most once.
    pub fn add_review(&mut self, mut review: RoadmapReview) -> DomainResult<()> {
        if self.reviews.has_review_by(review.member()) {
            return Err(DomainError::Conflict(format!(
                "member {} already reviewed this roadmap",
                review.member()
            )));
        }

        if let Some(other) = review.roadmap().filter(|r| Some(*r) != self.id) {
            return Err(DomainError::Validation(format!(
                "review already belongs to roadmap {other}"
            )));
        }

        if let Some(id) = self.id.filter(|_| review.is_not_same_roadmap(self.id)) {
            review.bind_roadmap(id)?;
        }

        self.reviews.add(review);
        Ok(())
    }

    /// Marks the roadmap as deleted. Deleting twice is an error.
    pub fn delete(&mut self) -> DomainResult<()> {
        if self.is_deleted() {
            return Err(DomainError::Conflict(
                "roadmap is already deleted".to_string(),
            ));
        }

        self.status = RoadmapStatus::Deleted;
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.status == RoadmapStatus::Deleted
    }

    pub fn is_creator(&self, member: MemberId) -> bool {
        self.creator == member
    }

    pub fn find_last_roadmap_content(&self) -> Option<&RoadmapNode> {
        self.contents.find_last_roadmap_content()
    }

    pub fn id(&self) -> Option<RoadmapId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn introduction(&self) -> &str {
        &self.introduction
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn required_period(&self) -> i32 {
        self.required_period
    }

    pub fn difficulty(&self) -> RoadmapDifficulty {
        self.difficulty
    }

    pub fn status(&self) -> RoadmapStatus {
        self.status
    }

    pub fn creator(&self) -> MemberId {
        self.creator
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn contents(&self) -> &RoadmapContents {
        &self.contents
    }

    pub fn tags(&self) -> &RoadmapTags {
        &self.tags
    }

    pub fn reviews(&self) -> &RoadmapReviews {
        &self.reviews
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl RoadmapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Deleted => "DELETED",
        }
    }
}

impl Display for RoadmapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadmapStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "DELETED" => Ok(Self::Deleted),
            other => Err(DomainError::Validation(format!(
                "unknown roadmap status {other}"
            ))),
        }
    }
}

impl RoadmapDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryEasy => "VERY_EASY",
            Self::Easy => "EASY",
            Self::Normal => "NORMAL",
            Self::Difficult => "DIFFICULT",
            Self::VeryDifficult => "VERY_DIFFICULT",
        }
    }
}

impl FromStr for RoadmapDifficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERY_EASY" => Ok(Self::VeryEasy),
            "EASY" => Ok(Self::Easy),
            "NORMAL" => Ok(Self::Normal),
            "DIFFICULT" => Ok(Self::Difficult),
            "VERY_DIFFICULT" => Ok(Self::VeryDifficult),
            other => Err(DomainError::Validation(format!(
                "unknown roadmap difficulty {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{time, CategoryId, DomainError, MemberId};

    use super::{
        Roadmap, RoadmapDifficulty, RoadmapId, RoadmapNode, RoadmapNodeId, RoadmapParts,
        RoadmapReview, RoadmapStatus, RoadmapTag, RoadmapTags,
    };

    fn roadmap_with_title(title: &str) -> Result<Roadmap, DomainError> {
        Roadmap::create(
            title,
            "introduction",
            None,
            30,
            RoadmapDifficulty::Normal,
            MemberId::new(1),
            CategoryId::new(1),
        )
    }

    fn persisted_roadmap(id: i32) -> Roadmap {
        Roadmap::restore(RoadmapParts {
            id: RoadmapId::new(id),
            title: "persisted".to_string(),
            introduction: "introduction".to_string(),
            body: Some("body".to_string()),
            required_period: 10,
            difficulty: RoadmapDifficulty::Easy,
            status: RoadmapStatus::Created,
            creator: MemberId::new(1),
            category: CategoryId::new(1),
            created_at: time::now(),
            nodes: vec![RoadmapNode::restore(RoadmapNodeId::new(10), "step", "do it").unwrap()],
            tags: vec![],
            reviews: vec![],
        })
        .unwrap()
    }

    #[test]
    fn title_length_bounds() {
        assert!(roadmap_with_title("a").is_ok());
        assert!(roadmap_with_title(&"a".repeat(40)).is_ok());

        for invalid in [String::new(), "a".repeat(41)] {
            let error = roadmap_with_title(&invalid).unwrap_err();
            assert_eq!(error.to_string(), "title length must be between 1 and 40");
        }
    }

    #[test]
    fn introduction_body_and_period_bounds() {
        let introduction = Roadmap::create(
            "title",
            "a".repeat(151),
            None,
            0,
            RoadmapDifficulty::Easy,
            MemberId::new(1),
            CategoryId::new(1),
        );
        assert_eq!(
            introduction.unwrap_err().to_string(),
            "introduction length must be between 1 and 150"
        );

        let body = Roadmap::create(
            "title",
            "intro",
            Some("a".repeat(2001)),
            0,
            RoadmapDifficulty::Easy,
            MemberId::new(1),
            CategoryId::new(1),
        );
        assert_eq!(
            body.unwrap_err().to_string(),
            "body length must be at most 2000"
        );

        for period in [-1, 1001] {
            let error = Roadmap::create(
                "title",
                "intro",
                None,
                period,
                RoadmapDifficulty::Easy,
                MemberId::new(1),
                CategoryId::new(1),
            )
            .unwrap_err();
            assert_eq!(
                error.to_string(),
                "required period must be between 0 and 1000"
            );
        }
    }

    #[test]
    fn new_roadmaps_are_created() {
        let roadmap = roadmap_with_title("title").unwrap();

        assert_eq!(roadmap.status(), RoadmapStatus::Created);
        assert!(roadmap.is_creator(MemberId::new(1)));
        assert!(!roadmap.is_creator(MemberId::new(2)));
    }

    #[test]
    fn last_content_is_the_last_added_node() {
        let mut roadmap = roadmap_with_title("title").unwrap();
        assert!(roadmap.find_last_roadmap_content().is_none());

        roadmap
            .add_content(RoadmapNode::new("first", "start here").unwrap())
            .unwrap();
        roadmap
            .add_content(RoadmapNode::new("second", "then this").unwrap())
            .unwrap();

        let last = roadmap.find_last_roadmap_content().unwrap();
        assert_eq!(last.title(), "second");
        assert_eq!(last.ordinal(), 2);
    }

    #[test]
    fn nodes_are_bound_once() {
        let mut roadmap = persisted_roadmap(5);

        let node = roadmap.find_last_roadmap_content().unwrap();
        assert_eq!(node.roadmap(), Some(RoadmapId::new(5)));

        roadmap
            .add_content(RoadmapNode::new("next", "more").unwrap())
            .unwrap();
        assert_eq!(
            roadmap.find_last_roadmap_content().unwrap().roadmap(),
            Some(RoadmapId::new(5))
        );

        let foreign = persisted_roadmap(6)
            .find_last_roadmap_content()
            .cloned()
            .unwrap();
        assert!(roadmap.add_content(foreign).is_err());
    }

    #[test]
    fn a_member_reviews_once() {
        let mut roadmap = persisted_roadmap(5);
        let member = MemberId::new(2);

        roadmap
            .add_review(RoadmapReview::new(member, None, 4.0, time::now()).unwrap())
            .unwrap();
        let again = roadmap.add_review(RoadmapReview::new(member, None, 1.0, time::now()).unwrap());

        assert!(matches!(again, Err(DomainError::Conflict(_))));
        assert_eq!(
            roadmap.reviews().iter().next().unwrap().roadmap(),
            Some(RoadmapId::new(5))
        );
    }

    #[test]
    fn merging_tags_dedupes_by_name() {
        let mut roadmap = roadmap_with_title("title").unwrap();
        let first = vec![RoadmapTag::new("rust").unwrap()];
        let second = vec![
            RoadmapTag::new("rust").unwrap(),
            RoadmapTag::new("web").unwrap(),
        ];

        roadmap.add_tags(RoadmapTags::new(first).unwrap()).unwrap();
        roadmap.add_tags(RoadmapTags::new(second).unwrap()).unwrap();

        assert_eq!(roadmap.tags().len(), 2);
    }

    #[test]
    fn merged_tags_stay_within_five_and_restore() {
        let tags = |names: &[&str]| {
            RoadmapTags::new(names.iter().map(|n| RoadmapTag::new(*n).unwrap()).collect())
                .unwrap()
        };

        let mut roadmap = roadmap_with_title("title").unwrap();
        roadmap.add_tags(tags(&["a", "b", "c"])).unwrap();

        let error = roadmap.add_tags(tags(&["d", "e", "f"])).unwrap_err();
        assert_eq!(error.to_string(), "max 5 tags");
        assert_eq!(roadmap.tags().len(), 3);

        roadmap.add_tags(tags(&["d", "e"])).unwrap();
        let stored: Vec<_> = roadmap.tags().iter().cloned().collect();
        assert_eq!(stored.len(), 5);

        let restored = Roadmap::restore(RoadmapParts {
            id: RoadmapId::new(1),
            title: "title".to_string(),
            introduction: "intro".to_string(),
            body: None,
            required_period: 10,
            difficulty: RoadmapDifficulty::Normal,
            status: RoadmapStatus::Created,
            creator: MemberId::new(1),
            category: CategoryId::new(1),
            created_at: time::now(),
            nodes: vec![],
            tags: stored,
            reviews: vec![],
        })
        .unwrap();
        assert_eq!(restored.tags().len(), 5);
    }

    #[test]
    fn six_tags_are_rejected() {
        let candidates = ["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(|n| RoadmapTag::new(n).unwrap())
            .collect();

        assert_eq!(
            RoadmapTags::new(candidates).unwrap_err().to_string(),
            "max 5 tags"
        );
    }

    #[test]
    fn deleting_flips_status_once() {
        let mut roadmap = roadmap_with_title("title").unwrap();

        roadmap.delete().unwrap();
        assert!(roadmap.is_deleted());
        assert!(matches!(roadmap.delete(), Err(DomainError::Conflict(_))));
    }
}
