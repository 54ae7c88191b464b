use crate::{
    time::{self, Timestamp},
    validation::check_max_length,
    DomainError, DomainResult, Key, MemberId,
};

use super::RoadmapId;

pub type RoadmapReviewId = Key<RoadmapReview>;

/// A member's verdict on a roadmap they ran through
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapReview {
    id: Option<RoadmapReviewId>,
    roadmap: Option<RoadmapId>,
    member: MemberId,
    content: Option<String>,
    rate: f64,
    created_at: Timestamp,
}

impl RoadmapReview {
    const CONTENT_MAX_LENGTH: usize = 1000;
    const MIN_RATE: f64 = 0.0;
    const MAX_RATE: f64 = 5.0;

    pub fn new(
        member: MemberId,
        content: Option<String>,
        rate: f64,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        if let Some(content) = &content {
            check_max_length("review content", content, Self::CONTENT_MAX_LENGTH)?;
        }

        // Rates go in half steps
        let in_range = (Self::MIN_RATE..=Self::MAX_RATE).contains(&rate);
        if !in_range || (rate * 2.0).fract() != 0.0 {
            return Err(DomainError::validation(
                "rate must be between 0 and 5 in steps of 0.5",
            ));
        }

        Ok(Self {
            id: None,
            roadmap: None,
            member,
            content,
            rate,
            created_at: time::truncate(created_at),
        })
    }

    pub fn restore(
        id: RoadmapReviewId,
        member: MemberId,
        content: Option<String>,
        rate: f64,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        let mut review = Self::new(member, content, rate, created_at)?;
        review.id = Some(id);

        Ok(review)
    }

    pub fn id(&self) -> Option<RoadmapReviewId> {
        self.id
    }

    pub fn roadmap(&self) -> Option<RoadmapId> {
        self.roadmap
    }

    pub fn member(&self) -> MemberId {
        self.member
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub(crate) fn is_not_same_roadmap(&self, roadmap: Option<RoadmapId>) -> bool {
        self.roadmap != roadmap
    }

    pub(crate) fn bind_roadmap(&mut self, roadmap: RoadmapId) -> DomainResult<()> {
        match self.roadmap {
            Some(existing) if existing != roadmap => Err(DomainError::Validation(format!(
                "review already belongs to roadmap {existing}"
            ))),
            _ => {
                self.roadmap = Some(roadmap);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoadmapReviews {
    values: Vec<RoadmapReview>,
}

impl RoadmapReviews {
    pub(crate) fn add(&mut self, review: RoadmapReview) {
        self.values.push(review);
    }

    pub fn has_review_by(&self, member: MemberId) -> bool {
        self.values.iter().any(|review| review.member == member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadmapReview> {
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
    use crate::{time, MemberId};

    use super::RoadmapReview;

    #[test]
    fn rate_goes_in_half_steps() {
        let member = MemberId::new(1);

        assert!(RoadmapReview::new(member, None, 4.5, time::now()).is_ok());
        assert!(RoadmapReview::new(member, None, 0.0, time::now()).is_ok());
        assert!(RoadmapReview::new(member, None, 4.3, time::now()).is_err());
        assert!(RoadmapReview::new(member, None, 5.5, time::now()).is_err());
        assert!(RoadmapReview::new(member, Some("a".repeat(1001)), 3.0, time::now()).is_err());
    }
}
