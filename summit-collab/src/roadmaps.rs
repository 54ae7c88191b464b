use summit_core::{
    time, CategoryId, GoalRoomStatus, MemberId, Roadmap, RoadmapDifficulty, RoadmapId,
    RoadmapNode, RoadmapReview, RoadmapTag, RoadmapTags,
};

use crate::{BlobStore, CollabContext, CollabEvent, Database, ServiceError, ServiceResult};

pub struct Roadmaps<Db, Blob> {
    context: CollabContext<Db, Blob>,
}

#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub title: String,
    pub introduction: String,
    pub body: Option<String>,
    /// In days
    pub required_period: i32,
    pub difficulty: RoadmapDifficulty,
    pub category: CategoryId,
    /// In the order they should be run through
    pub nodes: Vec<NewRoadmapNode>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewRoadmapNode {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub content: Option<String>,
    pub rate: f64,
}

impl<Db, Blob> Roadmaps<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    pub fn new(context: &CollabContext<Db, Blob>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn roadmap(&self, roadmap_id: RoadmapId) -> ServiceResult<Roadmap> {
        Ok(self.context.database.roadmap_by_id(roadmap_id).await?)
    }

    /// Creates a roadmap with its nodes and tags
    pub async fn create(
        &self,
        creator: MemberId,
        new_roadmap: NewRoadmap,
    ) -> ServiceResult<Roadmap> {
        let database = &self.context.database;

        database.member_by_id(creator).await?;
        database.category_by_id(new_roadmap.category).await?;

        if new_roadmap.nodes.is_empty() {
            return Err(ServiceError::Validation(
                "roadmap needs at least one node".to_string(),
            ));
        }

        let mut roadmap = Roadmap::create(
            new_roadmap.title,
            new_roadmap.introduction,
            new_roadmap.body,
            new_roadmap.required_period,
            new_roadmap.difficulty,
            creator,
            new_roadmap.category,
        )?;

        for node in new_roadmap.nodes {
            roadmap.add_content(RoadmapNode::new(node.title, node.description)?)?;
        }

        let tags = new_roadmap
            .tags
            .into_iter()
            .map(RoadmapTag::new)
            .collect::<Result<Vec<_>, _>>()?;
        roadmap.add_tags(RoadmapTags::new(tags)?)?;

        let roadmap = database.save_roadmap(&roadmap).await?;

        if let Some(roadmap_id) = roadmap.id() {
            self.context
                .emit(CollabEvent::RoadmapCreated { roadmap_id, creator });
        }

        Ok(roadmap)
    }

    /// Soft deletes a roadmap. Only its creator may do this.
    pub async fn delete(&self, member: MemberId, roadmap_id: RoadmapId) -> ServiceResult<()> {
        let _guard = self.context.roadmap_locks.lock(roadmap_id).await;
        let mut roadmap = self.context.database.roadmap_by_id(roadmap_id).await?;

        if !roadmap.is_creator(member) {
            return Err(ServiceError::Forbidden(
                "only the creator can delete this roadmap".to_string(),
            ));
        }

        roadmap.delete()?;
        self.context.database.save_roadmap(&roadmap).await?;

        self.context.emit(CollabEvent::RoadmapDeleted { roadmap_id });
        Ok(())
    }

    /// Reviews a roadmap the member ran through in a completed goal room
    pub async fn write_review(
        &self,
        member: MemberId,
        roadmap_id: RoadmapId,
        new_review: NewReview,
    ) -> ServiceResult<RoadmapReview> {
        let _guard = self.context.roadmap_locks.lock(roadmap_id).await;
        let mut roadmap = self.context.database.roadmap_by_id(roadmap_id).await?;

        let completed = self
            .context
            .database
            .goal_rooms_by_roadmap(roadmap_id)
            .await?
            .iter()
            .any(|room| room.status() == GoalRoomStatus::Completed && room.is_member(member));

        if !completed {
            return Err(ServiceError::Forbidden(
                "only members of a completed goal room can review this roadmap".to_string(),
            ));
        }

        let review = RoadmapReview::new(member, new_review.content, new_review.rate, time::now())?;
        roadmap.add_review(review)?;

        let roadmap = self.context.database.save_roadmap(&roadmap).await?;
        let review = roadmap
            .reviews()
            .iter()
            .find(|review| review.member() == member)
            .cloned()
            .ok_or_else(|| ServiceError::Internal("stored review is missing".to_string()))?;

        self.context.emit(CollabEvent::RoadmapReviewed {
            roadmap_id,
            member_id: member,
        });

        Ok(review)
    }
}
