use crate::{
    time::{self, Timestamp},
    validation::check_max_length,
    DomainResult, ImageContentType, Key, MemberId, RoadmapNodeId,
};

use super::GoalRoomId;

pub type CheckFeedId = Key<CheckFeed>;

/// Identifies one member's seat in one goal room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalRoomMemberKey {
    pub goal_room: GoalRoomId,
    pub member: MemberId,
}

/// A file that has been written to the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub server_file_path: String,
    pub content_type: ImageContentType,
    pub original_file_name: String,
}

/// Proof of progress on a roadmap node. Immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFeed {
    id: Option<CheckFeedId>,
    file: StoredFile,
    description: Option<String>,
    roadmap_node: RoadmapNodeId,
    goal_room_member: GoalRoomMemberKey,
    created_at: Timestamp,
}

impl CheckFeed {
    const DESCRIPTION_MAX_LENGTH: usize = 300;

    /// Builds a feed for an already authorized member and node.
    /// See [crate::GoalRoom::authorize_check_feed].
    pub fn submit(
        goal_room_member: GoalRoomMemberKey,
        roadmap_node: RoadmapNodeId,
        file: StoredFile,
        description: Option<String>,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        if let Some(description) = &description {
            check_max_length(
                "check feed description",
                description,
                Self::DESCRIPTION_MAX_LENGTH,
            )?;
        }

        Ok(Self {
            id: None,
            file,
            description,
            roadmap_node,
            goal_room_member,
            created_at: time::truncate(created_at),
        })
    }

    pub fn restore(
        id: CheckFeedId,
        goal_room_member: GoalRoomMemberKey,
        roadmap_node: RoadmapNodeId,
        file: StoredFile,
        description: Option<String>,
        created_at: Timestamp,
    ) -> DomainResult<Self> {
        let mut feed = Self::submit(goal_room_member, roadmap_node, file, description, created_at)?;
        feed.id = Some(id);

        Ok(feed)
    }

    pub fn id(&self) -> Option<CheckFeedId> {
        self.id
    }

    pub fn file(&self) -> &StoredFile {
        &self.file
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn roadmap_node(&self) -> RoadmapNodeId {
        self.roadmap_node
    }

    pub fn goal_room_member(&self) -> GoalRoomMemberKey {
        self.goal_room_member
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn is_owned_by(&self, member: MemberId) -> bool {
        self.goal_room_member.member == member
    }
}
