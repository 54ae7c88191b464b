use async_trait::async_trait;
use chrono::NaiveDate;
use summit_core::{
    time::Timestamp, CategoryId, CheckFeed, CheckFeedId, DomainError, GoalRoom, GoalRoomId,
    GoalRoomMemberKey, GoalRoomToDoId, Member, MemberId, NewMember, Roadmap, RoadmapCategory,
    RoadmapId,
};
use thiserror::Error;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    /// Maps unique violations to a conflict on `field`
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A stored row that no longer passes domain validation
impl From<DomainError> for DatabaseError {
    fn from(value: DomainError) -> Self {
        Self::Internal(Box::new(value))
    }
}

/// Represents a type that can store summit data.
///
/// Aggregates are saved as a whole: `save_*` inserts an aggregate without a key
/// and replaces the stored state of one with a key, then returns what was stored.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn member_by_id(&self, member_id: MemberId) -> Result<Member>;
    async fn member_by_identifier(&self, identifier: &str) -> Result<Member>;
    async fn member_by_nickname(&self, nickname: &str) -> Result<Member>;
    async fn create_member(&self, new_member: NewMember) -> Result<Member>;

    async fn session_by_access_token(&self, token: &str) -> Result<SessionData>;
    async fn session_by_refresh_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, access_token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn category_by_id(&self, category_id: CategoryId) -> Result<RoadmapCategory>;
    async fn create_category(&self, name: &str) -> Result<RoadmapCategory>;

    async fn roadmap_by_id(&self, roadmap_id: RoadmapId) -> Result<Roadmap>;
    async fn save_roadmap(&self, roadmap: &Roadmap) -> Result<Roadmap>;

    async fn goal_room_by_id(&self, goal_room_id: GoalRoomId) -> Result<GoalRoom>;
    /// Rooms whose first node starts on `date`
    async fn goal_rooms_by_start_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>>;
    /// Rooms whose last node ends on `date`
    async fn goal_rooms_by_end_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>>;
    async fn goal_rooms_by_roadmap(&self, roadmap_id: RoadmapId) -> Result<Vec<GoalRoom>>;
    async fn save_goal_room(&self, goal_room: &GoalRoom) -> Result<GoalRoom>;
    async fn delete_goal_room(&self, goal_room_id: GoalRoomId) -> Result<()>;

    async fn check_feed_by_id(&self, check_feed_id: CheckFeedId) -> Result<CheckFeed>;
    async fn check_feeds_by_goal_room(&self, goal_room_id: GoalRoomId) -> Result<Vec<CheckFeed>>;
    async fn check_feeds_by_member(&self, key: GoalRoomMemberKey) -> Result<Vec<CheckFeed>>;
    /// Stores a new feed together with the room it changed, in one go
    async fn create_check_feed(&self, feed: &CheckFeed, goal_room: &GoalRoom) -> Result<CheckFeed>;
    async fn delete_check_feed(&self, check_feed_id: CheckFeedId, goal_room: &GoalRoom)
        -> Result<()>;

    async fn todo_check_exists(&self, todo_id: GoalRoomToDoId, key: GoalRoomMemberKey)
        -> Result<bool>;
    async fn create_todo_check(&self, todo_id: GoalRoomToDoId, key: GoalRoomMemberKey)
        -> Result<()>;
    async fn delete_todo_check(&self, todo_id: GoalRoomToDoId, key: GoalRoomMemberKey)
        -> Result<()>;
}

/// Login session data for authentication
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    /// The member that is logged in
    pub member_id: MemberId,
    pub expires_at: Timestamp,
    pub refresh_expires_at: Timestamp,
}

#[derive(Debug)]
pub struct NewSession {
    pub access_token: String,
    pub refresh_token: String,
    pub member_id: MemberId,
    pub expires_at: Timestamp,
    pub refresh_expires_at: Timestamp,
}
