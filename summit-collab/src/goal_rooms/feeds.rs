use log::warn;
use serde::Serialize;
use summit_core::{
    time::{self, Timestamp},
    CheckFeed, CheckFeedId, GoalRoomId, GoalRoomMemberKey, ImageContentType, MemberId,
    RoadmapNodeId, StoredFile,
};

use crate::{
    util::random_string, BlobStore, CollabEvent, Database, FileInformation, HttpMethod,
    ServiceError, ServiceResult,
};

use super::GoalRooms;

/// An uploaded image, as received
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_file_name: String,
    pub bytes: Vec<u8>,
    /// The MIME type the client sent
    pub content_type: String,
}

/// A check feed with a link to its image
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFeedView {
    pub id: CheckFeedId,
    pub member: MemberId,
    pub roadmap_node: RoadmapNodeId,
    pub image_url: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl<Db, Blob> GoalRooms<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    const FILE_NAME_LENGTH: usize = 16;

    /// Stores proof of progress on the node running today
    pub async fn submit_check_feed(
        &self,
        member: MemberId,
        goal_room_id: GoalRoomId,
        upload: FileUpload,
        description: Option<String>,
    ) -> ServiceResult<CheckFeed> {
        let content_type = ImageContentType::from_mime(&upload.content_type)?;

        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let database = &self.context.database;
        let mut goal_room = database.goal_room_by_id(goal_room_id).await?;

        let now = time::now();
        let today = time::today();

        let previous = database
            .check_feeds_by_member(GoalRoomMemberKey {
                goal_room: goal_room_id,
                member,
            })
            .await?;

        let submitted_today = previous
            .iter()
            .any(|feed| feed.created_at().date_naive() == today);
        let node_feed_count = goal_room
            .current_node(today)
            .map(|node| {
                previous
                    .iter()
                    .filter(|feed| feed.roadmap_node() == node.roadmap_node())
                    .count()
            })
            .unwrap_or(0);

        let (key, roadmap_node) = goal_room.authorize_check_feed(
            member,
            today,
            submitted_today,
            node_feed_count as u32,
        )?;

        let server_file_path = format!(
            "goal-rooms/{}/{}{}",
            goal_room_id,
            random_string(Self::FILE_NAME_LENGTH),
            content_type.extension()
        );

        let feed = CheckFeed::submit(
            key,
            roadmap_node,
            StoredFile {
                server_file_path: server_file_path.clone(),
                content_type,
                original_file_name: upload.original_file_name,
            },
            description,
            now,
        )?;

        goal_room.update_accomplishment_rate(member, previous.len() as u32 + 1)?;

        self.context
            .storage
            .save(
                &server_file_path,
                FileInformation {
                    bytes: upload.bytes,
                    content_type: content_type.mime().to_string(),
                },
            )
            .await?;

        let feed = match database.create_check_feed(&feed, &goal_room).await {
            Ok(feed) => feed,
            Err(error) => {
                self.discard_file(&server_file_path).await;
                return Err(error.into());
            }
        };

        if let Some(check_feed_id) = feed.id() {
            self.context.emit(CollabEvent::CheckFeedSubmitted {
                goal_room_id,
                member_id: member,
                check_feed_id,
            });
        }

        Ok(feed)
    }

    /// Every check feed of a room, for its members only
    pub async fn check_feeds(
        &self,
        member: MemberId,
        goal_room_id: GoalRoomId,
    ) -> ServiceResult<Vec<CheckFeedView>> {
        let goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        if !goal_room.is_member(member) {
            return Err(ServiceError::Forbidden(
                "only members can see check feeds".to_string(),
            ));
        }

        self.context
            .database
            .check_feeds_by_goal_room(goal_room_id)
            .await?
            .iter()
            .map(|feed| self.view(feed))
            .collect()
    }

    /// Removes a check feed. Only its author may do this.
    pub async fn delete_check_feed(
        &self,
        member: MemberId,
        check_feed_id: CheckFeedId,
    ) -> ServiceResult<()> {
        let feed = self.context.database.check_feed_by_id(check_feed_id).await?;

        if !feed.is_owned_by(member) {
            return Err(ServiceError::Forbidden(
                "only the author can delete this check feed".to_string(),
            ));
        }

        let key = feed.goal_room_member();
        let goal_room_id = key.goal_room;

        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let database = &self.context.database;
        let mut goal_room = database.goal_room_by_id(goal_room_id).await?;

        if goal_room.is_member(member) {
            let remaining = database.check_feeds_by_member(key).await?.len();
            goal_room.update_accomplishment_rate(member, remaining.saturating_sub(1) as u32)?;
        }

        database.delete_check_feed(check_feed_id, &goal_room).await?;
        self.discard_file(&feed.file().server_file_path).await;

        self.context.emit(CollabEvent::CheckFeedDeleted {
            goal_room_id,
            check_feed_id,
        });

        Ok(())
    }

    fn view(&self, feed: &CheckFeed) -> ServiceResult<CheckFeedView> {
        let id = feed
            .id()
            .ok_or_else(|| ServiceError::Internal("stored check feed has no key".to_string()))?;

        let image_url = self.context.storage.presigned_url(
            &feed.file().server_file_path,
            HttpMethod::Get,
            self.context.config.url_expiration,
        )?;

        Ok(CheckFeedView {
            id,
            member: feed.goal_room_member().member,
            roadmap_node: feed.roadmap_node(),
            image_url: image_url.to_string(),
            description: feed.description().map(str::to_string),
            created_at: feed.created_at(),
        })
    }

    async fn discard_file(&self, path: &str) {
        if let Err(error) = self.context.storage.delete(path).await {
            warn!("Could not delete {}: {}", path, error);
        }
    }
}

#[cfg(test)]
mod test {
    use summit_core::{time, GoalRoomId, MemberId};
    use tempfile::tempdir;

    use crate::{
        test_support::{collab, new_goal_room, register, stored_roadmap, TestCollab},
        ServiceError,
    };

    use super::FileUpload;

    fn png() -> FileUpload {
        FileUpload {
            original_file_name: "run.png".to_string(),
            bytes: vec![137, 80, 78, 71],
            content_type: "image/png".to_string(),
        }
    }

    /// A running room with `leader` and `member` in it
    async fn running_room(collab: &TestCollab) -> (GoalRoomId, MemberId, MemberId) {
        let leader = register(collab, "leader1").await;
        let member = register(collab, "member1").await;
        let roadmap = stored_roadmap(collab, leader).await;

        let room_id = collab
            .goal_rooms
            .create(leader, new_goal_room(&roadmap, time::today()))
            .await
            .unwrap()
            .id()
            .unwrap();
        collab.goal_rooms.join(member, room_id).await.unwrap();

        let report = collab.scheduler.run(time::today()).await.unwrap();
        assert_eq!(report.started, 1);

        (room_id, leader, member)
    }

    #[tokio::test]
    async fn members_submit_independently() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, member) = running_room(&collab).await;

        let first = collab
            .goal_rooms
            .submit_check_feed(leader, room_id, png(), Some("5k done".to_string()))
            .await
            .unwrap();
        let second = collab
            .goal_rooms
            .submit_check_feed(member, room_id, png(), None)
            .await
            .unwrap();

        assert_eq!(first.roadmap_node(), second.roadmap_node());
        assert_ne!(first.goal_room_member(), second.goal_room_member());
        assert!(first.file().server_file_path.ends_with(".png"));

        let path = dir
            .path()
            .join("summit")
            .join(&first.file().server_file_path);
        assert!(path.exists());

        let room = collab.goal_rooms.goal_room(room_id).await.unwrap();
        let rate = room
            .members()
            .find_by_member(leader)
            .unwrap()
            .accomplishment_rate();
        assert_eq!(rate, 25.0);
    }

    #[tokio::test]
    async fn one_feed_per_day() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, _) = running_room(&collab).await;

        collab
            .goal_rooms
            .submit_check_feed(leader, room_id, png(), None)
            .await
            .unwrap();

        assert!(matches!(
            collab.goal_rooms.submit_check_feed(leader, room_id, png(), None).await,
            Err(ServiceError::Validation(m)) if m == "a check feed was already submitted today"
        ));
    }

    #[tokio::test]
    async fn long_descriptions_are_rejected_before_storing() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, _) = running_room(&collab).await;

        assert!(matches!(
            collab
                .goal_rooms
                .submit_check_feed(leader, room_id, png(), Some("a".repeat(301)))
                .await,
            Err(ServiceError::Validation(m))
                if m == "check feed description length must be at most 300"
        ));
        assert!(!dir.path().join("summit").join("goal-rooms").exists());

        let feed = collab
            .goal_rooms
            .submit_check_feed(leader, room_id, png(), Some("a".repeat(300)))
            .await
            .unwrap();
        assert_eq!(feed.description().unwrap().len(), 300);
    }

    #[tokio::test]
    async fn uploads_must_be_images() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, _) = running_room(&collab).await;

        let mut upload = png();
        upload.content_type = "application/pdf".to_string();

        assert!(matches!(
            collab.goal_rooms.submit_check_feed(leader, room_id, upload, None).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn outsiders_cannot_submit_or_read() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, _, _) = running_room(&collab).await;
        let outsider = register(&collab, "outsider").await;

        assert!(matches!(
            collab.goal_rooms.submit_check_feed(outsider, room_id, png(), None).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            collab.goal_rooms.check_feeds(outsider, room_id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn feeds_are_listed_with_signed_urls() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, member) = running_room(&collab).await;

        collab
            .goal_rooms
            .submit_check_feed(leader, room_id, png(), Some("first".to_string()))
            .await
            .unwrap();

        let feeds = collab.goal_rooms.check_feeds(member, room_id).await.unwrap();

        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].member, leader);
        assert_eq!(feeds[0].description.as_deref(), Some("first"));
        assert!(feeds[0].image_url.contains("goal-rooms/"));
        assert!(feeds[0].image_url.contains("method=GET"));
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let (room_id, leader, member) = running_room(&collab).await;

        let feed = collab
            .goal_rooms
            .submit_check_feed(leader, room_id, png(), None)
            .await
            .unwrap();
        let feed_id = feed.id().unwrap();

        assert!(matches!(
            collab.goal_rooms.delete_check_feed(member, feed_id).await,
            Err(ServiceError::Forbidden(_))
        ));

        collab
            .goal_rooms
            .delete_check_feed(leader, feed_id)
            .await
            .unwrap();

        assert!(collab
            .goal_rooms
            .check_feeds(leader, room_id)
            .await
            .unwrap()
            .is_empty());

        let room = collab.goal_rooms.goal_room(room_id).await.unwrap();
        let rate = room
            .members()
            .find_by_member(leader)
            .unwrap()
            .accomplishment_rate();
        assert_eq!(rate, 0.0);
    }
}
