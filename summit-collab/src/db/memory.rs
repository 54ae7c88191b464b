use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use crossbeam::atomic::AtomicCell;
use parking_lot::RwLock;
use summit_core::{
    time, CategoryId, CheckFeed, CheckFeedId, DomainResult, GoalRoom, GoalRoomId,
    GoalRoomMemberKey, GoalRoomParts, GoalRoomRoadmapNode, GoalRoomToDo, GoalRoomToDoId, Key,
    KeyValue, Member, MemberId, NewMember, Roadmap, RoadmapCategory, RoadmapId, RoadmapNode,
    RoadmapParts, RoadmapReview, RoadmapTag,
};

use crate::{
    Database, DatabaseError, DatabaseResult, NewSession, Result, SessionData,
};

/// A database that keeps everything in memory. Used for tests and local development.
#[derive(Default)]
pub struct MemoryDatabase {
    last_key: AtomicCell<KeyValue>,

    members: RwLock<HashMap<MemberId, Member>>,
    sessions: RwLock<Vec<SessionData>>,
    categories: RwLock<HashMap<CategoryId, RoadmapCategory>>,
    roadmaps: RwLock<HashMap<RoadmapId, Roadmap>>,
    goal_rooms: RwLock<BTreeMap<GoalRoomId, GoalRoom>>,
    check_feeds: RwLock<BTreeMap<CheckFeedId, CheckFeed>>,
    todo_checks: RwLock<HashSet<(GoalRoomToDoId, GoalRoomMemberKey)>>,
}

impl MemoryDatabase {
    fn next_key<T>(&self) -> Key<T> {
        Key::new(self.last_key.fetch_add(1) + 1)
    }

    fn key_or_next<T>(&self, key: Option<Key<T>>) -> Key<T> {
        key.unwrap_or_else(|| self.next_key())
    }

    /// Rebuilds the roadmap with a key on every part
    fn keyed_roadmap(&self, roadmap: &Roadmap, id: RoadmapId) -> DomainResult<Roadmap> {
        let nodes = roadmap
            .contents()
            .iter()
            .map(|node| {
                RoadmapNode::restore(
                    self.key_or_next(node.id()),
                    node.title(),
                    node.description(),
                )
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let tags = roadmap
            .tags()
            .iter()
            .map(|tag| RoadmapTag::restore(self.key_or_next(tag.id()), tag.name().as_str()))
            .collect::<DomainResult<Vec<_>>>()?;

        let reviews = roadmap
            .reviews()
            .iter()
            .map(|review| {
                RoadmapReview::restore(
                    self.key_or_next(review.id()),
                    review.member(),
                    review.content().map(str::to_string),
                    review.rate(),
                    review.created_at(),
                )
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Roadmap::restore(RoadmapParts {
            id,
            title: roadmap.title().to_string(),
            introduction: roadmap.introduction().to_string(),
            body: roadmap.body().map(str::to_string),
            required_period: roadmap.required_period(),
            difficulty: roadmap.difficulty(),
            status: roadmap.status(),
            creator: roadmap.creator(),
            category: roadmap.category(),
            created_at: roadmap.created_at(),
            nodes,
            tags,
            reviews,
        })
    }

    fn keyed_goal_room(&self, goal_room: &GoalRoom, id: GoalRoomId) -> DomainResult<GoalRoom> {
        let nodes = goal_room
            .nodes()
            .iter()
            .map(|node| {
                GoalRoomRoadmapNode::restore(
                    self.key_or_next(node.id()),
                    node.roadmap_node(),
                    node.period(),
                    node.check_count(),
                )
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let todos = goal_room
            .todos()
            .iter()
            .map(|todo| {
                GoalRoomToDo::restore(self.key_or_next(todo.id()), todo.content(), todo.period())
            })
            .collect::<DomainResult<Vec<_>>>()?;

        GoalRoom::restore(GoalRoomParts {
            id,
            name: goal_room.name().to_string(),
            limited_member_count: goal_room.limited_member_count(),
            status: goal_room.status(),
            roadmap: goal_room.roadmap(),
            created_at: goal_room.created_at(),
            nodes,
            members: goal_room.members().iter().cloned().collect(),
            todos,
        })
    }

    /// Stores a room, enforcing what the postgres constraints enforce
    fn store_goal_room(&self, goal_room: &GoalRoom) -> Result<GoalRoom> {
        if let Some(id) = goal_room.id() {
            if !self.goal_rooms.read().contains_key(&id) {
                return Err(DatabaseError::NotFound {
                    resource: "goal room",
                    identifier: "id",
                });
            }
        }

        let leaders = goal_room.members().iter().filter(|m| m.is_leader()).count();
        if leaders > 1 {
            return Err(DatabaseError::Conflict {
                resource: "goal room member",
                field: "is_leader",
                value: "true".to_string(),
            });
        }

        let id = self.key_or_next(goal_room.id());
        let stored = self.keyed_goal_room(goal_room, id)?;

        self.goal_rooms.write().insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn member_by_id(&self, member_id: MemberId) -> Result<Member> {
        self.members
            .read()
            .get(&member_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "member",
                identifier: "id",
            })
    }

    async fn member_by_identifier(&self, identifier: &str) -> Result<Member> {
        self.members
            .read()
            .values()
            .find(|m| m.identifier.as_str() == identifier)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "member",
                identifier: "identifier",
            })
    }

    async fn member_by_nickname(&self, nickname: &str) -> Result<Member> {
        self.members
            .read()
            .values()
            .find(|m| m.nickname.as_str() == nickname)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "member",
                identifier: "nickname",
            })
    }

    async fn create_member(&self, new_member: NewMember) -> Result<Member> {
        self.member_by_identifier(new_member.identifier.as_str())
            .await
            .conflict_or_ok("member", "identifier", new_member.identifier.as_str())?;
        self.member_by_nickname(new_member.nickname.as_str())
            .await
            .conflict_or_ok("member", "nickname", new_member.nickname.as_str())?;

        let member = Member {
            id: self.next_key(),
            identifier: new_member.identifier,
            nickname: new_member.nickname,
            password_hash: new_member.password_hash,
            profile: new_member.profile,
            image: new_member.image,
            created_at: time::now(),
        };

        self.members.write().insert(member.id, member.clone());
        Ok(member)
    }

    async fn session_by_access_token(&self, token: &str) -> Result<SessionData> {
        self.sessions
            .read()
            .iter()
            .find(|s| s.access_token == token)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "access_token",
            })
    }

    async fn session_by_refresh_token(&self, token: &str) -> Result<SessionData> {
        self.sessions
            .read()
            .iter()
            .find(|s| s.refresh_token == token)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "refresh_token",
            })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_access_token(&new_session.access_token)
            .await
            .conflict_or_ok("session", "access_token", &new_session.access_token)?;

        let session = SessionData {
            access_token: new_session.access_token,
            refresh_token: new_session.refresh_token,
            member_id: new_session.member_id,
            expires_at: new_session.expires_at,
            refresh_expires_at: new_session.refresh_expires_at,
        };

        self.sessions.write().push(session.clone());
        Ok(session)
    }

    async fn delete_session_by_token(&self, access_token: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        let index = sessions
            .iter()
            .position(|s| s.access_token == access_token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "access_token",
            })?;

        sessions.remove(index);
        Ok(())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        let now = time::now();
        self.sessions.write().retain(|s| s.refresh_expires_at > now);

        Ok(())
    }

    async fn category_by_id(&self, category_id: CategoryId) -> Result<RoadmapCategory> {
        self.categories
            .read()
            .get(&category_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "category",
                identifier: "id",
            })
    }

    async fn create_category(&self, name: &str) -> Result<RoadmapCategory> {
        let mut categories = self.categories.write();

        if categories.values().any(|c| c.name == name) {
            return Err(DatabaseError::Conflict {
                resource: "category",
                field: "name",
                value: name.to_string(),
            });
        }

        let category = RoadmapCategory {
            id: self.next_key(),
            name: name.to_string(),
        };

        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn roadmap_by_id(&self, roadmap_id: RoadmapId) -> Result<Roadmap> {
        self.roadmaps
            .read()
            .get(&roadmap_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "roadmap",
                identifier: "id",
            })
    }

    async fn save_roadmap(&self, roadmap: &Roadmap) -> Result<Roadmap> {
        if let Some(id) = roadmap.id() {
            self.roadmap_by_id(id).await?;
        }

        let id = self.key_or_next(roadmap.id());
        let stored = self.keyed_roadmap(roadmap, id)?;

        self.roadmaps.write().insert(id, stored.clone());
        Ok(stored)
    }

    async fn goal_room_by_id(&self, goal_room_id: GoalRoomId) -> Result<GoalRoom> {
        self.goal_rooms
            .read()
            .get(&goal_room_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "goal room",
                identifier: "id",
            })
    }

    async fn goal_rooms_by_start_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>> {
        Ok(self
            .goal_rooms
            .read()
            .values()
            .filter(|room| room.start_date() == date)
            .cloned()
            .collect())
    }

    async fn goal_rooms_by_end_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>> {
        Ok(self
            .goal_rooms
            .read()
            .values()
            .filter(|room| room.end_date() == date)
            .cloned()
            .collect())
    }

    async fn goal_rooms_by_roadmap(&self, roadmap_id: RoadmapId) -> Result<Vec<GoalRoom>> {
        Ok(self
            .goal_rooms
            .read()
            .values()
            .filter(|room| room.roadmap() == roadmap_id)
            .cloned()
            .collect())
    }

    async fn save_goal_room(&self, goal_room: &GoalRoom) -> Result<GoalRoom> {
        self.store_goal_room(goal_room)
    }

    async fn delete_goal_room(&self, goal_room_id: GoalRoomId) -> Result<()> {
        self.goal_rooms
            .write()
            .remove(&goal_room_id)
            .ok_or(DatabaseError::NotFound {
                resource: "goal room",
                identifier: "id",
            })?;

        self.check_feeds
            .write()
            .retain(|_, feed| feed.goal_room_member().goal_room != goal_room_id);
        self.todo_checks
            .write()
            .retain(|(_, key)| key.goal_room != goal_room_id);

        Ok(())
    }

    async fn check_feed_by_id(&self, check_feed_id: CheckFeedId) -> Result<CheckFeed> {
        self.check_feeds
            .read()
            .get(&check_feed_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "check feed",
                identifier: "id",
            })
    }

    async fn check_feeds_by_goal_room(&self, goal_room_id: GoalRoomId) -> Result<Vec<CheckFeed>> {
        Ok(self
            .check_feeds
            .read()
            .values()
            .filter(|feed| feed.goal_room_member().goal_room == goal_room_id)
            .cloned()
            .collect())
    }

    async fn check_feeds_by_member(&self, key: GoalRoomMemberKey) -> Result<Vec<CheckFeed>> {
        Ok(self
            .check_feeds
            .read()
            .values()
            .filter(|feed| feed.goal_room_member() == key)
            .cloned()
            .collect())
    }

    async fn create_check_feed(&self, feed: &CheckFeed, goal_room: &GoalRoom) -> Result<CheckFeed> {
        self.store_goal_room(goal_room)?;

        let id = self.key_or_next(feed.id());
        let stored = CheckFeed::restore(
            id,
            feed.goal_room_member(),
            feed.roadmap_node(),
            feed.file().clone(),
            feed.description().map(str::to_string),
            feed.created_at(),
        )?;

        self.check_feeds.write().insert(id, stored.clone());

        Ok(stored)
    }

    async fn delete_check_feed(
        &self,
        check_feed_id: CheckFeedId,
        goal_room: &GoalRoom,
    ) -> Result<()> {
        self.check_feed_by_id(check_feed_id).await?;
        self.store_goal_room(goal_room)?;
        self.check_feeds.write().remove(&check_feed_id);

        Ok(())
    }

    async fn todo_check_exists(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<bool> {
        Ok(self.todo_checks.read().contains(&(todo_id, key)))
    }

    async fn create_todo_check(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<()> {
        if !self.todo_checks.write().insert((todo_id, key)) {
            return Err(DatabaseError::Conflict {
                resource: "to-do check",
                field: "todo_id",
                value: todo_id.to_string(),
            });
        }

        Ok(())
    }

    async fn delete_todo_check(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<()> {
        if !self.todo_checks.write().remove(&(todo_id, key)) {
            return Err(DatabaseError::NotFound {
                resource: "to-do check",
                identifier: "todo_id",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, NaiveDate};
    use summit_core::{
        time, CategoryId, GoalRoom, GoalRoomRoadmapNode, MemberId, Period, Roadmap,
        RoadmapDifficulty, RoadmapNode,
    };

    use crate::{Database, DatabaseError};

    use super::MemoryDatabase;

    async fn stored_roadmap(db: &MemoryDatabase) -> Roadmap {
        let mut roadmap = Roadmap::create(
            "title",
            "intro",
            None,
            10,
            RoadmapDifficulty::Easy,
            MemberId::new(1),
            CategoryId::new(1),
        )
        .unwrap();
        roadmap.add_content(RoadmapNode::new("only", "step").unwrap()).unwrap();

        db.save_roadmap(&roadmap).await.unwrap()
    }

    #[tokio::test]
    async fn saving_assigns_keys_to_every_part() {
        let db = MemoryDatabase::default();
        let roadmap = stored_roadmap(&db).await;

        let id = roadmap.id().unwrap();
        let node = roadmap.find_last_roadmap_content().unwrap();
        assert!(node.id().is_some());
        assert_eq!(node.roadmap(), Some(id));

        let loaded = db.roadmap_by_id(id).await.unwrap();
        assert_eq!(loaded.find_last_roadmap_content(), Some(node));
    }

    #[tokio::test]
    async fn goal_rooms_are_found_by_date() {
        let db = MemoryDatabase::default();
        let roadmap = stored_roadmap(&db).await;
        let node = roadmap.find_last_roadmap_content().unwrap().id().unwrap();

        let start = time::today() + Duration::days(2);
        let end = start + Duration::days(4);
        let plan = GoalRoomRoadmapNode::new(node, Period::new(start, end).unwrap(), 2).unwrap();

        let room = GoalRoom::create(
            "room",
            3,
            &roadmap,
            vec![plan],
            MemberId::new(1),
            time::now(),
            time::today(),
        )
        .unwrap();
        let room = db.save_goal_room(&room).await.unwrap();

        assert_eq!(db.goal_rooms_by_start_date(start).await.unwrap().len(), 1);
        assert_eq!(db.goal_rooms_by_end_date(end).await.unwrap().len(), 1);
        assert!(db
            .goal_rooms_by_end_date(NaiveDate::MIN)
            .await
            .unwrap()
            .is_empty());

        db.delete_goal_room(room.id().unwrap()).await.unwrap();
        assert!(matches!(
            db.goal_room_by_id(room.id().unwrap()).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn categories_are_unique_by_name() {
        let db = MemoryDatabase::default();

        db.create_category("health").await.unwrap();
        assert!(matches!(
            db.create_category("health").await,
            Err(DatabaseError::Conflict { .. })
        ));
    }
}
