use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    postgres::PgPoolOptions, query, query_as, Error as SqlxError, FromRow, PgConnection, PgPool,
};
use summit_core::{
    time::Timestamp, CategoryId, CheckFeed, CheckFeedId, DomainResult, GoalRoom, GoalRoomId,
    GoalRoomMember, GoalRoomMemberKey, GoalRoomParts, GoalRoomRoadmapNode, GoalRoomToDo,
    GoalRoomToDoId, Identifier, Member, MemberId, MemberImage, MemberProfile, NewMember, Nickname,
    Period, PhoneNumber, Roadmap, RoadmapCategory, RoadmapId, RoadmapNode, RoadmapParts,
    RoadmapReview, RoadmapTag, StoredFile,
};

use crate::{
    Database, DatabaseError, DatabaseResult, IntoDatabaseError, NewSession, Result, SessionData,
};

/// A postgres database implementation for summit
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connects and brings the schema up to date
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    async fn goal_rooms_by_ids(&self, ids: Vec<i32>) -> Result<Vec<GoalRoom>> {
        let mut rooms = Vec::with_capacity(ids.len());

        for id in ids {
            rooms.push(self.goal_room_by_id(GoalRoomId::new(id)).await?);
        }

        Ok(rooms)
    }
}

#[derive(FromRow)]
struct MemberRow {
    id: i32,
    identifier: String,
    nickname: String,
    password_hash: String,
    gender: String,
    birthday: NaiveDate,
    phone_number: String,
    image_original_file_name: String,
    image_server_file_path: String,
    image_content_type: String,
    created_at: Timestamp,
}

#[derive(FromRow)]
struct SessionRow {
    access_token: String,
    refresh_token: String,
    member_id: i32,
    expires_at: Timestamp,
    refresh_expires_at: Timestamp,
}

#[derive(FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
}

#[derive(FromRow)]
struct RoadmapRow {
    id: i32,
    title: String,
    introduction: String,
    body: Option<String>,
    required_period: i32,
    difficulty: String,
    status: String,
    creator_id: i32,
    category_id: i32,
    created_at: Timestamp,
}

#[derive(FromRow)]
struct RoadmapNodeRow {
    id: i32,
    title: String,
    description: String,
}

#[derive(FromRow)]
struct RoadmapTagRow {
    id: i32,
    name: String,
}

#[derive(FromRow)]
struct RoadmapReviewRow {
    id: i32,
    member_id: i32,
    content: Option<String>,
    rate: f64,
    created_at: Timestamp,
}

#[derive(FromRow)]
struct GoalRoomRow {
    id: i32,
    name: String,
    limited_member_count: i32,
    status: String,
    roadmap_id: i32,
    created_at: Timestamp,
}

#[derive(FromRow)]
struct GoalRoomNodeRow {
    id: i32,
    roadmap_node_id: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    check_count: i32,
}

#[derive(FromRow)]
struct GoalRoomMemberRow {
    member_id: i32,
    is_leader: bool,
    joined_at: Timestamp,
    accomplishment_rate: f64,
}

#[derive(FromRow)]
struct GoalRoomToDoRow {
    id: i32,
    content: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(FromRow)]
struct CheckFeedRow {
    id: i32,
    goal_room_id: i32,
    member_id: i32,
    roadmap_node_id: i32,
    server_file_path: String,
    content_type: String,
    original_file_name: String,
    description: Option<String>,
    created_at: Timestamp,
}

impl MemberRow {
    fn into_member(self) -> DomainResult<Member> {
        Ok(Member {
            id: MemberId::new(self.id),
            identifier: Identifier::new(self.identifier)?,
            nickname: Nickname::new(self.nickname)?,
            password_hash: self.password_hash,
            profile: MemberProfile {
                gender: self.gender.parse()?,
                birthday: self.birthday,
                phone_number: PhoneNumber::new(self.phone_number)?,
            },
            image: MemberImage {
                original_file_name: self.image_original_file_name,
                server_file_path: self.image_server_file_path,
                content_type: self.image_content_type.parse()?,
            },
            created_at: self.created_at,
        })
    }
}

impl From<SessionRow> for SessionData {
    fn from(row: SessionRow) -> Self {
        Self {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            member_id: MemberId::new(row.member_id),
            expires_at: row.expires_at,
            refresh_expires_at: row.refresh_expires_at,
        }
    }
}

impl CheckFeedRow {
    fn into_check_feed(self) -> DomainResult<CheckFeed> {
        let key = GoalRoomMemberKey {
            goal_room: GoalRoomId::new(self.goal_room_id),
            member: MemberId::new(self.member_id),
        };

        let file = StoredFile {
            server_file_path: self.server_file_path,
            content_type: self.content_type.parse()?,
            original_file_name: self.original_file_name,
        };

        CheckFeed::restore(
            CheckFeedId::new(self.id),
            key,
            self.roadmap_node_id.into(),
            file,
            self.description,
            self.created_at,
        )
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        let is_unique_violation = self
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        if is_unique_violation {
            return DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            };
        }

        self.any()
    }
}

fn violated_constraint(error: &SqlxError) -> Option<&str> {
    error.as_database_error().and_then(|e| e.constraint())
}

/// Writes the whole room. Runs inside the caller's transaction.
async fn write_goal_room(conn: &mut PgConnection, goal_room: &GoalRoom) -> Result<GoalRoomId> {
    let id = match goal_room.id() {
        Some(id) => {
            let result = query(
                "UPDATE goal_rooms SET name = $1, limited_member_count = $2, status = $3
                WHERE id = $4",
            )
            .bind(goal_room.name())
            .bind(goal_room.limited_member_count() as i32)
            .bind(goal_room.status().as_str())
            .bind(id.value())
            .execute(&mut *conn)
            .await
            .map_err(|e| e.any())?;

            if result.rows_affected() == 0 {
                return Err(DatabaseError::NotFound {
                    resource: "goal room",
                    identifier: "id",
                });
            }

            id
        }
        None => {
            let (id,): (i32,) = query_as(
                "INSERT INTO goal_rooms (name, limited_member_count, status, roadmap_id,
                    start_date, end_date, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
            )
            .bind(goal_room.name())
            .bind(goal_room.limited_member_count() as i32)
            .bind(goal_room.status().as_str())
            .bind(goal_room.roadmap().value())
            .bind(goal_room.start_date())
            .bind(goal_room.end_date())
            .bind(goal_room.created_at())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| e.any())?;

            for (ordinal, node) in goal_room.nodes().iter().enumerate() {
                let period = node.period();

                query(
                    "INSERT INTO goal_room_roadmap_nodes (goal_room_id, roadmap_node_id,
                        ordinal, start_date, end_date, check_count)
                    VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(id)
                .bind(node.roadmap_node().value())
                .bind(ordinal as i32 + 1)
                .bind(period.start())
                .bind(period.end())
                .bind(node.check_count() as i32)
                .execute(&mut *conn)
                .await
                .map_err(|e| e.any())?;
            }

            GoalRoomId::new(id)
        }
    };

    // Step everyone down first so handing over never trips the single leader index
    query("UPDATE goal_room_members SET is_leader = false WHERE goal_room_id = $1")
        .bind(id.value())
        .execute(&mut *conn)
        .await
        .map_err(|e| e.any())?;

    let member_ids: Vec<i32> = goal_room.members().iter().map(|m| m.member().value()).collect();

    query("DELETE FROM goal_room_members WHERE goal_room_id = $1 AND NOT (member_id = ANY($2))")
        .bind(id.value())
        .bind(member_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| e.any())?;

    for member in goal_room.members().iter() {
        query(
            "INSERT INTO goal_room_members (goal_room_id, member_id, is_leader, joined_at,
                accomplishment_rate)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (goal_room_id, member_id)
            DO UPDATE SET is_leader = EXCLUDED.is_leader,
                accomplishment_rate = EXCLUDED.accomplishment_rate",
        )
        .bind(id.value())
        .bind(member.member().value())
        .bind(member.is_leader())
        .bind(member.joined_at())
        .bind(member.accomplishment_rate())
        .execute(&mut *conn)
        .await
        .map_err(|e| e.conflict_or("goal room member", "is_leader", &member.member().to_string()))?;
    }

    for todo in goal_room.todos().iter().filter(|t| t.id().is_none()) {
        let period = todo.period();

        query(
            "INSERT INTO goal_room_todos (goal_room_id, content, start_date, end_date)
            VALUES ($1, $2, $3, $4)",
        )
        .bind(id.value())
        .bind(todo.content())
        .bind(period.start())
        .bind(period.end())
        .execute(&mut *conn)
        .await
        .map_err(|e| e.any())?;
    }

    Ok(id)
}

#[async_trait]
impl Database for PgDatabase {
    async fn member_by_id(&self, member_id: MemberId) -> Result<Member> {
        let row: MemberRow = query_as("SELECT * FROM members WHERE id = $1")
            .bind(member_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("member", "id"))?;

        Ok(row.into_member()?)
    }

    async fn member_by_identifier(&self, identifier: &str) -> Result<Member> {
        let row: MemberRow = query_as("SELECT * FROM members WHERE identifier = $1")
            .bind(identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("member", "identifier"))?;

        Ok(row.into_member()?)
    }

    async fn member_by_nickname(&self, nickname: &str) -> Result<Member> {
        let row: MemberRow = query_as("SELECT * FROM members WHERE nickname = $1")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("member", "nickname"))?;

        Ok(row.into_member()?)
    }

    async fn create_member(&self, new_member: NewMember) -> Result<Member> {
        let identifier = new_member.identifier.as_str();
        let nickname = new_member.nickname.as_str();

        self.member_by_identifier(identifier)
            .await
            .conflict_or_ok("member", "identifier", identifier)?;
        self.member_by_nickname(nickname)
            .await
            .conflict_or_ok("member", "nickname", nickname)?;

        let profile = &new_member.profile;
        let image = &new_member.image;

        // Another signup may have taken the name since the check above
        let row: MemberRow = query_as(
            "INSERT INTO members (identifier, nickname, password_hash, gender, birthday,
                phone_number, image_original_file_name, image_server_file_path,
                image_content_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(identifier)
        .bind(nickname)
        .bind(&new_member.password_hash)
        .bind(profile.gender.as_str())
        .bind(profile.birthday)
        .bind(profile.phone_number.as_str())
        .bind(&image.original_file_name)
        .bind(&image.server_file_path)
        .bind(image.content_type.as_str())
        .bind(summit_core::time::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some("members_nickname_key") {
                e.conflict_or("member", "nickname", nickname)
            } else {
                e.conflict_or("member", "identifier", identifier)
            }
        })?;

        Ok(row.into_member()?)
    }

    async fn session_by_access_token(&self, token: &str) -> Result<SessionData> {
        query_as::<_, SessionRow>("SELECT * FROM sessions WHERE access_token = $1")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map(SessionData::from)
            .map_err(|e| e.not_found_or("session", "access_token"))
    }

    async fn session_by_refresh_token(&self, token: &str) -> Result<SessionData> {
        query_as::<_, SessionRow>("SELECT * FROM sessions WHERE refresh_token = $1")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map(SessionData::from)
            .map_err(|e| e.not_found_or("session", "refresh_token"))
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        query_as::<_, SessionRow>(
            "INSERT INTO sessions (access_token, refresh_token, member_id, expires_at,
                refresh_expires_at)
            VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&new_session.access_token)
        .bind(&new_session.refresh_token)
        .bind(new_session.member_id.value())
        .bind(new_session.expires_at)
        .bind(new_session.refresh_expires_at)
        .fetch_one(&self.pool)
        .await
        .map(SessionData::from)
        .map_err(|e| e.conflict_or("session", "access_token", &new_session.access_token))
    }

    async fn delete_session_by_token(&self, access_token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_access_token(access_token).await?;

        query("DELETE FROM sessions WHERE access_token = $1")
            .bind(access_token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        query("DELETE FROM sessions WHERE now() > refresh_expires_at")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn category_by_id(&self, category_id: CategoryId) -> Result<RoadmapCategory> {
        query_as::<_, CategoryRow>("SELECT * FROM roadmap_categories WHERE id = $1")
            .bind(category_id.value())
            .fetch_one(&self.pool)
            .await
            .map(|row| RoadmapCategory {
                id: row.id.into(),
                name: row.name,
            })
            .map_err(|e| e.not_found_or("category", "id"))
    }

    async fn create_category(&self, name: &str) -> Result<RoadmapCategory> {
        query_as::<_, CategoryRow>("INSERT INTO roadmap_categories (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map(|row| RoadmapCategory {
                id: row.id.into(),
                name: row.name,
            })
            .map_err(|e| e.conflict_or("category", "name", name))
    }

    async fn roadmap_by_id(&self, roadmap_id: RoadmapId) -> Result<Roadmap> {
        let row: RoadmapRow = query_as("SELECT * FROM roadmaps WHERE id = $1")
            .bind(roadmap_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("roadmap", "id"))?;

        let nodes: Vec<RoadmapNodeRow> = query_as(
            "SELECT id, title, description FROM roadmap_nodes
            WHERE roadmap_id = $1 ORDER BY ordinal",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let tags: Vec<RoadmapTagRow> =
            query_as("SELECT id, name FROM roadmap_tags WHERE roadmap_id = $1 ORDER BY id")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        let reviews: Vec<RoadmapReviewRow> = query_as(
            "SELECT id, member_id, content, rate, created_at FROM roadmap_reviews
            WHERE roadmap_id = $1 ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let parts = RoadmapParts {
            id: row.id.into(),
            title: row.title,
            introduction: row.introduction,
            body: row.body,
            required_period: row.required_period,
            difficulty: row.difficulty.parse()?,
            status: row.status.parse()?,
            creator: row.creator_id.into(),
            category: row.category_id.into(),
            created_at: row.created_at,
            nodes: nodes
                .into_iter()
                .map(|n| RoadmapNode::restore(n.id.into(), n.title, n.description))
                .collect::<DomainResult<_>>()?,
            tags: tags
                .into_iter()
                .map(|t| RoadmapTag::restore(t.id.into(), t.name))
                .collect::<DomainResult<_>>()?,
            reviews: reviews
                .into_iter()
                .map(|r| {
                    RoadmapReview::restore(
                        r.id.into(),
                        r.member_id.into(),
                        r.content,
                        r.rate,
                        r.created_at,
                    )
                })
                .collect::<DomainResult<_>>()?,
        };

        Ok(Roadmap::restore(parts)?)
    }

    async fn save_roadmap(&self, roadmap: &Roadmap) -> Result<Roadmap> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let id = match roadmap.id() {
            Some(id) => {
                let result = query("UPDATE roadmaps SET status = $1 WHERE id = $2")
                    .bind(roadmap.status().as_str())
                    .bind(id.value())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| e.any())?;

                if result.rows_affected() == 0 {
                    return Err(DatabaseError::NotFound {
                        resource: "roadmap",
                        identifier: "id",
                    });
                }

                id
            }
            None => {
                let (id,): (i32,) = query_as(
                    "INSERT INTO roadmaps (title, introduction, body, required_period,
                        difficulty, status, creator_id, category_id, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
                )
                .bind(roadmap.title())
                .bind(roadmap.introduction())
                .bind(roadmap.body())
                .bind(roadmap.required_period())
                .bind(roadmap.difficulty().as_str())
                .bind(roadmap.status().as_str())
                .bind(roadmap.creator().value())
                .bind(roadmap.category().value())
                .bind(roadmap.created_at())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| e.any())?;

                RoadmapId::new(id)
            }
        };

        for node in roadmap.contents().iter().filter(|n| n.id().is_none()) {
            query(
                "INSERT INTO roadmap_nodes (roadmap_id, ordinal, title, description)
                VALUES ($1, $2, $3, $4)",
            )
            .bind(id.value())
            .bind(node.ordinal() as i32)
            .bind(node.title())
            .bind(node.description())
            .execute(&mut *tx)
            .await
            .map_err(|e| e.conflict_or("roadmap node", "ordinal", &node.ordinal().to_string()))?;
        }

        for tag in roadmap.tags().iter().filter(|t| t.id().is_none()) {
            let name = tag.name().as_str();

            query("INSERT INTO roadmap_tags (roadmap_id, name) VALUES ($1, $2)")
                .bind(id.value())
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.conflict_or("roadmap tag", "name", name))?;
        }

        for review in roadmap.reviews().iter().filter(|r| r.id().is_none()) {
            query(
                "INSERT INTO roadmap_reviews (roadmap_id, member_id, content, rate, created_at)
                VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.value())
            .bind(review.member().value())
            .bind(review.content())
            .bind(review.rate())
            .bind(review.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                e.conflict_or("roadmap review", "member_id", &review.member().to_string())
            })?;
        }

        tx.commit().await.map_err(|e| e.any())?;

        self.roadmap_by_id(id).await
    }

    async fn goal_room_by_id(&self, goal_room_id: GoalRoomId) -> Result<GoalRoom> {
        let row: GoalRoomRow = query_as(
            "SELECT id, name, limited_member_count, status, roadmap_id, created_at
            FROM goal_rooms WHERE id = $1",
        )
        .bind(goal_room_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("goal room", "id"))?;

        let nodes: Vec<GoalRoomNodeRow> = query_as(
            "SELECT id, roadmap_node_id, start_date, end_date, check_count
            FROM goal_room_roadmap_nodes WHERE goal_room_id = $1 ORDER BY ordinal",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let members: Vec<GoalRoomMemberRow> = query_as(
            "SELECT member_id, is_leader, joined_at, accomplishment_rate
            FROM goal_room_members WHERE goal_room_id = $1 ORDER BY joined_at, member_id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let todos: Vec<GoalRoomToDoRow> = query_as(
            "SELECT id, content, start_date, end_date FROM goal_room_todos
            WHERE goal_room_id = $1 ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let parts = GoalRoomParts {
            id: row.id.into(),
            name: row.name,
            limited_member_count: row.limited_member_count as u32,
            status: row.status.parse()?,
            roadmap: row.roadmap_id.into(),
            created_at: row.created_at,
            nodes: nodes
                .into_iter()
                .map(|n| {
                    GoalRoomRoadmapNode::restore(
                        n.id.into(),
                        n.roadmap_node_id.into(),
                        Period::new(n.start_date, n.end_date)?,
                        n.check_count as u32,
                    )
                })
                .collect::<DomainResult<_>>()?,
            members: members
                .into_iter()
                .map(|m| {
                    GoalRoomMember::restore(
                        m.member_id.into(),
                        m.is_leader,
                        m.joined_at,
                        m.accomplishment_rate,
                    )
                })
                .collect(),
            todos: todos
                .into_iter()
                .map(|t| {
                    let period = Period::new(t.start_date, t.end_date)?;
                    GoalRoomToDo::restore(t.id.into(), t.content, period)
                })
                .collect::<DomainResult<_>>()?,
        };

        Ok(GoalRoom::restore(parts)?)
    }

    async fn goal_rooms_by_start_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>> {
        let ids: Vec<i32> =
            query_as::<_, (i32,)>("SELECT id FROM goal_rooms WHERE start_date = $1 ORDER BY id")
                .bind(date)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?
                .into_iter()
                .map(|(id,)| id)
                .collect();

        self.goal_rooms_by_ids(ids).await
    }

    async fn goal_rooms_by_end_date(&self, date: NaiveDate) -> Result<Vec<GoalRoom>> {
        let ids: Vec<i32> =
            query_as::<_, (i32,)>("SELECT id FROM goal_rooms WHERE end_date = $1 ORDER BY id")
                .bind(date)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?
                .into_iter()
                .map(|(id,)| id)
                .collect();

        self.goal_rooms_by_ids(ids).await
    }

    async fn goal_rooms_by_roadmap(&self, roadmap_id: RoadmapId) -> Result<Vec<GoalRoom>> {
        let ids: Vec<i32> =
            query_as::<_, (i32,)>("SELECT id FROM goal_rooms WHERE roadmap_id = $1 ORDER BY id")
                .bind(roadmap_id.value())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?
                .into_iter()
                .map(|(id,)| id)
                .collect();

        self.goal_rooms_by_ids(ids).await
    }

    async fn save_goal_room(&self, goal_room: &GoalRoom) -> Result<GoalRoom> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;
        let id = write_goal_room(&mut *tx, goal_room).await?;
        tx.commit().await.map_err(|e| e.any())?;

        self.goal_room_by_id(id).await
    }

    async fn delete_goal_room(&self, goal_room_id: GoalRoomId) -> Result<()> {
        let result = query("DELETE FROM goal_rooms WHERE id = $1")
            .bind(goal_room_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "goal room",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn check_feed_by_id(&self, check_feed_id: CheckFeedId) -> Result<CheckFeed> {
        let row: CheckFeedRow = query_as("SELECT * FROM check_feeds WHERE id = $1")
            .bind(check_feed_id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("check feed", "id"))?;

        Ok(row.into_check_feed()?)
    }

    async fn check_feeds_by_goal_room(&self, goal_room_id: GoalRoomId) -> Result<Vec<CheckFeed>> {
        let rows: Vec<CheckFeedRow> =
            query_as("SELECT * FROM check_feeds WHERE goal_room_id = $1 ORDER BY id")
                .bind(goal_room_id.value())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        Ok(rows
            .into_iter()
            .map(CheckFeedRow::into_check_feed)
            .collect::<DomainResult<_>>()?)
    }

    async fn check_feeds_by_member(&self, key: GoalRoomMemberKey) -> Result<Vec<CheckFeed>> {
        let rows: Vec<CheckFeedRow> = query_as(
            "SELECT * FROM check_feeds WHERE goal_room_id = $1 AND member_id = $2 ORDER BY id",
        )
        .bind(key.goal_room.value())
        .bind(key.member.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows
            .into_iter()
            .map(CheckFeedRow::into_check_feed)
            .collect::<DomainResult<_>>()?)
    }

    async fn create_check_feed(&self, feed: &CheckFeed, goal_room: &GoalRoom) -> Result<CheckFeed> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        write_goal_room(&mut *tx, goal_room).await?;

        let key = feed.goal_room_member();
        let file = feed.file();

        let row: CheckFeedRow = query_as(
            "INSERT INTO check_feeds (goal_room_id, member_id, roadmap_node_id, server_file_path,
                content_type, original_file_name, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(key.goal_room.value())
        .bind(key.member.value())
        .bind(feed.roadmap_node().value())
        .bind(&file.server_file_path)
        .bind(file.content_type.as_str())
        .bind(&file.original_file_name)
        .bind(feed.description())
        .bind(feed.created_at())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        Ok(row.into_check_feed()?)
    }

    async fn delete_check_feed(
        &self,
        check_feed_id: CheckFeedId,
        goal_room: &GoalRoom,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let result = query("DELETE FROM check_feeds WHERE id = $1")
            .bind(check_feed_id.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "check feed",
                identifier: "id",
            });
        }

        write_goal_room(&mut *tx, goal_room).await?;
        tx.commit().await.map_err(|e| e.any())
    }

    async fn todo_check_exists(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<bool> {
        let (exists,): (bool,) = query_as(
            "SELECT EXISTS (SELECT 1 FROM goal_room_todo_checks
            WHERE todo_id = $1 AND goal_room_id = $2 AND member_id = $3)",
        )
        .bind(todo_id.value())
        .bind(key.goal_room.value())
        .bind(key.member.value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(exists)
    }

    async fn create_todo_check(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<()> {
        query(
            "INSERT INTO goal_room_todo_checks (todo_id, goal_room_id, member_id)
            VALUES ($1, $2, $3)",
        )
        .bind(todo_id.value())
        .bind(key.goal_room.value())
        .bind(key.member.value())
        .execute(&self.pool)
        .await
        .map_err(|e| e.conflict_or("to-do check", "todo_id", &todo_id.to_string()))
        .map(|_| ())
    }

    async fn delete_todo_check(
        &self,
        todo_id: GoalRoomToDoId,
        key: GoalRoomMemberKey,
    ) -> Result<()> {
        let result = query(
            "DELETE FROM goal_room_todo_checks
            WHERE todo_id = $1 AND goal_room_id = $2 AND member_id = $3",
        )
        .bind(todo_id.value())
        .bind(key.goal_room.value())
        .bind(key.member.value())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "to-do check",
                identifier: "todo_id",
            });
        }

        Ok(())
    }
}
