mod auth;
mod config;
mod db;
mod errors;
mod events;
mod goal_rooms;
mod members;
mod roadmaps;
mod scheduler;
mod storage;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use config::*;
pub use db::*;
pub use errors::*;
pub use events::*;
pub use goal_rooms::*;
pub use members::*;
pub use roadmaps::*;
pub use scheduler::*;
pub use storage::*;

use summit_core::{GoalRoomId, RoadmapId};
use util::KeyedLocks;

/// The summit collab system: authentication, roadmaps, goal rooms and their upkeep.
pub struct Collab<Db, Blob> {
    context: CollabContext<Db, Blob>,
    events: EventReceiver,

    pub auth: Auth<Db>,
    pub members: Members<Db, Blob>,
    pub roadmaps: Roadmaps<Db, Blob>,
    pub goal_rooms: GoalRooms<Db, Blob>,
    pub scheduler: Scheduler<Db, Blob>,
}

/// A type passed to the services of the collab system, to access state and emit events.
pub struct CollabContext<Db, Blob> {
    pub config: Arc<Config>,
    pub database: Arc<Db>,
    pub storage: Arc<Blob>,
    pub events: EventSender,

    /// Serializes load, mutate and save cycles on the same goal room
    goal_room_locks: KeyedLocks<GoalRoomId>,
    /// Same, for roadmaps
    roadmap_locks: KeyedLocks<RoadmapId>,
}

impl<Db, Blob> Collab<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    pub fn new(config: Config, database: Db, storage: Blob) -> Self {
        let (sender, receiver) = crossbeam::channel::unbounded();

        let context = CollabContext {
            config: Arc::new(config),
            database: Arc::new(database),
            storage: Arc::new(storage),
            events: sender,

            goal_room_locks: Default::default(),
            roadmap_locks: Default::default(),
        };

        Self {
            events: receiver,

            auth: Auth::new(&context),
            members: Members::new(&context),
            roadmaps: Roadmaps::new(&context),
            goal_rooms: GoalRooms::new(&context),
            scheduler: Scheduler::new(&context),
            context,
        }
    }

    /// Direct access to storage, e.g. to seed categories
    pub fn database(&self) -> &Db {
        &self.context.database
    }

    /// Returns a receiver for everything that happens in the collab system
    pub fn events(&self) -> EventReceiver {
        self.events.clone()
    }
}

impl<Db, Blob> CollabContext<Db, Blob> {
    pub fn emit(&self, event: CollabEvent) {
        events::emit(&self.events, event)
    }
}

impl<Db, Blob> Clone for CollabContext<Db, Blob> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            database: self.database.clone(),
            storage: self.storage.clone(),
            events: self.events.clone(),
            goal_room_locks: self.goal_room_locks.clone(),
            roadmap_locks: self.roadmap_locks.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use chrono::{Duration, NaiveDate};
    use summit_core::{time, MemberId, Roadmap, RoadmapDifficulty};

    use crate::{
        Collab, Config, Database, LocalBlobStore, MemoryDatabase, NewGoalRoom, NewPlainMember,
        NewRoadmap, NewRoadmapNode, NodePlan, StorageConfig,
    };

    pub type TestCollab = Collab<MemoryDatabase, LocalBlobStore>;

    pub fn collab(root: &Path) -> TestCollab {
        let config = Config {
            storage: StorageConfig {
                root: root.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };

        let storage = LocalBlobStore::new(&config.storage).unwrap();
        Collab::new(config, MemoryDatabase::default(), storage)
    }

    pub fn plain_member(identifier: &str, nickname: &str) -> NewPlainMember {
        NewPlainMember {
            identifier: identifier.to_string(),
            password: "password1!".to_string(),
            nickname: nickname.to_string(),
            gender: "FEMALE".to_string(),
            birthday: NaiveDate::from_ymd_opt(1999, 6, 21).unwrap(),
            phone_number: "010-1234-5678".to_string(),
        }
    }

    pub async fn register(collab: &TestCollab, identifier: &str) -> MemberId {
        let nickname = &identifier[..identifier.len().min(8)];

        collab
            .auth
            .register(plain_member(identifier, nickname))
            .await
            .unwrap()
            .id
    }

    pub fn new_roadmap(category: summit_core::CategoryId) -> NewRoadmap {
        NewRoadmap {
            title: "marathon".to_string(),
            introduction: "run a full marathon".to_string(),
            body: None,
            required_period: 30,
            difficulty: RoadmapDifficulty::Normal,
            category,
            nodes: vec![
                NewRoadmapNode {
                    title: "5k".to_string(),
                    description: "run five kilometers".to_string(),
                },
                NewRoadmapNode {
                    title: "10k".to_string(),
                    description: "run ten kilometers".to_string(),
                },
            ],
            tags: vec!["running".to_string()],
        }
    }

    /// The date the first test goal room starts on
    pub fn start_day() -> NaiveDate {
        time::today() + Duration::days(1)
    }

    pub async fn stored_roadmap(collab: &TestCollab, creator: MemberId) -> Roadmap {
        let category = collab.database().create_category("exercise").await.unwrap();

        collab
            .roadmaps
            .create(creator, new_roadmap(category.id))
            .await
            .unwrap()
    }

    /// Two days per node starting at `start`, two check feeds each
    pub fn new_goal_room(roadmap: &Roadmap, start: NaiveDate) -> NewGoalRoom {
        let plans = roadmap
            .contents()
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let start_date = start + Duration::days(i as i64 * 2);

                NodePlan {
                    roadmap_node: node.id().unwrap(),
                    start_date,
                    end_date: start_date + Duration::days(1),
                    check_count: 2,
                }
            })
            .collect();

        NewGoalRoom {
            name: "sub four".to_string(),
            limited_member_count: 3,
            roadmap: roadmap.id().unwrap(),
            plans,
        }
    }
}
