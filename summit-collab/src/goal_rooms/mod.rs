mod feeds;

pub use feeds::*;

use chrono::NaiveDate;
use summit_core::{
    time, GoalRoom, GoalRoomId, GoalRoomMemberKey, GoalRoomRoadmapNode, GoalRoomToDo,
    GoalRoomToDoId, LeaveOutcome, MemberId, Period, RoadmapId, RoadmapNodeId,
};

use crate::{BlobStore, CollabContext, CollabEvent, Database, ServiceError, ServiceResult};

/// Goal room operations. Every change loads the room, applies the change
/// and saves it while holding the room's lock.
pub struct GoalRooms<Db, Blob> {
    context: CollabContext<Db, Blob>,
}

#[derive(Debug, Clone)]
pub struct NewGoalRoom {
    pub name: String,
    pub limited_member_count: u32,
    pub roadmap: RoadmapId,
    /// One per roadmap node, in roadmap order
    pub plans: Vec<NodePlan>,
}

/// When a roadmap node is run and how many check feeds it takes
#[derive(Debug, Clone)]
pub struct NodePlan {
    pub roadmap_node: RoadmapNodeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub check_count: u32,
}

#[derive(Debug, Clone)]
pub struct NewToDo {
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl<Db, Blob> GoalRooms<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    pub fn new(context: &CollabContext<Db, Blob>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn goal_room(&self, goal_room_id: GoalRoomId) -> ServiceResult<GoalRoom> {
        Ok(self.context.database.goal_room_by_id(goal_room_id).await?)
    }

    /// Opens a goal room on a roadmap, led by `leader`
    pub async fn create(
        &self,
        leader: MemberId,
        new_goal_room: NewGoalRoom,
    ) -> ServiceResult<GoalRoom> {
        let database = &self.context.database;

        database.member_by_id(leader).await?;

        let _guard = self.context.roadmap_locks.lock(new_goal_room.roadmap).await;
        let roadmap = database.roadmap_by_id(new_goal_room.roadmap).await?;

        let plans = new_goal_room
            .plans
            .into_iter()
            .map(|plan| {
                let period = Period::new(plan.start_date, plan.end_date)?;
                GoalRoomRoadmapNode::new(plan.roadmap_node, period, plan.check_count)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let goal_room = GoalRoom::create(
            new_goal_room.name,
            new_goal_room.limited_member_count,
            &roadmap,
            plans,
            leader,
            time::now(),
            time::today(),
        )?;

        let goal_room = database.save_goal_room(&goal_room).await?;
        let goal_room_id = Self::id_of(&goal_room)?;

        self.context.emit(CollabEvent::GoalRoomCreated {
            goal_room_id,
            leader,
        });

        Ok(goal_room)
    }

    pub async fn join(&self, member: MemberId, goal_room_id: GoalRoomId) -> ServiceResult<()> {
        self.context.database.member_by_id(member).await?;

        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let mut goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        goal_room.join(member, time::now())?;
        self.context.database.save_goal_room(&goal_room).await?;

        self.context.emit(CollabEvent::MemberJoined {
            goal_room_id,
            member_id: member,
        });

        Ok(())
    }

    /// Takes a member out of a room. The room is removed once nobody is left.
    pub async fn leave(
        &self,
        member: MemberId,
        goal_room_id: GoalRoomId,
    ) -> ServiceResult<LeaveOutcome> {
        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let mut goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        let outcome = goal_room.leave(member)?;

        if outcome == LeaveOutcome::Emptied {
            self.context.database.delete_goal_room(goal_room_id).await?;
            self.context.goal_room_locks.forget(&goal_room_id);
        } else {
            self.context.database.save_goal_room(&goal_room).await?;
        }

        self.context.emit(CollabEvent::MemberLeft {
            goal_room_id,
            member_id: member,
            outcome,
        });

        match outcome {
            LeaveOutcome::LeaderChanged { new_leader } => {
                self.context.emit(CollabEvent::LeaderChanged {
                    goal_room_id,
                    new_leader,
                });
            }
            LeaveOutcome::Emptied => {
                self.context
                    .emit(CollabEvent::GoalRoomRemoved { goal_room_id });
            }
            LeaveOutcome::Left => {}
        }

        Ok(outcome)
    }

    pub async fn change_leader(
        &self,
        requester: MemberId,
        goal_room_id: GoalRoomId,
        new_leader: MemberId,
    ) -> ServiceResult<()> {
        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let mut goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        goal_room.change_leader(requester, new_leader)?;
        self.context.database.save_goal_room(&goal_room).await?;

        self.context.emit(CollabEvent::LeaderChanged {
            goal_room_id,
            new_leader,
        });

        Ok(())
    }

    /// Adds a to-do and returns it as stored
    pub async fn add_todo(
        &self,
        requester: MemberId,
        goal_room_id: GoalRoomId,
        new_todo: NewToDo,
    ) -> ServiceResult<GoalRoomToDo> {
        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let mut goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        let period = Period::new(new_todo.start_date, new_todo.end_date)?;
        let todo = GoalRoomToDo::new(new_todo.content, period)?;

        goal_room.add_todo(requester, todo, time::today())?;

        let goal_room = self.context.database.save_goal_room(&goal_room).await?;
        let todo = goal_room.find_last_todo()?.clone();

        if let Some(todo_id) = todo.id() {
            self.context.emit(CollabEvent::ToDoAdded {
                goal_room_id,
                todo_id,
            });
        }

        Ok(todo)
    }

    /// Toggles a member's check on a to-do. Returns whether it is checked now.
    pub async fn check_todo(
        &self,
        member: MemberId,
        goal_room_id: GoalRoomId,
        todo_id: GoalRoomToDoId,
    ) -> ServiceResult<bool> {
        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        if !goal_room.is_member(member) {
            return Err(ServiceError::Forbidden(
                "only members can check to-dos".to_string(),
            ));
        }

        if goal_room.find_todo(todo_id).is_none() {
            return Err(ServiceError::NotFound(format!(
                "to-do {todo_id} does not exist in this goal room"
            )));
        }

        let key = GoalRoomMemberKey {
            goal_room: goal_room_id,
            member,
        };
        let database = &self.context.database;

        if database.todo_check_exists(todo_id, key).await? {
            database.delete_todo_check(todo_id, key).await?;
            Ok(false)
        } else {
            database.create_todo_check(todo_id, key).await?;
            Ok(true)
        }
    }

    fn id_of(goal_room: &GoalRoom) -> ServiceResult<GoalRoomId> {
        goal_room
            .id()
            .ok_or_else(|| ServiceError::Internal("stored goal room has no key".to_string()))
    }
}
