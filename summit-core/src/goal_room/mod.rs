mod check_feed;
mod members;
mod nodes;
mod todos;

use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
pub use check_feed::*;
pub use members::*;
pub use nodes::*;
pub use todos::*;

use serde::{Deserialize, Serialize};

use crate::{
    time::{self, Timestamp},
    validation::{check_length, check_range},
    DomainError, DomainResult, Key, MemberId, Roadmap, RoadmapId, RoadmapNodeId,
};

pub type GoalRoomId = Key<GoalRoom>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalRoomStatus {
    Recruiting,
    Running,
    Completed,
}

/// What happened to the roster when a member left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    LeaderChanged { new_leader: MemberId },
    /// The last member left. The room should be removed.
    Emptied,
}

/// A cohort running a roadmap together.
///
/// The roster, the to-do list and the node plans are only changed through
/// the methods here, so every rule is checked against the whole room.
#[derive(Debug, Clone)]
pub struct GoalRoom {
    id: Option<GoalRoomId>,
    name: String,
    limited_member_count: u32,
    status: GoalRoomStatus,
    roadmap: RoadmapId,
    nodes: GoalRoomRoadmapNodes,
    members: GoalRoomMembers,
    todos: GoalRoomToDos,
    created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct GoalRoomParts {
    pub id: GoalRoomId,
    pub name: String,
    pub limited_member_count: u32,
    pub status: GoalRoomStatus,
    pub roadmap: RoadmapId,
    pub created_at: Timestamp,
    pub nodes: Vec<GoalRoomRoadmapNode>,
    pub members: Vec<GoalRoomMember>,
    pub todos: Vec<GoalRoomToDo>,
}

impl GoalRoom {
    const NAME_MIN_LENGTH: usize = 1;
    const NAME_MAX_LENGTH: usize = 40;
    const MIN_MEMBER_COUNT: u32 = 1;
    const MAX_MEMBER_COUNT: u32 = 20;

    /// Opens a room on `roadmap`, led by `leader`.
    ///
    /// `plans` must schedule every node of the roadmap once, in roadmap order,
    /// and the first one must not start before `today`.
    pub fn create(
        name: impl Into<String>,
        limited_member_count: u32,
        roadmap: &Roadmap,
        plans: Vec<GoalRoomRoadmapNode>,
        leader: MemberId,
        now: Timestamp,
        today: NaiveDate,
    ) -> DomainResult<Self> {
        let name = name.into();
        Self::check_bounds(&name, limited_member_count)?;

        if roadmap.is_deleted() {
            return Err(DomainError::validation(
                "cannot open a goal room on a deleted roadmap",
            ));
        }

        let roadmap_id = roadmap.id().ok_or_else(|| {
            DomainError::Inconsistent("roadmap has not been persisted".to_string())
        })?;

        let expected = roadmap
            .contents()
            .iter()
            .map(|node| node.id())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                DomainError::Inconsistent("roadmap node has not been persisted".to_string())
            })?;
        let planned: Vec<RoadmapNodeId> = plans.iter().map(|plan| plan.roadmap_node()).collect();

        if expected != planned {
            return Err(DomainError::validation(
                "node plans must cover every roadmap node in order",
            ));
        }

        let nodes = GoalRoomRoadmapNodes::new(plans)?;
        if nodes.start_date() < today {
            return Err(DomainError::validation(
                "goal room cannot start in the past",
            ));
        }

        Ok(Self {
            id: None,
            name,
            limited_member_count,
            status: GoalRoomStatus::Recruiting,
            roadmap: roadmap_id,
            nodes,
            members: GoalRoomMembers::new(vec![GoalRoomMember::new(leader, true, now)]),
            todos: GoalRoomToDos::default(),
            created_at: time::truncate(now),
        })
    }

    pub fn restore(parts: GoalRoomParts) -> DomainResult<Self> {
        Self::check_bounds(&parts.name, parts.limited_member_count)?;

        Ok(Self {
            id: Some(parts.id),
            name: parts.name,
            limited_member_count: parts.limited_member_count,
            status: parts.status,
            roadmap: parts.roadmap,
            nodes: GoalRoomRoadmapNodes::new(parts.nodes)?,
            members: GoalRoomMembers::new(parts.members),
            todos: GoalRoomToDos::new(parts.todos),
            created_at: time::truncate(parts.created_at),
        })
    }

    fn check_bounds(name: &str, limited_member_count: u32) -> DomainResult<()> {
        check_length(
            "goal room name",
            name,
            Self::NAME_MIN_LENGTH,
            Self::NAME_MAX_LENGTH,
        )?;
        check_range(
            "limited member count",
            limited_member_count,
            Self::MIN_MEMBER_COUNT,
            Self::MAX_MEMBER_COUNT,
        )
    }

    pub fn join(&mut self, member: MemberId, now: Timestamp) -> DomainResult<()> {
        if self.status != GoalRoomStatus::Recruiting {
            return Err(DomainError::validation("goal room is not recruiting"));
        }

        if self.members.is_member(member) {
            return Err(DomainError::Conflict(format!(
                "member {member} already joined this goal room"
            )));
        }

        if self.members.size() >= self.limited_member_count as usize {
            return Err(DomainError::validation("goal room is full"));
        }

        let is_leader = self.members.is_empty();
        self.members
            .add(GoalRoomMember::new(member, is_leader, now));

        Ok(())
    }

    /// Removes a member. A leaving leader hands over to the most senior member first.
    pub fn leave(&mut self, member: MemberId) -> DomainResult<LeaveOutcome> {
        if self.status == GoalRoomStatus::Running {
            return Err(DomainError::validation(
                "cannot leave a goal room while it is running",
            ));
        }

        let leaving = self.members.find_by_member(member).ok_or_else(|| {
            DomainError::NotFound(format!("member {member} is not in this goal room"))
        })?;

        let mut outcome = LeaveOutcome::Left;

        if leaving.is_leader() {
            if let Some(successor) = self.members.successor_of(member) {
                self.promote(successor)?;
                outcome = LeaveOutcome::LeaderChanged {
                    new_leader: successor,
                };
            }
        }

        self.members.remove(member);

        if self.members.is_empty() {
            outcome = LeaveOutcome::Emptied;
        }

        Ok(outcome)
    }

    pub fn change_leader(&mut self, requester: MemberId, new_leader: MemberId) -> DomainResult<()> {
        if self.members.is_not_leader(requester)? {
            return Err(DomainError::Forbidden(
                "only the leader can hand over leadership".to_string(),
            ));
        }

        if !self.members.is_member(new_leader) {
            return Err(DomainError::NotFound(format!(
                "member {new_leader} is not in this goal room"
            )));
        }

        if requester == new_leader {
            return Ok(());
        }

        if let Some(current) = self.members.find_by_member_mut(requester) {
            current.step_down();
        }
        self.promote(new_leader)
    }

    fn promote(&mut self, member: MemberId) -> DomainResult<()> {
        let seat = self.members.find_by_member_mut(member).ok_or_else(|| {
            DomainError::NotFound(format!("member {member} is not in this goal room"))
        })?;
        seat.become_leader();

        Ok(())
    }

    pub fn add_todo(
        &mut self,
        requester: MemberId,
        todo: GoalRoomToDo,
        today: NaiveDate,
    ) -> DomainResult<()> {
        if self.members.is_not_leader(requester)? {
            return Err(DomainError::Forbidden(
                "only the leader can add to-dos".to_string(),
            ));
        }

        if self.status == GoalRoomStatus::Completed {
            return Err(DomainError::validation("goal room is already completed"));
        }

        let period = todo.period();
        if period.start() < today {
            return Err(DomainError::validation("to-do cannot start in the past"));
        }
        if period.end() > self.end_date() {
            return Err(DomainError::validation(
                "to-do cannot end after the goal room",
            ));
        }

        self.todos.add(todo);
        Ok(())
    }

    pub fn find_last_todo(&self) -> DomainResult<&GoalRoomToDo> {
        self.todos.find_last()
    }

    pub fn find_todo(&self, id: GoalRoomToDoId) -> Option<&GoalRoomToDo> {
        self.todos.find_by_id(id)
    }

    /// Moves a recruiting room to running once its first node has begun
    pub fn start(&mut self, today: NaiveDate) -> DomainResult<()> {
        if self.status != GoalRoomStatus::Recruiting {
            return Err(DomainError::validation("goal room is not recruiting"));
        }

        if today < self.start_date() {
            return Err(DomainError::validation(
                "goal room has not reached its start date",
            ));
        }

        self.status = GoalRoomStatus::Running;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        if self.status != GoalRoomStatus::Running {
            return Err(DomainError::validation("goal room is not running"));
        }

        self.status = GoalRoomStatus::Completed;
        Ok(())
    }

    pub fn current_node(&self, today: NaiveDate) -> Option<&GoalRoomRoadmapNode> {
        self.nodes.find_by_date(today)
    }

    /// Checks whether `member` may submit a check feed today and returns what the feed binds to.
    ///
    /// `submitted_today` tells if the member already submitted one today,
    /// `node_feed_count` how many they submitted for the node in progress.
    pub fn authorize_check_feed(
        &self,
        member: MemberId,
        today: NaiveDate,
        submitted_today: bool,
        node_feed_count: u32,
    ) -> DomainResult<(GoalRoomMemberKey, RoadmapNodeId)> {
        let id = self.id.ok_or_else(|| {
            DomainError::Inconsistent("goal room has not been persisted".to_string())
        })?;

        if self.status != GoalRoomStatus::Running {
            return Err(DomainError::validation("goal room is not running"));
        }

        if !self.members.is_member(member) {
            return Err(DomainError::Forbidden(
                "only members can submit check feeds".to_string(),
            ));
        }

        let node = self.current_node(today).ok_or_else(|| {
            DomainError::validation("no roadmap node is in progress today")
        })?;

        if submitted_today {
            return Err(DomainError::validation(
                "a check feed was already submitted today",
            ));
        }

        if node_feed_count >= node.check_count() {
            return Err(DomainError::validation(
                "every check feed for this node is already submitted",
            ));
        }

        let key = GoalRoomMemberKey {
            goal_room: id,
            member,
        };
        Ok((key, node.roadmap_node()))
    }

    /// Recomputes a member's accomplishment rate from their total feed count
    pub fn update_accomplishment_rate(
        &mut self,
        member: MemberId,
        feed_count: u32,
    ) -> DomainResult<f64> {
        let total = self.nodes.total_check_count();
        let rate = if total == 0 {
            0.0
        } else {
            100.0 * f64::from(feed_count.min(total)) / f64::from(total)
        };

        let seat = self.members.find_by_member_mut(member).ok_or_else(|| {
            DomainError::NotFound(format!("member {member} is not in this goal room"))
        })?;
        seat.update_accomplishment_rate(rate);

        Ok(rate)
    }

    pub fn is_leader(&self, member: MemberId) -> bool {
        self.members
            .find_by_member(member)
            .map(|seat| seat.is_leader())
            .unwrap_or(false)
    }

    pub fn is_member(&self, member: MemberId) -> bool {
        self.members.is_member(member)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.nodes.start_date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.nodes.end_date()
    }

    pub fn id(&self) -> Option<GoalRoomId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limited_member_count(&self) -> u32 {
        self.limited_member_count
    }

    pub fn status(&self) -> GoalRoomStatus {
        self.status
    }

    pub fn roadmap(&self) -> RoadmapId {
        self.roadmap
    }

    pub fn nodes(&self) -> &GoalRoomRoadmapNodes {
        &self.nodes
    }

    pub fn members(&self) -> &GoalRoomMembers {
        &self.members
    }

    pub fn todos(&self) -> &GoalRoomToDos {
        &self.todos
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl GoalRoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recruiting => "RECRUITING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl Display for GoalRoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalRoomStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECRUITING" => Ok(Self::Recruiting),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!(
                "unknown goal room status {other}"
            ))),
        }
    }
}
