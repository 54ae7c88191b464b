use std::fmt::Display;

use crossbeam::channel::{Receiver, Sender};
use log::warn;
use summit_core::{
    CheckFeedId, GoalRoomId, GoalRoomToDoId, LeaveOutcome, MemberId, RoadmapId,
};

pub type EventSender = Sender<CollabEvent>;
pub type EventReceiver = Receiver<CollabEvent>;

/// Sends an event, logging it if nobody listens anymore
pub(crate) fn emit(sender: &EventSender, event: CollabEvent) {
    if let Err(error) = sender.send(event) {
        warn!("Dropped event: {}", error.into_inner());
    }
}

/// Events emitted by the collab system after a change was stored
#[derive(Debug, Clone, PartialEq)]
pub enum CollabEvent {
    MemberRegistered {
        member_id: MemberId,
        identifier: String,
    },
    RoadmapCreated {
        roadmap_id: RoadmapId,
        creator: MemberId,
    },
    /// The roadmap was soft deleted by its creator
    RoadmapDeleted {
        roadmap_id: RoadmapId,
    },
    RoadmapReviewed {
        roadmap_id: RoadmapId,
        member_id: MemberId,
    },
    GoalRoomCreated {
        goal_room_id: GoalRoomId,
        leader: MemberId,
    },
    MemberJoined {
        goal_room_id: GoalRoomId,
        member_id: MemberId,
    },
    MemberLeft {
        goal_room_id: GoalRoomId,
        member_id: MemberId,
        outcome: LeaveOutcome,
    },
    LeaderChanged {
        goal_room_id: GoalRoomId,
        new_leader: MemberId,
    },
    ToDoAdded {
        goal_room_id: GoalRoomId,
        todo_id: GoalRoomToDoId,
    },
    CheckFeedSubmitted {
        goal_room_id: GoalRoomId,
        member_id: MemberId,
        check_feed_id: CheckFeedId,
    },
    CheckFeedDeleted {
        goal_room_id: GoalRoomId,
        check_feed_id: CheckFeedId,
    },
    GoalRoomStarted {
        goal_room_id: GoalRoomId,
    },
    GoalRoomCompleted {
        goal_room_id: GoalRoomId,
    },
    /// The last member left and the room was removed
    GoalRoomRemoved {
        goal_room_id: GoalRoomId,
    },
}

impl Display for CollabEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberRegistered {
                member_id,
                identifier,
            } => write!(f, "Member {member_id} registered as {identifier}"),
            Self::RoadmapCreated {
                roadmap_id,
                creator,
            } => write!(f, "Roadmap {roadmap_id} created by member {creator}"),
            Self::RoadmapDeleted { roadmap_id } => write!(f, "Roadmap {roadmap_id} deleted"),
            Self::RoadmapReviewed {
                roadmap_id,
                member_id,
            } => write!(f, "Roadmap {roadmap_id} reviewed by member {member_id}"),
            Self::GoalRoomCreated {
                goal_room_id,
                leader,
            } => write!(f, "Goal room {goal_room_id} opened by member {leader}"),
            Self::MemberJoined {
                goal_room_id,
                member_id,
            } => write!(f, "Member {member_id} joined goal room {goal_room_id}"),
            Self::MemberLeft {
                goal_room_id,
                member_id,
                outcome,
            } => write!(
                f,
                "Member {member_id} left goal room {goal_room_id} ({outcome:?})"
            ),
            Self::LeaderChanged {
                goal_room_id,
                new_leader,
            } => write!(f, "Member {new_leader} now leads goal room {goal_room_id}"),
            Self::ToDoAdded {
                goal_room_id,
                todo_id,
            } => write!(f, "To-do {todo_id} added to goal room {goal_room_id}"),
            Self::CheckFeedSubmitted {
                goal_room_id,
                member_id,
                check_feed_id,
            } => write!(
                f,
                "Member {member_id} submitted check feed {check_feed_id} in goal room {goal_room_id}"
            ),
            Self::CheckFeedDeleted {
                goal_room_id,
                check_feed_id,
            } => write!(
                f,
                "Check feed {check_feed_id} deleted from goal room {goal_room_id}"
            ),
            Self::GoalRoomStarted { goal_room_id } => {
                write!(f, "Goal room {goal_room_id} started")
            }
            Self::GoalRoomCompleted { goal_room_id } => {
                write!(f, "Goal room {goal_room_id} completed")
            }
            Self::GoalRoomRemoved { goal_room_id } => {
                write!(f, "Goal room {goal_room_id} removed")
            }
        }
    }
}
