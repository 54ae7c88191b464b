use crate::{
    time::{self, Timestamp},
    DomainError, DomainResult, MemberId,
};

/// A member's seat in a goal room
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRoomMember {
    member: MemberId,
    is_leader: bool,
    joined_at: Timestamp,
    /// Percentage of the room's required check feeds this member submitted
    accomplishment_rate: f64,
}

impl GoalRoomMember {
    pub fn new(member: MemberId, is_leader: bool, joined_at: Timestamp) -> Self {
        Self {
            member,
            is_leader,
            joined_at: time::truncate(joined_at),
            accomplishment_rate: 0.0,
        }
    }

    pub fn restore(
        member: MemberId,
        is_leader: bool,
        joined_at: Timestamp,
        accomplishment_rate: f64,
    ) -> Self {
        Self {
            accomplishment_rate,
            ..Self::new(member, is_leader, joined_at)
        }
    }

    pub fn member(&self) -> MemberId {
        self.member
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    pub fn joined_at(&self) -> Timestamp {
        self.joined_at
    }

    pub fn accomplishment_rate(&self) -> f64 {
        self.accomplishment_rate
    }

    pub(crate) fn become_leader(&mut self) {
        self.is_leader = true;
    }

    pub(crate) fn step_down(&mut self) {
        self.is_leader = false;
    }

    pub(crate) fn update_accomplishment_rate(&mut self, rate: f64) {
        self.accomplishment_rate = rate;
    }

    fn seniority(&self) -> (Timestamp, MemberId) {
        (self.joined_at, self.member)
    }
}

/// The roster of a goal room.
///
/// While the roster is not empty exactly one entry is the leader.
#[derive(Debug, Clone, Default)]
pub struct GoalRoomMembers {
    values: Vec<GoalRoomMember>,
}

impl GoalRoomMembers {
    pub fn new(values: Vec<GoalRoomMember>) -> Self {
        Self { values }
    }

    pub(crate) fn add(&mut self, member: GoalRoomMember) {
        self.values.push(member);
    }

    pub(crate) fn remove(&mut self, member: MemberId) -> Option<GoalRoomMember> {
        let index = self.values.iter().position(|m| m.member == member)?;
        Some(self.values.remove(index))
    }

    pub fn find_by_member(&self, member: MemberId) -> Option<&GoalRoomMember> {
        self.values.iter().find(|m| m.member == member)
    }

    pub(crate) fn find_by_member_mut(&mut self, member: MemberId) -> Option<&mut GoalRoomMember> {
        self.values.iter_mut().find(|m| m.member == member)
    }

    pub fn is_member(&self, member: MemberId) -> bool {
        self.find_by_member(member).is_some()
    }

    /// Fails if the roster has no single leader to compare against
    pub fn is_not_leader(&self, member: MemberId) -> DomainResult<bool> {
        let leader = self.find_goal_room_leader()?;
        Ok(leader.member != member)
    }

    pub fn find_goal_room_leader(&self) -> DomainResult<&GoalRoomMember> {
        let mut leaders = self.values.iter().filter(|m| m.is_leader);

        match (leaders.next(), leaders.next()) {
            (Some(leader), None) => Ok(leader),
            (None, _) => Err(DomainError::Inconsistent(
                "goal room has no leader".to_string(),
            )),
            (Some(_), Some(_)) => Err(DomainError::Inconsistent(
                "goal room has more than one leader".to_string(),
            )),
        }
    }

    /// The member that would lead next: the second most senior one.
    /// Seniority is join time, then member key.
    pub fn find_next_leader(&self) -> Option<&GoalRoomMember> {
        if self.values.len() <= 1 {
            return None;
        }

        let mut by_seniority: Vec<_> = self.values.iter().collect();
        by_seniority.sort_by_key(|m| m.seniority());

        by_seniority.get(1).copied()
    }

    /// The most senior member other than `leaving`
    pub(crate) fn successor_of(&self, leaving: MemberId) -> Option<MemberId> {
        self.values
            .iter()
            .filter(|m| m.member != leaving)
            .min_by_key(|m| m.seniority())
            .map(|m| m.member)
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalRoomMember> {
        self.values.iter()
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Utc};

    use crate::{time::Timestamp, DomainError, MemberId};

    use super::{GoalRoomMember, GoalRoomMembers};

    fn at(seconds: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn seat(member: i32, is_leader: bool, joined: i64) -> GoalRoomMember {
        GoalRoomMember::new(MemberId::new(member), is_leader, at(joined))
    }

    #[test]
    fn no_next_leader_for_a_single_member() {
        let members = GoalRoomMembers::new(vec![]);
        assert!(members.find_next_leader().is_none());

        let members = GoalRoomMembers::new(vec![seat(1, true, 0)]);
        assert!(members.find_next_leader().is_none());
    }

    #[test]
    fn next_leader_ignores_insertion_order() {
        let members = GoalRoomMembers::new(vec![
            seat(3, false, 20),
            seat(1, true, 0),
            seat(2, false, 10),
        ]);

        let next = members.find_next_leader().unwrap();
        assert_eq!(next.member(), MemberId::new(2));

        // Roster order is untouched
        let order: Vec<_> = members.iter().map(|m| m.member().value()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn identical_join_times_fall_back_to_member_key() {
        let members = GoalRoomMembers::new(vec![
            seat(1, true, 0),
            seat(7, false, 5),
            seat(4, false, 5),
        ]);

        assert_eq!(members.find_next_leader().unwrap().member(), MemberId::new(4));
    }

    #[test]
    fn leader_lookup_requires_exactly_one() {
        let members = GoalRoomMembers::new(vec![seat(1, false, 0), seat(2, true, 1)]);
        assert_eq!(members.find_goal_room_leader().unwrap().member(), MemberId::new(2));
        assert!(members.is_not_leader(MemberId::new(1)).unwrap());
        assert!(!members.is_not_leader(MemberId::new(2)).unwrap());

        let leaderless = GoalRoomMembers::new(vec![seat(1, false, 0)]);
        assert!(matches!(
            leaderless.find_goal_room_leader(),
            Err(DomainError::Inconsistent(_))
        ));
        assert!(leaderless.is_not_leader(MemberId::new(1)).is_err());

        let crowded = GoalRoomMembers::new(vec![seat(1, true, 0), seat(2, true, 1)]);
        assert!(crowded.find_goal_room_leader().is_err());
    }

    #[test]
    fn remove_and_lookup() {
        let mut members = GoalRoomMembers::new(vec![seat(1, true, 0), seat(2, false, 1)]);

        assert!(members.is_member(MemberId::new(2)));
        assert!(members.remove(MemberId::new(2)).is_some());
        assert!(!members.is_member(MemberId::new(2)));
        assert!(members.remove(MemberId::new(2)).is_none());
        assert_eq!(members.size(), 1);
    }
}
