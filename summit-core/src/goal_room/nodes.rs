use chrono::NaiveDate;

use crate::{DomainError, DomainResult, Key, RoadmapNodeId};

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation(
                "period start must not be after its end",
            ));
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn overlaps(&self, other: &Period) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

pub type GoalRoomRoadmapNodeId = Key<GoalRoomRoadmapNode>;

/// The schedule a goal room sets for one roadmap node
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRoomRoadmapNode {
    id: Option<GoalRoomRoadmapNodeId>,
    roadmap_node: RoadmapNodeId,
    period: Period,
    /// How many check feeds a member submits for this node
    check_count: u32,
}

impl GoalRoomRoadmapNode {
    pub fn new(
        roadmap_node: RoadmapNodeId,
        period: Period,
        check_count: u32,
    ) -> DomainResult<Self> {
        if check_count < 1 || i64::from(check_count) > period.days() {
            return Err(DomainError::validation(
                "check count must be between 1 and the number of days in the node period",
            ));
        }

        Ok(Self {
            id: None,
            roadmap_node,
            period,
            check_count,
        })
    }

    pub fn restore(
        id: GoalRoomRoadmapNodeId,
        roadmap_node: RoadmapNodeId,
        period: Period,
        check_count: u32,
    ) -> DomainResult<Self> {
        let mut node = Self::new(roadmap_node, period, check_count)?;
        node.id = Some(id);

        Ok(node)
    }

    pub fn id(&self) -> Option<GoalRoomRoadmapNodeId> {
        self.id
    }

    pub fn roadmap_node(&self) -> RoadmapNodeId {
        self.roadmap_node
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn check_count(&self) -> u32 {
        self.check_count
    }
}

/// The node plans of a goal room, ordered like the roadmap's nodes
#[derive(Debug, Clone)]
pub struct GoalRoomRoadmapNodes {
    values: Vec<GoalRoomRoadmapNode>,
}

impl GoalRoomRoadmapNodes {
    pub fn new(values: Vec<GoalRoomRoadmapNode>) -> DomainResult<Self> {
        if values.is_empty() {
            return Err(DomainError::validation(
                "goal room needs at least one node plan",
            ));
        }

        for pair in values.windows(2) {
            let (previous, next) = (&pair[0].period, &pair[1].period);

            if previous.overlaps(next) || next.start < previous.start {
                return Err(DomainError::validation("node periods must not overlap"));
            }
        }

        Ok(Self { values })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.values[0].period.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.values[self.values.len() - 1].period.end
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Option<&GoalRoomRoadmapNode> {
        self.values.iter().find(|node| node.period.contains(date))
    }

    pub fn total_check_count(&self) -> u32 {
        self.values.iter().map(|node| node.check_count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalRoomRoadmapNode> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::RoadmapNodeId;

    use super::{GoalRoomRoadmapNode, GoalRoomRoadmapNodes, Period};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, day).unwrap()
    }

    fn plan(node: i32, start: u32, end: u32) -> GoalRoomRoadmapNode {
        let period = Period::new(date(start), date(end)).unwrap();
        GoalRoomRoadmapNode::new(RoadmapNodeId::new(node), period, 1).unwrap()
    }

    #[test]
    fn periods_are_inclusive() {
        let period = Period::new(date(1), date(3)).unwrap();

        assert_eq!(period.days(), 3);
        assert!(period.contains(date(3)));
        assert!(!period.contains(date(4)));
        assert!(Period::new(date(2), date(1)).is_err());
    }

    #[test]
    fn check_count_fits_the_period() {
        let period = Period::new(date(1), date(3)).unwrap();

        assert!(GoalRoomRoadmapNode::new(RoadmapNodeId::new(1), period, 3).is_ok());
        assert!(GoalRoomRoadmapNode::new(RoadmapNodeId::new(1), period, 4).is_err());
        assert!(GoalRoomRoadmapNode::new(RoadmapNodeId::new(1), period, 0).is_err());
    }

    #[test]
    fn plans_do_not_overlap() {
        let nodes = GoalRoomRoadmapNodes::new(vec![plan(1, 1, 5), plan(2, 6, 10)]).unwrap();
        assert_eq!(nodes.start_date(), date(1));
        assert_eq!(nodes.end_date(), date(10));
        assert_eq!(nodes.find_by_date(date(7)).unwrap().roadmap_node(), RoadmapNodeId::new(2));

        let error = GoalRoomRoadmapNodes::new(vec![plan(1, 1, 5), plan(2, 5, 10)]).unwrap_err();
        assert_eq!(error.to_string(), "node periods must not overlap");
        assert!(GoalRoomRoadmapNodes::new(vec![plan(1, 6, 10), plan(2, 1, 5)]).is_err());
        assert!(GoalRoomRoadmapNodes::new(vec![]).is_err());
    }
}
