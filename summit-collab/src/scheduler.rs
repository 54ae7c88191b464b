use chrono::{Duration, NaiveDate};
use log::info;
use summit_core::{GoalRoom, GoalRoomId, GoalRoomStatus};

use crate::{BlobStore, CollabContext, CollabEvent, Database, ServiceResult};

/// Moves goal rooms along their lifecycle as days pass
pub struct Scheduler<Db, Blob> {
    context: CollabContext<Db, Blob>,
}

/// What a scheduler run changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerReport {
    pub started: usize,
    pub completed: usize,
}

impl<Db, Blob> Scheduler<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    pub fn new(context: &CollabContext<Db, Blob>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Starts recruiting rooms whose first node begins `today`
    /// and completes running rooms whose last node ended yesterday.
    pub async fn run(&self, today: NaiveDate) -> ServiceResult<SchedulerReport> {
        let mut report = SchedulerReport::default();

        for room in self.context.database.goal_rooms_by_start_date(today).await? {
            let Some(goal_room_id) = room.id() else {
                continue;
            };

            let started = self
                .transition(goal_room_id, GoalRoomStatus::Recruiting, |room| {
                    room.start(today)
                })
                .await?;

            if started {
                report.started += 1;
                self.context
                    .emit(CollabEvent::GoalRoomStarted { goal_room_id });
            }
        }

        let yesterday = today - Duration::days(1);

        for room in self.context.database.goal_rooms_by_end_date(yesterday).await? {
            let Some(goal_room_id) = room.id() else {
                continue;
            };

            let completed = self
                .transition(goal_room_id, GoalRoomStatus::Running, GoalRoom::complete)
                .await?;

            if completed {
                report.completed += 1;
                self.context
                    .emit(CollabEvent::GoalRoomCompleted { goal_room_id });
            }
        }

        if report != SchedulerReport::default() {
            info!(
                "Started {} and completed {} goal rooms",
                report.started, report.completed
            );
        }

        Ok(report)
    }

    /// Applies `change` if the room is still in `from`, returning whether it did
    async fn transition<F>(
        &self,
        goal_room_id: GoalRoomId,
        from: GoalRoomStatus,
        change: F,
    ) -> ServiceResult<bool>
    where
        F: FnOnce(&mut GoalRoom) -> summit_core::DomainResult<()>,
    {
        let _guard = self.context.goal_room_locks.lock(goal_room_id).await;
        let mut goal_room = self.context.database.goal_room_by_id(goal_room_id).await?;

        if goal_room.status() != from {
            return Ok(false);
        }

        change(&mut goal_room)?;
        self.context.database.save_goal_room(&goal_room).await?;

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use summit_core::{time, GoalRoomStatus};
    use tempfile::tempdir;

    use crate::{
        test_support::{collab, new_goal_room, register, start_day, stored_roadmap},
        CollabEvent,
    };

    use super::SchedulerReport;

    #[tokio::test]
    async fn rooms_start_and_complete_on_their_dates() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let leader = register(&collab, "leader1").await;
        let roadmap = stored_roadmap(&collab, leader).await;

        let room = collab
            .goal_rooms
            .create(leader, new_goal_room(&roadmap, start_day()))
            .await
            .unwrap();
        let room_id = room.id().unwrap();

        let report = collab.scheduler.run(time::today()).await.unwrap();
        assert_eq!(report, SchedulerReport::default());

        let report = collab.scheduler.run(start_day()).await.unwrap();
        assert_eq!(report.started, 1);
        assert_eq!(
            collab.goal_rooms.goal_room(room_id).await.unwrap().status(),
            GoalRoomStatus::Running
        );

        // Nothing to do when run twice on the same day
        let report = collab.scheduler.run(start_day()).await.unwrap();
        assert_eq!(report.started, 0);

        let day_after_end = room.end_date() + Duration::days(1);
        let report = collab.scheduler.run(day_after_end).await.unwrap();
        assert_eq!(report.completed, 1);
        assert_eq!(
            collab.goal_rooms.goal_room(room_id).await.unwrap().status(),
            GoalRoomStatus::Completed
        );

        let events: Vec<_> = collab.events().try_iter().collect();
        assert!(events.contains(&CollabEvent::GoalRoomStarted {
            goal_room_id: room_id
        }));
        assert!(events.contains(&CollabEvent::GoalRoomCompleted {
            goal_room_id: room_id
        }));
    }

    #[tokio::test]
    async fn recruiting_rooms_are_not_completed() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        let leader = register(&collab, "leader1").await;
        let roadmap = stored_roadmap(&collab, leader).await;

        let room = collab
            .goal_rooms
            .create(leader, new_goal_room(&roadmap, start_day()))
            .await
            .unwrap();

        let day_after_end = room.end_date() + Duration::days(1);
        let report = collab.scheduler.run(day_after_end).await.unwrap();

        assert_eq!(report.completed, 0);
        assert_eq!(
            collab
                .goal_rooms
                .goal_room(room.id().unwrap())
                .await
                .unwrap()
                .status(),
            GoalRoomStatus::Recruiting
        );
    }
}
