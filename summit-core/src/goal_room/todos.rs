use crate::{validation::check_length, DomainError, DomainResult, Key};

use super::Period;

pub type GoalRoomToDoId = Key<GoalRoomToDo>;

#[derive(Debug, Clone, PartialEq)]
pub struct GoalRoomToDo {
    id: Option<GoalRoomToDoId>,
    content: String,
    period: Period,
}

impl GoalRoomToDo {
    const CONTENT_MIN_LENGTH: usize = 1;
    const CONTENT_MAX_LENGTH: usize = 250;

    pub fn new(content: impl Into<String>, period: Period) -> DomainResult<Self> {
        let content = content.into();
        check_length(
            "to-do content",
            &content,
            Self::CONTENT_MIN_LENGTH,
            Self::CONTENT_MAX_LENGTH,
        )?;

        Ok(Self {
            id: None,
            content,
            period,
        })
    }

    pub fn restore(
        id: GoalRoomToDoId,
        content: impl Into<String>,
        period: Period,
    ) -> DomainResult<Self> {
        let mut todo = Self::new(content, period)?;
        todo.id = Some(id);

        Ok(todo)
    }

    pub fn id(&self) -> Option<GoalRoomToDoId> {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn is_same_id(&self, id: GoalRoomToDoId) -> bool {
        self.id == Some(id)
    }
}

/// Append-only list of a goal room's to-dos
#[derive(Debug, Clone, Default)]
pub struct GoalRoomToDos {
    values: Vec<GoalRoomToDo>,
}

impl GoalRoomToDos {
    pub fn new(values: Vec<GoalRoomToDo>) -> Self {
        Self { values }
    }

    pub(crate) fn add(&mut self, todo: GoalRoomToDo) {
        self.values.push(todo);
    }

    pub fn find_last(&self) -> DomainResult<&GoalRoomToDo> {
        self.values
            .last()
            .ok_or_else(|| DomainError::Inconsistent("goal room has no to-dos".to_string()))
    }

    pub fn find_by_id(&self, id: GoalRoomToDoId) -> Option<&GoalRoomToDo> {
        self.values.iter().find(|todo| todo.is_same_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GoalRoomToDo> {
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

    use crate::{DomainError, GoalRoomToDoId, Period};

    use super::{GoalRoomToDo, GoalRoomToDos};

    fn period() -> Period {
        let day = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        Period::new(day, day).unwrap()
    }

    #[test]
    fn find_last_on_empty_is_a_fault() {
        let todos = GoalRoomToDos::default();

        assert!(matches!(todos.find_last(), Err(DomainError::Inconsistent(_))));
    }

    #[test]
    fn find_last_and_by_id() {
        let mut todos = GoalRoomToDos::default();
        todos.add(GoalRoomToDo::restore(GoalRoomToDoId::new(1), "read", period()).unwrap());
        todos.add(GoalRoomToDo::restore(GoalRoomToDoId::new(2), "write", period()).unwrap());

        assert_eq!(todos.find_last().unwrap().content(), "write");
        assert_eq!(
            todos.find_by_id(GoalRoomToDoId::new(1)).unwrap().content(),
            "read"
        );
        assert!(todos.find_by_id(GoalRoomToDoId::new(3)).is_none());
    }

    #[test]
    fn content_length() {
        assert!(GoalRoomToDo::new("", period()).is_err());
        assert!(GoalRoomToDo::new("a".repeat(251), period()).is_err());
        assert!(GoalRoomToDo::new("a".repeat(250), period()).is_ok());
    }
}
