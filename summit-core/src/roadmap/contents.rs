use crate::{validation::check_length, DomainError, DomainResult, Key};

use super::RoadmapId;

pub type RoadmapNodeId = Key<RoadmapNode>;

/// One step of a roadmap
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapNode {
    id: Option<RoadmapNodeId>,
    /// The roadmap this node belongs to. Bound once, never reassigned.
    roadmap: Option<RoadmapId>,
    /// 1-based position within the roadmap, assigned when the node is added
    ordinal: u32,
    title: String,
    description: String,
}

impl RoadmapNode {
    const TITLE_MIN_LENGTH: usize = 1;
    const TITLE_MAX_LENGTH: usize = 40;
    const DESCRIPTION_MIN_LENGTH: usize = 1;
    const DESCRIPTION_MAX_LENGTH: usize = 2000;

    pub fn new(title: impl Into<String>, description: impl Into<String>) -> DomainResult<Self> {
        let title = title.into();
        let description = description.into();

        check_length(
            "roadmap node title",
            &title,
            Self::TITLE_MIN_LENGTH,
            Self::TITLE_MAX_LENGTH,
        )?;
        check_length(
            "roadmap node description",
            &description,
            Self::DESCRIPTION_MIN_LENGTH,
            Self::DESCRIPTION_MAX_LENGTH,
        )?;

        Ok(Self {
            id: None,
            roadmap: None,
            ordinal: 0,
            title,
            description,
        })
    }

    /// Rebuilds a persisted node
    pub fn restore(
        id: RoadmapNodeId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        let mut node = Self::new(title, description)?;
        node.id = Some(id);

        Ok(node)
    }

    pub fn id(&self) -> Option<RoadmapNodeId> {
        self.id
    }

    pub fn roadmap(&self) -> Option<RoadmapId> {
        self.roadmap
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn is_not_same_roadmap(&self, roadmap: Option<RoadmapId>) -> bool {
        self.roadmap != roadmap
    }

    pub(crate) fn bind_roadmap(&mut self, roadmap: RoadmapId) -> DomainResult<()> {
        match self.roadmap {
            Some(existing) if existing != roadmap => Err(DomainError::Validation(format!(
                "roadmap node already belongs to roadmap {existing}"
            ))),
            _ => {
                self.roadmap = Some(roadmap);
                Ok(())
            }
        }
    }
}

/// The ordered steps of a roadmap
#[derive(Debug, Clone, Default)]
pub struct RoadmapContents {
    values: Vec<RoadmapNode>,
}

impl RoadmapContents {
    pub(crate) fn add(&mut self, mut node: RoadmapNode) {
        node.ordinal = self.values.len() as u32 + 1;
        self.values.push(node);
    }

    pub fn find_last_roadmap_content(&self) -> Option<&RoadmapNode> {
        self.values.last()
    }

    pub fn find_by_id(&self, id: RoadmapNodeId) -> Option<&RoadmapNode> {
        self.values.iter().find(|node| node.id == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadmapNode> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
