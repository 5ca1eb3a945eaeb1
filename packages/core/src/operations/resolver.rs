//! Placement resolvers
//!
//! Both resolvers walk the same chain of candidate positions: starting at a
//! position, and while its `after` node can itself hold children, continuing at
//! `(after, after's last child)` one nesting level deeper. This is the set of
//! places reachable from a cursor by "going into" the preceding container.
//!
//! - `possible_child_types` answers "what new node may go here, and where"
//! - `move_target_positions` answers "where may this existing node be moved"
//!
//! Together they keep every section at depth ≤ `max_section_depth`.

use crate::models::{NodeType, Position};
use crate::operations::{DocumentTree, TreeOperationError};
use serde::Serialize;

/// A type admissible for a new node, with every position it may take
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTypeCandidate {
    pub node_type: NodeType,
    pub positions: Vec<Position>,
}

impl DocumentTree {
    /// Legal `(type, positions)` pairs for inserting a new node
    ///
    /// `level` is the nesting level of `position.parent`. A section is never offered
    /// at a level where it would exceed `max_section_depth`. The result is ordered by
    /// canonical priority (section, text, image, resource, quote, code, then others)
    /// with ties broken by type key.
    pub fn possible_child_types(
        &self,
        position: &Position,
        level: usize,
    ) -> Result<Vec<ChildTypeCandidate>, TreeOperationError> {
        let max_depth = self.max_section_depth();
        let mut candidates: Vec<ChildTypeCandidate> = Vec::new();
        let mut current = Some(position.clone());
        let mut level = level;

        while let Some(position) = current {
            let parent = self.node(&position.parent)?;
            let expected = self
                .registry()
                .expected_types(&parent.node_type, &self.config().children_collection);

            for node_type in expected {
                if node_type.is_section() && level >= max_depth {
                    continue;
                }
                match candidates
                    .iter_mut()
                    .find(|candidate| &candidate.node_type == node_type)
                {
                    Some(candidate) => candidate.positions.push(position.clone()),
                    None => candidates.push(ChildTypeCandidate {
                        node_type: node_type.clone(),
                        positions: vec![position.clone()],
                    }),
                }
            }

            current = self.descend(&position)?;
            level += 1;
        }

        candidates.sort_by(|a, b| {
            a.node_type
                .canonical_rank()
                .cmp(&b.node_type.canonical_rank())
                .then_with(|| a.node_type.key().cmp(b.node_type.key()))
        });

        Ok(candidates)
    }

    /// `possible_child_types` starting at the level of `position.parent`
    pub fn possible_child_types_at(
        &self,
        position: &Position,
    ) -> Result<Vec<ChildTypeCandidate>, TreeOperationError> {
        let level = self.nesting_level(&position.parent)?;
        self.possible_child_types(position, level)
    }

    /// Legal destinations for relocating `node_id`
    ///
    /// The walk stops once `level` exceeds `max_section_depth - depth(node)`, so the
    /// moved subtree always fits under the depth ceiling. Only parents whose expected
    /// types include the node's type are returned. Positions inside the node's own
    /// subtree, or directly after the node itself, are never offered.
    pub fn move_target_positions(
        &self,
        node_id: &str,
        position: &Position,
        level: usize,
    ) -> Result<Vec<Position>, TreeOperationError> {
        let node_type = self.node(node_id)?.node_type.clone();
        let depth = self.section_depth(node_id)?;
        let Some(max_level) = self.max_section_depth().checked_sub(depth) else {
            return Ok(Vec::new());
        };

        let mut targets = Vec::new();
        let mut current = Some(position.clone());
        let mut level = level;

        while let Some(position) = current {
            if level > max_level
                || position.after.as_deref() == Some(node_id)
                || self.is_within(&position.parent, node_id)
            {
                break;
            }

            let parent = self.node(&position.parent)?;
            if self
                .registry()
                .expected_types(&parent.node_type, &self.config().children_collection)
                .contains(&node_type)
            {
                targets.push(position.clone());
            }

            current = self.descend(&position)?;
            level += 1;
        }

        Ok(targets)
    }

    /// `move_target_positions` starting at the level of `position.parent`
    pub fn move_target_positions_at(
        &self,
        node_id: &str,
        position: &Position,
    ) -> Result<Vec<Position>, TreeOperationError> {
        let level = self.nesting_level(&position.parent)?;
        self.move_target_positions(node_id, position, level)
    }

    /// Next candidate one level down: into `after`, behind its last child
    fn descend(&self, position: &Position) -> Result<Option<Position>, TreeOperationError> {
        let Some(after) = &position.after else {
            return Ok(None);
        };

        let after_node = self.node(after)?;
        if !self.is_container_type(&after_node.node_type) {
            return Ok(None);
        }

        Ok(Some(Position::new(
            after.clone(),
            after_node.last_child().map(str::to_string),
        )))
    }
}
