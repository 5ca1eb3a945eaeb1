//! Document Tree - Node Placement Engine
//!
//! `DocumentTree` owns every node of one document in an id-keyed arena and is the
//! only place where structure changes:
//!
//! - `insert` / `remove` / `relocate` / `discard` - structural primitives
//! - `create_node` / `update_node` - allocation and attribute changes via the backing store
//! - `persist_dirty` - write changed child orders back to the store
//!
//! # Cascading Re-parenting
//!
//! Inserting a section pulls the non-section siblings that follow it into the
//! section, up to (not including) the next section sibling. They are appended,
//! in order, to the innermost section reached by walking down the new section's
//! trailing section children. Relocation goes through the same insert path, so a
//! moved section re-absorbs trailing siblings at its destination.
//!
//! # Concurrency
//!
//! Mutations take `&mut self` and never suspend, so they cannot interleave.
//! Store writes made by a mutation happen before the in-memory change; a store
//! failure leaves the tree untouched. When a mutation needs several store writes
//! and a later one fails, the earlier ones are undone before the error is
//! returned:
//!
//! - permanent removal snapshots every record of the subtree and re-`set`s the
//!   ones already deleted (restored records get a fresh store timestamp)
//! - `update_node` stamps the document first and restores the previous stamp if
//!   the node write fails
//!
//! An undo that itself fails is logged with `warn!` and the original error is
//! still returned.

use crate::config::TreeConfig;
use crate::db::{BackingStore, TreeEvent};
use crate::models::{Node, NodeType, Position, TypeRegistry, ValidationError};
use crate::operations::TreeOperationError;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Nested, serializable snapshot of a (sub)tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineNode {
    pub id: String,
    pub node_type: NodeType,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// In-memory document tree bound to a backing store
pub struct DocumentTree {
    document_id: String,
    nodes: HashMap<String, Node>,
    registry: Arc<TypeRegistry>,
    store: Arc<dyn BackingStore>,
    config: TreeConfig,
    event_tx: broadcast::Sender<TreeEvent>,
}

impl DocumentTree {
    /// Create a new document and its tree
    ///
    /// The document record is allocated in `store` with creator, name, title and
    /// creation/update timestamps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use outline_core::config::TreeConfig;
    /// use outline_core::db::MemoryStore;
    /// use outline_core::models::TypeRegistry;
    /// use outline_core::operations::DocumentTree;
    /// use std::sync::Arc;
    ///
    /// let tree = DocumentTree::new(
    ///     Arc::new(MemoryStore::new()),
    ///     Arc::new(TypeRegistry::default()),
    ///     TreeConfig::default(),
    ///     "/user/ada",
    ///     "notes",
    ///     "My Notes",
    /// )
    /// .unwrap();
    /// assert_eq!(tree.document().unwrap().title(), Some("My Notes"));
    /// ```
    pub fn new(
        store: Arc<dyn BackingStore>,
        registry: Arc<TypeRegistry>,
        config: TreeConfig,
        creator: &str,
        name: &str,
        title: &str,
    ) -> Result<Self, TreeOperationError> {
        config
            .validate()
            .map_err(TreeOperationError::InvalidConfig)?;

        let now = Utc::now();
        let record = store.set(
            None,
            &NodeType::Document,
            json!({
                "creator": creator,
                "name": name,
                "title": title,
                "created_at": now.to_rfc3339(),
                "updated_at": now.to_rfc3339(),
            }),
        )?;

        let mut document =
            Node::new_with_id(record.id.clone(), NodeType::Document, None, record.properties);
        document.created_at = now;
        document.modified_at = now;

        let document_id = document.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(document_id.clone(), document);

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        tracing::debug!("Created document '{}' ({})", title, document_id);

        Ok(Self {
            document_id,
            nodes,
            registry,
            store,
            config,
            event_tx,
        })
    }

    /// Create a document with the core type registry and default configuration
    pub fn with_defaults(
        store: Arc<dyn BackingStore>,
        creator: &str,
        name: &str,
        title: &str,
    ) -> Result<Self, TreeOperationError> {
        Self::new(
            store,
            Arc::new(TypeRegistry::default()),
            TreeConfig::default(),
            creator,
            name,
            title,
        )
    }

    //
    // READ ACCESS
    //

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn document(&self) -> Result<&Node, TreeOperationError> {
        self.node(&self.document_id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node, failing with `NodeNotFound` when absent
    pub fn node(&self, id: &str) -> Result<&Node, TreeOperationError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, TreeOperationError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes held, including the document and detached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ordered child identifiers of `id`
    pub fn children(&self, id: &str) -> Result<&[String], TreeOperationError> {
        Ok(self.node(id)?.children())
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn max_section_depth(&self) -> usize {
        self.config.max_section_depth
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Subscribe to events raised by subsequent mutations
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    pub fn is_section(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(Node::is_section)
    }

    pub fn is_last_child(&self, parent_id: &str, child_id: &str) -> bool {
        self.nodes
            .get(parent_id)
            .and_then(Node::last_child)
            .is_some_and(|last| last == child_id)
    }

    /// Whether `node_type` may hold children in the configured collection
    pub fn is_container_type(&self, node_type: &NodeType) -> bool {
        self.registry
            .has_collection(node_type, &self.config.children_collection)
    }

    /// Siblings that follow `position.after` inside `position.parent`
    ///
    /// All children when `after` is none.
    pub fn following_siblings(
        &self,
        position: &Position,
    ) -> Result<Vec<String>, TreeOperationError> {
        let parent = self.node(&position.parent)?;
        let start = match &position.after {
            None => 0,
            Some(after) => {
                parent
                    .child_index(after)
                    .ok_or_else(|| not_a_child_position(position))?
                    + 1
            }
        };
        Ok(parent.children[start..].to_vec())
    }

    //
    // STRUCTURAL PRIMITIVES
    //

    /// Insert a detached node at `position`
    ///
    /// The node must already belong to this tree and have no parent: either freshly
    /// registered by `create_node` or detached by `remove(.., temporary = true)`.
    /// Sections trigger cascading re-parenting of the following siblings.
    ///
    /// # Returns
    ///
    /// Events raised, in order: those of any cascaded siblings first, then
    /// `AddedChild` on the parent and, if the node ended up last, `LastChildChanged`.
    pub fn insert(
        &mut self,
        node_id: &str,
        position: &Position,
    ) -> Result<Vec<TreeEvent>, TreeOperationError> {
        let node = self.node(node_id)?;
        if node.is_document() {
            return Err(TreeOperationError::document_immutable(node_id));
        }
        if let Some(parent_id) = &node.parent_id {
            return Err(TreeOperationError::invalid_position(format!(
                "Node '{}' is already attached to '{}'",
                node_id, parent_id
            )));
        }
        self.ensure_not_within(node_id, &position.parent)?;
        self.check_position(position)?;

        let mut events = Vec::new();
        self.attach(node_id, position, &mut events)?;
        self.publish(&events);

        tracing::debug!("Inserted '{}' at {}", node_id, position);
        Ok(events)
    }

    /// Detach `child_id` from `parent_id`
    ///
    /// When `temporary` is false the node and its subtree are deleted from the
    /// backing store and dropped from memory. When true the node stays in the tree
    /// detached and can be re-inserted with `insert` or dropped with `discard`.
    pub fn remove(
        &mut self,
        parent_id: &str,
        child_id: &str,
        temporary: bool,
    ) -> Result<Vec<TreeEvent>, TreeOperationError> {
        if child_id == self.document_id {
            return Err(TreeOperationError::document_immutable(child_id));
        }
        if self.node(parent_id)?.child_index(child_id).is_none() {
            return Err(TreeOperationError::not_a_child(parent_id, child_id));
        }

        let doomed = if temporary {
            Vec::new()
        } else {
            self.subtree_ids(child_id)?
        };
        self.delete_records(&doomed)?;

        let mut events = Vec::new();
        self.detach(parent_id, child_id, &mut events)?;
        for id in &doomed {
            self.nodes.remove(id);
        }
        self.publish(&events);

        tracing::debug!(
            "Removed '{}' from '{}' (temporary: {}, deleted: {})",
            child_id,
            parent_id,
            temporary,
            doomed.len()
        );
        Ok(events)
    }

    /// Permanently delete a detached node and its subtree
    ///
    /// Counterpart of `remove(.., temporary = true)` for nodes that will not be
    /// re-inserted. No events are raised; `Removed` fired at detach time.
    pub fn discard(&mut self, node_id: &str) -> Result<usize, TreeOperationError> {
        if node_id == self.document_id {
            return Err(TreeOperationError::document_immutable(node_id));
        }
        if let Some(parent_id) = &self.node(node_id)?.parent_id {
            return Err(TreeOperationError::invalid_position(format!(
                "Node '{}' is still attached to '{}'",
                node_id, parent_id
            )));
        }

        let doomed = self.subtree_ids(node_id)?;
        self.delete_records(&doomed)?;
        for id in &doomed {
            self.nodes.remove(id);
        }

        tracing::debug!("Discarded '{}' ({} node(s))", node_id, doomed.len());
        Ok(doomed.len())
    }

    /// Move `node_id` from `old_parent_id` to `new_position`
    ///
    /// Implemented as a temporary removal followed by `insert`, so a relocated
    /// section re-absorbs trailing non-section siblings at the destination.
    pub fn relocate(
        &mut self,
        old_parent_id: &str,
        node_id: &str,
        new_position: &Position,
    ) -> Result<Vec<TreeEvent>, TreeOperationError> {
        if node_id == self.document_id {
            return Err(TreeOperationError::document_immutable(node_id));
        }
        if self.node(old_parent_id)?.child_index(node_id).is_none() {
            return Err(TreeOperationError::not_a_child(old_parent_id, node_id));
        }
        if new_position.after.as_deref() == Some(node_id) {
            return Err(TreeOperationError::invalid_position(format!(
                "Node '{}' cannot be placed after itself",
                node_id
            )));
        }
        self.ensure_not_within(node_id, &new_position.parent)?;
        self.check_position(new_position)?;

        let mut events = Vec::new();
        self.detach(old_parent_id, node_id, &mut events)?;
        self.attach(node_id, new_position, &mut events)?;
        self.publish(&events);

        tracing::debug!("Relocated '{}' from '{}' to {}", node_id, old_parent_id, new_position);
        Ok(events)
    }

    /// Allocate a node of `node_type` in the store and insert it at `position`
    ///
    /// The owning document is the parent itself when the parent is the document,
    /// otherwise the parent's document.
    ///
    /// # Returns
    ///
    /// The new node's identifier and the events raised by the insert.
    pub fn create_node(
        &mut self,
        node_type: NodeType,
        position: &Position,
    ) -> Result<(String, Vec<TreeEvent>), TreeOperationError> {
        self.check_position(position)?;

        let document_id = self
            .node(&position.parent)?
            .owning_document_id()
            .to_string();
        let record = self
            .store
            .set(None, &node_type, json!({ "document": document_id }))?;

        let mut node = Node::new_with_id(record.id.clone(), node_type, Some(document_id), json!({}));
        node.created_at = record.created_at;
        node.modified_at = record.modified_at;
        node.validate()?;

        let node_id = node.id.clone();
        self.nodes.insert(node_id.clone(), node);

        let mut events = Vec::new();
        self.attach(&node_id, position, &mut events)?;
        self.publish(&events);

        tracing::debug!("Created node '{}' at {}", node_id, position);
        Ok((node_id, events))
    }

    /// Merge `attributes` into a node and bump its document's update time
    pub fn update_node(
        &mut self,
        node_id: &str,
        attributes: Value,
    ) -> Result<(), TreeOperationError> {
        if !attributes.is_object() {
            return Err(ValidationError::InvalidProperties(
                "attributes must be a JSON object".to_string(),
            )
            .into());
        }

        let (node_type, document_id) = {
            let node = self.node(node_id)?;
            (node.node_type.clone(), node.owning_document_id().to_string())
        };

        // Separate side effect: the document records when any of its nodes changed
        let previous_stamp = self
            .node(&document_id)?
            .properties
            .get("updated_at")
            .cloned()
            .unwrap_or(Value::Null);
        let now = Utc::now();
        let stamp = json!({ "updated_at": now.to_rfc3339() });
        self.store
            .set(Some(&document_id), &NodeType::Document, stamp.clone())?;

        if let Err(e) = self.store.set(Some(node_id), &node_type, attributes.clone()) {
            let restore = json!({ "updated_at": previous_stamp });
            if let Err(undo) = self
                .store
                .set(Some(&document_id), &NodeType::Document, restore)
            {
                tracing::warn!("Restoring stamp of '{}' failed: {}", document_id, undo);
            }
            return Err(e.into());
        }

        self.node_mut(node_id)?.merge_properties(&attributes);
        if let Some(document) = self.nodes.get_mut(&document_id) {
            document.merge_properties(&stamp);
            document.modified_at = now;
        }

        tracing::debug!("Updated node '{}'", node_id);
        Ok(())
    }

    /// Write every dirty node (attributes plus child order) to the store
    ///
    /// Returns the number of nodes written. Flags are cleared per node as it is
    /// written, so a store failure leaves the remaining nodes dirty.
    pub fn persist_dirty(&mut self) -> Result<usize, TreeOperationError> {
        let mut dirty: Vec<String> = self
            .nodes
            .values()
            .filter(|node| node.dirty)
            .map(|node| node.id.clone())
            .collect();
        dirty.sort();

        for id in &dirty {
            let (node_type, properties) = {
                let node = self.node(id)?;
                (node.node_type.clone(), node.to_record_properties())
            };
            self.store.set(Some(id), &node_type, properties)?;
            self.node_mut(id)?.dirty = false;
        }

        if !dirty.is_empty() {
            tracing::debug!("Persisted {} dirty node(s)", dirty.len());
        }
        Ok(dirty.len())
    }

    //
    // DERIVED STRUCTURE
    //

    /// Nesting depth of a node's subtree
    ///
    /// 0 for non-sections; for a section, 1 + the deepest child depth (0 when it
    /// has no section descendants). Computed by explicit post-order descent.
    pub fn section_depth(&self, node_id: &str) -> Result<usize, TreeOperationError> {
        if !self.node(node_id)?.is_section() {
            return Ok(0);
        }

        let mut depths: HashMap<&str, usize> = HashMap::new();
        let mut stack: Vec<(&str, bool)> = vec![(node_id, false)];

        while let Some((id, expanded)) = stack.pop() {
            let node = self.node(id)?;
            if !node.is_section() {
                depths.insert(id, 0);
            } else if expanded {
                let deepest = node
                    .children
                    .iter()
                    .map(|child| depths.get(child.as_str()).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                depths.insert(id, deepest + 1);
            } else {
                stack.push((id, true));
                stack.extend(node.children.iter().map(|child| (child.as_str(), false)));
            }
        }

        Ok(depths.get(node_id).copied().unwrap_or(0))
    }

    /// Number of sections among `node_id` and its ancestors
    ///
    /// The document is level 0 and a top-level section level 1. Used as the
    /// starting level for the resolvers.
    pub fn nesting_level(&self, node_id: &str) -> Result<usize, TreeOperationError> {
        let mut level = 0;
        let mut current = Some(node_id);
        let mut steps = 0;

        while let Some(id) = current {
            let node = self.node(id)?;
            if node.is_section() {
                level += 1;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return Err(TreeOperationError::circular_reference(node_id, id));
            }
            current = node.parent_id.as_deref();
        }

        Ok(level)
    }

    /// Deepest section depth anywhere in the tree
    pub fn deepest_section_depth(&self) -> Result<usize, TreeOperationError> {
        let mut deepest = 0;
        for node in self.nodes.values().filter(|node| node.is_section()) {
            deepest = deepest.max(self.section_depth(&node.id)?);
        }
        Ok(deepest)
    }

    /// Whether `node_id` is `ancestor_id` or lies beneath it
    pub fn is_within(&self, node_id: &str, ancestor_id: &str) -> bool {
        let mut current = Some(node_id);
        let mut steps = 0;

        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.nodes.get(id).and_then(|node| node.parent_id.as_deref());
        }

        false
    }

    /// Serializable snapshot of the tree rooted at `node_id`
    pub fn to_outline(&self, node_id: &str) -> Result<OutlineNode, TreeOperationError> {
        let node = self.node(node_id)?;
        let children = node
            .children
            .iter()
            .map(|child| self.to_outline(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OutlineNode {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            properties: node.properties.clone(),
            children,
        })
    }

    //
    // INTERNALS
    //

    /// Structural validity of a target position
    fn check_position(&self, position: &Position) -> Result<(), TreeOperationError> {
        let parent = self.node(&position.parent)?;
        if !self.is_container_type(&parent.node_type) {
            return Err(TreeOperationError::not_a_container(
                &parent.id,
                parent.node_type.clone(),
            ));
        }
        if let Some(after) = &position.after {
            if parent.child_index(after).is_none() {
                return Err(not_a_child_position(position));
            }
        }
        Ok(())
    }

    fn ensure_not_within(&self, node_id: &str, target_id: &str) -> Result<(), TreeOperationError> {
        if self.is_within(target_id, node_id) {
            return Err(TreeOperationError::circular_reference(node_id, target_id));
        }
        Ok(())
    }

    /// Link a detached node into `position` and apply cascading re-parenting
    fn attach(
        &mut self,
        node_id: &str,
        position: &Position,
        events: &mut Vec<TreeEvent>,
    ) -> Result<(), TreeOperationError> {
        let target_index = match &position.after {
            None => 0,
            Some(after) => {
                self.node(&position.parent)?
                    .child_index(after)
                    .ok_or_else(|| not_a_child_position(position))?
                    + 1
            }
        };

        let parent = self.node_mut(&position.parent)?;
        parent.children.insert(target_index, node_id.to_string());
        parent.dirty = true;
        self.node_mut(node_id)?.parent_id = Some(position.parent.clone());

        if self.is_section(node_id) {
            let innermost = self.innermost_section(node_id)?;
            self.absorb_following_siblings(
                &Position::after(position.parent.clone(), node_id),
                &innermost,
                events,
            )?;
        }

        events.push(TreeEvent::AddedChild {
            parent_id: position.parent.clone(),
            child_id: node_id.to_string(),
            index: target_index,
        });
        if self.is_last_child(&position.parent, node_id) {
            events.push(TreeEvent::LastChildChanged {
                parent_id: position.parent.clone(),
            });
        }

        Ok(())
    }

    /// Unlink `child_id` from `parent_id` without deleting it
    fn detach(
        &mut self,
        parent_id: &str,
        child_id: &str,
        events: &mut Vec<TreeEvent>,
    ) -> Result<(), TreeOperationError> {
        let was_last = self.is_last_child(parent_id, child_id);

        let parent = self.node_mut(parent_id)?;
        let index = parent
            .child_index(child_id)
            .ok_or_else(|| TreeOperationError::not_a_child(parent_id, child_id))?;
        parent.children.remove(index);
        parent.dirty = true;
        self.node_mut(child_id)?.parent_id = None;

        events.push(TreeEvent::Removed {
            node_id: child_id.to_string(),
        });
        if was_last {
            events.push(TreeEvent::LastChildChanged {
                parent_id: parent_id.to_string(),
            });
        }

        Ok(())
    }

    /// Follow trailing section children down from `section_id`
    fn innermost_section(&self, section_id: &str) -> Result<String, TreeOperationError> {
        let mut current = section_id.to_string();
        loop {
            let next = match self.node(&current)?.last_child() {
                Some(last) if self.is_section(last) => last.to_string(),
                _ => return Ok(current),
            };
            current = next;
        }
    }

    /// Move the non-section siblings following `position.after` into `section_id`
    fn absorb_following_siblings(
        &mut self,
        position: &Position,
        section_id: &str,
        events: &mut Vec<TreeEvent>,
    ) -> Result<(), TreeOperationError> {
        for sibling in self.following_siblings(position)? {
            if self.is_section(&sibling) {
                break;
            }

            let target = Position::new(
                section_id,
                self.node(section_id)?.last_child().map(str::to_string),
            );
            self.detach(&position.parent, &sibling, events)?;
            self.attach(&sibling, &target, events)?;

            tracing::trace!("Cascaded '{}' into section '{}'", sibling, section_id);
        }
        Ok(())
    }

    /// Delete store records for `ids`, all or nothing
    ///
    /// Records are snapshotted first; if a delete fails, the records already
    /// deleted are written back before the error is returned.
    fn delete_records(&self, ids: &[String]) -> Result<(), TreeOperationError> {
        let mut snapshots = Vec::with_capacity(ids.len());
        for id in ids {
            snapshots.push(self.store.get(id)?);
        }

        for (index, id) in ids.iter().enumerate() {
            if let Err(e) = self.store.delete(id) {
                tracing::warn!("Deleting '{}' failed, restoring {} record(s): {}", id, index, e);
                for record in snapshots[..index].iter().flatten() {
                    if let Err(undo) = self.store.set(
                        Some(&record.id),
                        &record.node_type,
                        record.properties.clone(),
                    ) {
                        tracing::warn!("Restoring '{}' failed: {}", record.id, undo);
                    }
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// `node_id` and all its descendants, pre-order
    fn subtree_ids(&self, node_id: &str) -> Result<Vec<String>, TreeOperationError> {
        let mut ids = Vec::new();
        let mut stack = vec![node_id.to_string()];
        while let Some(id) = stack.pop() {
            let node = self.node(&id)?;
            stack.extend(node.children.iter().rev().cloned());
            ids.push(id);
        }
        Ok(ids)
    }

    fn publish(&self, events: &[TreeEvent]) {
        for event in events {
            // No subscribers is fine
            let _ = self.event_tx.send(event.clone());
        }
    }
}

fn not_a_child_position(position: &Position) -> TreeOperationError {
    TreeOperationError::invalid_position(format!(
        "'{}' is not a child of '{}'",
        position.after.as_deref().unwrap_or("none"),
        position.parent
    ))
}
