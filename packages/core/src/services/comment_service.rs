//! Comment Service
//!
//! Loads, creates and removes the comments attached to a node. Comments live in
//! the backing store only; the document tree never holds them.
//!
//! Creation and removal each await `BackingStore::sync`, the one suspension point
//! in the crate. Store failures are returned unchanged and never retried.

use crate::db::{BackingStore, RecordQuery, StoreError};
use crate::models::{Comment, Node, NodeType};
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts a sync in flight for as long as it is alive
struct PendingSync<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingSync<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for PendingSync<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Comment access on top of a backing store
///
/// # Examples
///
/// ```rust
/// use outline_core::db::MemoryStore;
/// use outline_core::models::{Node, NodeType};
/// use outline_core::services::CommentService;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), outline_core::db::StoreError> {
/// let service = CommentService::new(Arc::new(MemoryStore::new()));
/// let node = Node::new(NodeType::Text, Some("doc-1".to_string()), json!({}));
///
/// service.create_comment(&node, "/user/ada", "Looks good").await?;
/// let comments = service.load_comments(&node.id).await?;
/// assert_eq!(comments.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct CommentService {
    store: Arc<dyn BackingStore>,
    pending_syncs: AtomicUsize,
}

impl CommentService {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            store,
            pending_syncs: AtomicUsize::new(0),
        }
    }

    /// Number of create/remove calls currently awaiting `sync`
    ///
    /// Advisory only: it does not serialize concurrent calls.
    pub fn pending_syncs(&self) -> usize {
        self.pending_syncs.load(Ordering::SeqCst)
    }

    /// Comments attached to `node_id`, oldest first
    ///
    /// Ties keep fetch order. Records that cannot be decoded as comments are
    /// skipped with a warning.
    pub async fn load_comments(&self, node_id: &str) -> Result<Vec<Comment>, StoreError> {
        let query = RecordQuery::new()
            .with_type(NodeType::Comment)
            .with_property("node", json!(node_id));
        let records = self.store.fetch(query).await?;

        let mut comments: Vec<Comment> = records
            .iter()
            .filter_map(|record| match Comment::from_record(record) {
                Ok(comment) => Some(comment),
                Err(e) => {
                    tracing::warn!("Skipping malformed comment '{}': {}", record.id, e);
                    None
                }
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        tracing::debug!("Loaded {} comment(s) for node '{}'", comments.len(), node_id);
        Ok(comments)
    }

    /// Attach a new comment to `node` and wait for it to be synced
    ///
    /// If `sync` fails the local record is deleted again, so the comment is never
    /// left visible, and the sync error is returned.
    pub async fn create_comment(
        &self,
        node: &Node,
        creator: &str,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let properties = Comment::new_properties(
            &node.id,
            node.owning_document_id(),
            creator,
            content,
            Utc::now(),
        );
        let record = self.store.set(None, &NodeType::Comment, properties)?;

        let synced = {
            let _pending = PendingSync::start(&self.pending_syncs);
            self.store.sync().await
        };

        if let Err(e) = synced {
            tracing::warn!("Comment '{}' not synced, rolling back: {}", record.id, e);
            if let Err(rollback) = self.store.delete(&record.id) {
                tracing::warn!("Rollback of comment '{}' failed: {}", record.id, rollback);
            }
            return Err(e);
        }

        tracing::debug!("Created comment '{}' on node '{}'", record.id, node.id);
        Comment::from_record(&record).map_err(|e| StoreError::storage(e.to_string()))
    }

    /// Delete a comment and wait for the deletion to be synced
    ///
    /// A sync failure is returned but the local deletion is kept. An unknown id
    /// fails with `RecordNotFound` and starts no sync.
    pub async fn remove_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        if !self.store.delete(comment_id)? {
            return Err(StoreError::record_not_found(comment_id));
        }

        let _pending = PendingSync::start(&self.pending_syncs);
        self.store.sync().await?;

        tracing::debug!("Removed comment '{}'", comment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn test_node() -> Node {
        Node::new_with_id("n1".to_string(), NodeType::Text, Some("d1".to_string()), json!({}))
    }

    fn setup() -> (CommentService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CommentService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_load_comments_empty() {
        let (service, _store) = setup();
        let comments = assert_ok!(service.load_comments("n1").await);
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn test_load_comments_sorted_ascending() {
        let (service, store) = setup();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        for offset in [3, 1, 4, 2, 0] {
            let at = base + ChronoDuration::minutes(offset);
            let properties =
                Comment::new_properties("n1", "d1", "/user/ada", &format!("c{}", offset), at);
            store.set(None, &NodeType::Comment, properties).unwrap();
        }
        store
            .set(
                None,
                &NodeType::Comment,
                Comment::new_properties("other", "d1", "/user/ada", "elsewhere", base),
            )
            .unwrap();

        let comments = service.load_comments("n1").await.unwrap();
        let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["c0", "c1", "c2", "c3", "c4"]);
        assert!(comments
            .windows(2)
            .all(|pair| pair[0].created_at < pair[1].created_at));
    }

    #[tokio::test]
    async fn test_create_comment_syncs() {
        let (service, store) = setup();

        let comment = assert_ok!(service.create_comment(&test_node(), "/user/ada", "Hi").await);

        assert_eq!(comment.node_id, "n1");
        assert_eq!(comment.document_id.as_deref(), Some("d1"));
        assert_eq!(comment.creator, "/user/ada");
        assert_eq!(store.sync_count(), 1);
        assert_eq!(service.pending_syncs(), 0);
        assert!(store.get(&comment.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_comment_rolls_back_on_sync_failure() {
        let (service, store) = setup();
        store.fail_next_sync("offline").unwrap();

        let err = assert_err!(service.create_comment(&test_node(), "/user/ada", "Hi").await);

        assert_eq!(err, StoreError::sync_failed("offline"));
        assert!(service.load_comments("n1").await.unwrap().is_empty());
        assert_eq!(service.pending_syncs(), 0);
    }

    #[tokio::test]
    async fn test_remove_comment() {
        let (service, store) = setup();
        let comment = service
            .create_comment(&test_node(), "/user/ada", "Hi")
            .await
            .unwrap();

        assert_ok!(service.remove_comment(&comment.id).await);
        assert!(store.get(&comment.id).unwrap().is_none());
        assert_eq!(store.sync_count(), 2);

        let err = assert_err!(service.remove_comment(&comment.id).await);
        assert!(matches!(err, StoreError::RecordNotFound { .. }));
        assert_eq!(store.sync_count(), 2);
        assert_eq!(service.pending_syncs(), 0);
    }

    #[tokio::test]
    async fn test_remove_comment_sync_failure_keeps_local_deletion() {
        let (service, store) = setup();
        let comment = service
            .create_comment(&test_node(), "/user/ada", "Hi")
            .await
            .unwrap();
        store.fail_next_sync("offline").unwrap();

        let err = assert_err!(service.remove_comment(&comment.id).await);

        assert_eq!(err, StoreError::sync_failed("offline"));
        assert!(store.get(&comment.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_syncs_while_in_flight() {
        let store = Arc::new(MemoryStore::with_sync_delay(Duration::from_millis(100)));
        let service = Arc::new(CommentService::new(store));

        let task = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_comment(&test_node(), "/user/ada", "Hi")
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.pending_syncs(), 1);

        assert_ok!(task.await.unwrap());
        assert_eq!(service.pending_syncs(), 0);
    }
}
