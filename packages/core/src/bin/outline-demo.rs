//! Outline demo
//!
//! Builds a small document through the resolvers, attaches a comment, and prints
//! the resulting outline as JSON.
//!
//! Run with: `RUST_LOG=debug cargo run --bin outline-demo`

use anyhow::{Context, Result};
use outline_core::{
    CommentService, DocumentTree, MemoryStore, NodeType, Position, TreeEvent,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let mut tree = DocumentTree::with_defaults(store.clone(), "/user/demo", "demo", "Demo")?;
    let mut events = tree.subscribe_to_events();
    let doc = tree.document_id().to_string();

    let (intro, _) = tree.create_node(NodeType::Text, &Position::first(&doc))?;
    tree.update_node(&intro, json!({ "content": "Opening paragraph" }))?;

    // Pulls the opening paragraph in
    let (chapter, _) = tree.create_node(NodeType::Section, &Position::first(&doc))?;
    tree.update_node(&chapter, json!({ "title": "Chapter 1" }))?;

    let candidates = tree.possible_child_types_at(&Position::after(&chapter, &intro))?;
    let section = candidates
        .iter()
        .find(|candidate| candidate.node_type == NodeType::Section)
        .context("no section position offered")?;
    let target = section
        .positions
        .last()
        .context("section candidate without positions")?;
    let (subsection, _) = tree.create_node(NodeType::Section, target)?;
    tree.update_node(&subsection, json!({ "title": "Chapter 1.1" }))?;

    let (code, _) = tree.create_node(NodeType::Code, &Position::first(&subsection))?;
    tree.update_node(&code, json!({ "content": "fn main() {}" }))?;

    let written = tree.persist_dirty()?;
    tracing::info!("Persisted {} node(s), deepest section depth {}", written, tree.deepest_section_depth()?);

    let comments = CommentService::new(store.clone());
    comments
        .create_comment(tree.node(&code)?, "/user/demo", "Needs a docstring")
        .await?;
    for comment in comments.load_comments(&code).await? {
        tracing::info!("Comment by {}: {}", comment.creator, comment.content);
    }

    let mut event_count = 0;
    while let Ok(event) = events.try_recv() {
        if let TreeEvent::Removed { node_id } = &event {
            tracing::debug!("Cascade moved '{}'", node_id);
        }
        event_count += 1;
    }
    tracing::info!("Observed {} tree event(s)", event_count);

    let outline = tree.to_outline(&doc)?;
    println!("{}", serde_json::to_string_pretty(&outline)?);

    Ok(())
}
