//! Benchmarks for placement resolution and cascading inserts
//!
//! Run with: `cargo bench -p outline-core`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use outline_core::{DocumentTree, MemoryStore, NodeType, Position};
use std::sync::Arc;

/// Document with `width` top-level sections, each nested `depth` deep with a few
/// text nodes at every level
fn build_tree(width: usize, depth: usize) -> (DocumentTree, String) {
    let mut tree =
        DocumentTree::with_defaults(Arc::new(MemoryStore::new()), "/user/bench", "bench", "Bench")
            .unwrap();
    let doc = tree.document_id().to_string();
    let mut last_top = None;

    for _ in 0..width {
        let position = Position::new(doc.clone(), last_top.clone());
        let (top, _) = tree.create_node(NodeType::Section, &position).unwrap();
        last_top = Some(top.clone());

        let mut parent = top;
        for _ in 1..depth {
            for _ in 0..3 {
                tree.create_node(NodeType::Text, &Position::first(&parent))
                    .unwrap();
            }
            let last = tree.children(&parent).unwrap().last().cloned();
            let (child, _) = tree
                .create_node(NodeType::Section, &Position::new(parent.clone(), last))
                .unwrap();
            parent = child;
        }
    }

    let last = last_top.unwrap_or_default();
    (tree, last)
}

fn bench_possible_child_types(c: &mut Criterion) {
    let (tree, last_top) = build_tree(50, 4);
    let doc = tree.document_id().to_string();
    let position = Position::after(doc, last_top);

    c.bench_function("possible_child_types_deep_chain", |b| {
        b.iter(|| tree.possible_child_types_at(black_box(&position)).unwrap())
    });
}

fn bench_move_target_positions(c: &mut Criterion) {
    let (tree, last_top) = build_tree(50, 4);
    let doc = tree.document_id().to_string();
    let first_top = tree.children(&doc).unwrap()[0].clone();
    let position = Position::after(doc, last_top);

    c.bench_function("move_target_positions_deep_chain", |b| {
        b.iter(|| {
            tree.move_target_positions_at(black_box(&first_top), black_box(&position))
                .unwrap()
        })
    });
}

fn bench_cascading_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascading_insert");
    group.sample_size(20);

    group.bench_function("section_absorbs_100_siblings", |b| {
        b.iter_batched(
            || {
                let mut tree = DocumentTree::with_defaults(
                    Arc::new(MemoryStore::new()),
                    "/user/bench",
                    "bench",
                    "Bench",
                )
                .unwrap();
                let doc = tree.document_id().to_string();
                for _ in 0..100 {
                    tree.create_node(NodeType::Text, &Position::first(&doc))
                        .unwrap();
                }
                (tree, doc)
            },
            |(mut tree, doc)| {
                tree.create_node(NodeType::Section, &Position::first(&doc))
                    .unwrap()
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_possible_child_types,
    bench_move_target_positions,
    bench_cascading_insert
);
criterion_main!(benches);
