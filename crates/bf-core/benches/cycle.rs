//! Cycle detection benchmarks

use bf_core::{Condition, Edge, GraphStore, Node, NodeId, cycle, default_edge};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// Linear chain m0 -> m1 -> ... -> m{len-1} -> podium
fn chain(len: usize) -> GraphStore {
    let mut store = GraphStore::new("bench", "chain");
    for i in 0..len {
        store.add_node(Node::match_node(format!("m{i}"), 2));
    }
    store.add_node(Node::podium("p1", 1));
    store.add_node(Node::disqualification("dq"));
    for i in 0..len {
        let target = if i + 1 == len {
            "p1".to_string()
        } else {
            format!("m{}", i + 1)
        };
        let seq = store.next_edge_seq();
        store.add_edge(
            Edge::new(format!("e{i}"), format!("m{i}"), target, Condition::Default)
                .with_seq(seq)
                .as_default(),
        );
    }
    store
}

fn bench_back_edge(c: &mut Criterion) {
    let store = chain(1000);
    let last = NodeId::from("m999");
    let first = NodeId::from("m0");

    c.bench_function("cycle_back_edge_chain_1000", |b| {
        b.iter(|| black_box(store.would_create_cycle(black_box(&last), black_box(&first))))
    });
}

fn bench_forward_edge(c: &mut Criterion) {
    let store = chain(1000);
    let first = NodeId::from("m0");
    let last = NodeId::from("m999");

    c.bench_function("cycle_forward_edge_chain_1000", |b| {
        b.iter(|| black_box(store.would_create_cycle(black_box(&first), black_box(&last))))
    });
}

fn bench_whole_graph(c: &mut Criterion) {
    let store = chain(1000);

    c.bench_function("find_any_cycle_chain_1000", |b| {
        b.iter(|| black_box(cycle::find_any_cycle(black_box(&store))))
    });
    c.bench_function("default_edge_violations_chain_1000", |b| {
        b.iter(|| black_box(default_edge::violations(black_box(&store))))
    });
}

criterion_group!(benches, bench_back_edge, bench_forward_edge, bench_whole_graph);
criterion_main!(benches);
