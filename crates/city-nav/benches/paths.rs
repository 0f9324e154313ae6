use city_core::config::PathStrategy;
use city_core::geo::Coordinate;
use city_core::graph::CityGraph;
use city_nav::nearest::find_nearest_stop;
use city_nav::paths::shortest_path_with;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A `side` x `side` street grid with geographic edge weights.
fn build_grid(side: usize) -> CityGraph<()> {
    let mut graph = CityGraph::new(false);
    for row in 0..side {
        for col in 0..side {
            let at = Coordinate::new(33.6 + row as f64 * 0.005, 73.0 + col as f64 * 0.005);
            let id = format!("n_{row}_{col}");
            if (row + col) % 4 == 0 {
                graph.add_stop(id, "stop", at, ()).unwrap();
            } else {
                graph.add_vertex(id, "place", at, ()).unwrap();
            }
        }
    }
    for row in 0..side {
        for col in 0..side {
            let id = format!("n_{row}_{col}");
            if col + 1 < side {
                graph
                    .add_edge_with_distance(&id, &format!("n_{row}_{}", col + 1))
                    .unwrap();
            }
            if row + 1 < side {
                graph
                    .add_edge_with_distance(&id, &format!("n_{}_{col}", row + 1))
                    .unwrap();
            }
        }
    }
    graph
}

fn bench_shortest_path_dense(c: &mut Criterion) {
    let graph = build_grid(20);
    c.bench_function("shortest_path_dense_400", |b| {
        b.iter(|| {
            shortest_path_with(black_box(&graph), "n_0_0", "n_19_19", PathStrategy::Dense)
                .unwrap()
        })
    });
}

fn bench_shortest_path_heap(c: &mut Criterion) {
    let graph = build_grid(20);
    c.bench_function("shortest_path_heap_400", |b| {
        b.iter(|| {
            shortest_path_with(black_box(&graph), "n_0_0", "n_19_19", PathStrategy::Heap)
                .unwrap()
        })
    });
}

fn bench_nearest_stop(c: &mut Criterion) {
    let graph = build_grid(20);
    c.bench_function("nearest_stop_400", |b| {
        b.iter(|| find_nearest_stop(black_box(&graph), Coordinate::new(33.65, 73.05)))
    });
}

criterion_group!(
    benches,
    bench_shortest_path_dense,
    bench_shortest_path_heap,
    bench_nearest_stop
);
criterion_main!(benches);
