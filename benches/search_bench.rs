use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use stonewall::engine::{Engine, GoLimits};
use stonewall::output::CaptureSink;

const KIWI_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn engine_with(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_sink(Box::new(CaptureSink::new()));
    engine.set_position(fen).expect("valid fen");
    engine
}

fn bench_perft(c: &mut Criterion) {
    c.bench_function("perft_startpos_d3", |b| {
        let mut engine = engine_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        b.iter(|| {
            let count = engine.perft(black_box(3)).unwrap();
            assert_eq!(count, 8_902);
        });
    });

    c.bench_function("perft_kiwipete_d2", |b| {
        let mut engine = engine_with(KIWI_FEN);
        b.iter(|| {
            let count = engine.perft(black_box(2)).unwrap();
            assert_eq!(count, 2_039);
        });
    });
}

fn bench_search(c: &mut Criterion) {
    c.bench_function("search_kiwipete_d4", |b| {
        let mut engine = engine_with(KIWI_FEN);
        let limits = GoLimits {
            depth: 4,
            ..GoLimits::default()
        };
        b.iter(|| {
            engine.clear_search_data();
            let best = engine.go(black_box(&limits)).unwrap();
            black_box(best);
        });
    });

    c.bench_function("eval_startpos", |b| {
        let mut engine = engine_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        b.iter(|| {
            engine
                .set_position(black_box(
                    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                ))
                .unwrap();
            black_box(engine.stand_pat());
        });
    });
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
