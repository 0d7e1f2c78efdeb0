use std::sync::atomic::Ordering;
use stonewall::engine::{Engine, GoLimits, STARTPOS};
use stonewall::output::CaptureSink;

fn engine() -> (Engine, CaptureSink) {
    let mut engine = Engine::new();
    engine.initialize();
    let sink = CaptureSink::new();
    engine.set_sink(Box::new(sink.clone()));
    (engine, sink)
}

fn go(engine: &mut Engine, depth: i32) -> String {
    let limits = GoLimits {
        depth,
        ..GoLimits::default()
    };
    engine.go(&limits).unwrap().expect("a best move")
}

fn last_info(sink: &CaptureSink) -> String {
    sink.lines()
        .iter()
        .rev()
        .find(|l| l.starts_with("info depth"))
        .cloned()
        .expect("no info line")
}

#[test]
fn finds_back_rank_mate_in_one() {
    let (mut engine, sink) = engine();
    engine
        .set_position("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1")
        .unwrap();
    let best = go(&mut engine, 2);
    assert_eq!(best, "a1a8");
    assert!(
        last_info(&sink).contains("score mate 1"),
        "line: {}",
        last_info(&sink)
    );
}

#[test]
fn avoids_the_stalemate_trap() {
    let (mut engine, sink) = engine();
    engine.set_position("7k/5Q2/6K1/8/8/8/8/8 w - - 0 1").unwrap();
    let best = go(&mut engine, 4);
    // a stalemating queen retreat would read "cp 0"; the engine must mate
    assert!(
        last_info(&sink).contains("score mate 1"),
        "line: {}",
        last_info(&sink)
    );
    engine.make_move(&best).unwrap();
    assert!(
        engine.legal_moves().is_empty(),
        "{best} did not end the game"
    );
}

#[test]
fn queen_keeps_the_boxed_king_short_of_stalemate() {
    let (mut engine, sink) = engine();
    // king in the corner with no moves: any non-checking queen shuffle
    // that keeps it frozen is stalemate, so only mating checks will do
    engine.set_position("k7/8/1K6/8/8/8/5Q2/8 w - - 0 1").unwrap();
    let best = go(&mut engine, 4);
    assert!(
        last_info(&sink).contains("score mate 1"),
        "line: {}",
        last_info(&sink)
    );
    engine.make_move(&best).unwrap();
    assert!(engine.legal_moves().is_empty());
}

#[test]
fn promotes_with_a_decisive_score() {
    let (mut engine, sink) = engine();
    engine.set_position("8/P7/8/8/8/8/8/4k2K w - - 0 1").unwrap();
    let best = go(&mut engine, 4);
    assert_eq!(best, "a7a8q");
    let line = last_info(&sink);
    let cp = line
        .split(" score cp ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|v| v.parse::<i32>().ok());
    match cp {
        Some(v) => assert!(v > 500, "promotion not decisive: {line}"),
        None => assert!(line.contains("score mate"), "line: {line}"),
    }
}

#[test]
fn single_reply_returns_immediately() {
    let (mut engine, sink) = engine();
    // the queen check leaves exactly one legal move
    engine.set_position("k7/8/8/8/8/8/1q6/K7 w - - 0 1").unwrap();
    let best = go(&mut engine, 50);
    assert_eq!(best, "a1b2");
    // one info line, no deepening loop
    assert_eq!(
        sink.lines()
            .iter()
            .filter(|l| l.starts_with("info depth"))
            .count(),
        1
    );
}

#[test]
fn mate_for_the_defender_is_reported_negative() {
    let (mut engine, sink) = engine();
    // every black move walks into the queen's back-rank mate
    engine
        .set_position("k7/8/1K6/8/7p/8/5Q2/8 b - - 0 1")
        .unwrap();
    go(&mut engine, 4);
    assert!(
        last_info(&sink).contains("score mate -1"),
        "line: {}",
        last_info(&sink)
    );
}

#[test]
fn stop_flag_aborts_the_search() {
    let (mut engine, _sink) = engine();
    engine.set_position(STARTPOS).unwrap();
    let stop = engine.reset_stop();
    stop.store(true, Ordering::Relaxed);

    let start = std::time::Instant::now();
    let best = engine.go(&GoLimits { depth: 90, ..GoLimits::default() }).unwrap();
    assert!(best.is_some(), "a pre-stopped search still reports a move");
    assert!(
        start.elapsed().as_secs() < 5,
        "stopped search should return at once"
    );
}

#[test]
fn deeper_search_still_finds_the_mate() {
    let (mut engine, sink) = engine();
    engine
        .set_position("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1")
        .unwrap();
    let best = go(&mut engine, 6);
    assert_eq!(best, "a1a8");
    assert!(last_info(&sink).contains("score mate 1"));
}

#[test]
fn snapshot_reports_progress() {
    let (mut engine, _sink) = engine();
    engine.set_position(STARTPOS).unwrap();
    go(&mut engine, 4);
    let snap = engine.get_stats();
    assert_eq!(snap.depth, 4);
    assert!(snap.nodes > 0);
    assert!(snap.seldepth >= snap.depth);
}
