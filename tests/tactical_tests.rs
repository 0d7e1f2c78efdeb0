use stonewall::engine::{Engine, GoLimits};
use stonewall::output::CaptureSink;

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_sink(Box::new(CaptureSink::new()));
    engine.set_position(fen).expect("valid fen");
    engine
}

fn best(engine: &mut Engine, depth: i32) -> String {
    let limits = GoLimits {
        depth,
        ..GoLimits::default()
    };
    engine.go(&limits).unwrap().expect("a best move")
}

#[test]
fn takes_the_hanging_queen() {
    let mut engine = engine_at("k7/8/8/3q4/8/8/3R4/3K4 w - - 0 1");
    assert_eq!(best(&mut engine, 3), "d2d5");
}

#[test]
fn pawn_snaps_off_the_queen() {
    // the wayward queen on g4 stands in the f3 pawn's capture arc
    let mut engine = engine_at("rnb1kbnr/pppp1ppp/8/4p3/6q1/5P2/PPPPP1PP/RNBQKBNR w KQkq - 0 1");
    assert_eq!(best(&mut engine, 3), "f3g4");
}

#[test]
fn declines_the_poisoned_pawn() {
    // Qxd6 runs into cxd6; the queen must not grab the defended pawn
    let mut engine = engine_at("k7/8/3p4/2p5/8/8/3Q4/K7 w - - 0 1");
    let mv = best(&mut engine, 4);
    assert_ne!(mv, "d2d6", "queen took a defended pawn");
}

#[test]
fn recaptures_instead_of_retreating() {
    // after an even queen trade opened the file, taking back is clearly
    // best for black
    let mut engine = engine_at("3rk3/8/8/8/8/8/3Q4/3RK3 b - - 0 1");
    assert_eq!(best(&mut engine, 3), "d8d2");
}

#[test]
fn pushes_the_runner_in_a_pawn_race() {
    // white queens with check and then rounds up the g-pawn; any other
    // move lets black queen in time
    let mut engine = engine_at("7k/P7/8/8/8/8/6p1/K7 w - - 0 1");
    assert_eq!(best(&mut engine, 4), "a7a8q");
}

#[test]
fn promotion_capture_beats_the_plain_push() {
    // c8=Q drops to Rxc8; capturing the rook promotes with check
    let mut engine = engine_at("1r3k2/2P5/8/8/8/8/8/4K3 w - - 0 1");
    assert_eq!(best(&mut engine, 4), "c7b8q");
}
