use stonewall::engine::Engine;
use stonewall::error::EngineError;

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_position(fen).expect("valid fen");
    engine
}

fn coords(engine: &mut Engine) -> Vec<String> {
    engine
        .legal_moves()
        .iter()
        .map(|m| m.to_string())
        .collect()
}

#[test]
fn castling_both_sides_available() {
    let mut engine = engine_at("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let moves = coords(&mut engine);
    assert_eq!(moves.len(), 26, "moves: {moves:?}");
    assert!(moves.contains(&"e1g1".to_string()));
    assert!(moves.contains(&"e1c1".to_string()));
}

#[test]
fn castling_blocked_by_attacks_on_e_file() {
    let mut engine = engine_at("r3k2r/8/8/8/4r3/8/8/R3K2R w KQkq - 0 1");
    let moves = coords(&mut engine);
    assert!(!moves.contains(&"e1g1".to_string()), "moves: {moves:?}");
    assert!(!moves.contains(&"e1c1".to_string()), "moves: {moves:?}");
    assert!(matches!(
        engine.make_move("e1g1"),
        Err(EngineError::InvalidMove(_))
    ));
}

#[test]
fn castling_blocked_through_attacked_transit_square() {
    // rook on f8 covers f1: short castling is out, long is fine
    let mut engine = engine_at("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
    let moves = coords(&mut engine);
    assert!(!moves.contains(&"e1g1".to_string()), "moves: {moves:?}");
    assert!(moves.contains(&"e1c1".to_string()), "moves: {moves:?}");
}

#[test]
fn pinned_piece_may_only_slide_on_the_pin_ray() {
    // the d2 rook is pinned to the king by the d8 rook
    let mut engine = engine_at("3r3k/8/8/8/8/8/3R4/3K4 w - - 0 1");
    let moves = coords(&mut engine);
    assert!(moves.contains(&"d2d4".to_string()));
    assert!(moves.contains(&"d2d8".to_string()));
    assert!(!moves.iter().any(|m| m.starts_with("d2e") || m.starts_with("d2c")));
}

#[test]
fn en_passant_is_refused_when_it_exposes_the_king() {
    // capturing en passant would clear both pawns off the fifth rank and
    // leave the h5 rook staring at the king on a5
    let mut engine = engine_at("8/2p5/8/KP5r/8/8/8/6k1 b - - 0 1");
    engine.make_move("c7c5").unwrap();
    let moves = coords(&mut engine);
    assert!(
        !moves.contains(&"b5c6".to_string()),
        "pinned ep capture generated: {moves:?}"
    );
}

#[test]
fn check_evasions_only_resolve_the_check() {
    // queen gives check on the e-file: block, capture, or step aside
    let mut engine = engine_at("4k3/8/8/8/4q3/8/3N4/4K3 w - - 0 1");
    let moves = coords(&mut engine);
    for mv in &moves {
        assert!(
            ["d2e4", "e1d1", "e1f1", "e1f2"].contains(&mv.as_str()),
            "not an evasion: {mv} of {moves:?}"
        );
    }
    assert!(moves.contains(&"d2e4".to_string()), "capture missing");
}

#[test]
fn double_check_forces_a_king_move() {
    // knight f6 and rook e8 both check the e4 king
    let mut engine = engine_at("4r2k/8/5n2/8/4K3/8/8/8 w - - 0 1");
    let moves = coords(&mut engine);
    assert!(!moves.is_empty());
    for mv in &moves {
        assert!(mv.starts_with("e4"), "non-king evasion in double check: {mv}");
    }
}

#[test]
fn promotions_include_underpromotion() {
    let mut engine = engine_at("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let moves = coords(&mut engine);
    for promo in ["a7a8q", "a7a8r", "a7a8b", "a7a8n"] {
        assert!(moves.contains(&promo.to_string()), "missing {promo}");
    }
}
