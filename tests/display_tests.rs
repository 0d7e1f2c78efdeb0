use stonewall::engine::{Engine, STARTPOS};

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_position(fen).expect("valid fen");
    engine
}

#[test]
fn startpos_diagram_headlines() {
    let engine = engine_at(STARTPOS);
    let diagram = engine.board_string();
    assert!(diagram.contains("White to move"));
    assert!(diagram.contains("Castling Rights   : KQkq"));
    assert!(diagram.contains("En Passant Square : -"));
    assert!(diagram.contains("Move Number       : 1"));
    assert!(diagram.contains("Reversible Moves  : 0"));
    assert!(diagram.contains("Static Evaluation :"));
    // eight board ranks, white pieces upper case on the bottom rank
    let ranks: Vec<&str> = diagram.lines().collect();
    assert_eq!(ranks.len(), 8);
    assert!(ranks[0].starts_with(" r n b q k b n r"));
    assert!(ranks[7].starts_with(" R N B Q K B N R"));
}

#[test]
fn diagram_tracks_the_game() {
    let mut engine = engine_at(STARTPOS);
    engine.make_move("e2e4").unwrap();
    let diagram = engine.board_string();
    assert!(diagram.contains("Black to move"));
    assert!(diagram.contains("En Passant Square : e3"));
}

#[test]
fn dead_draws_are_flagged_in_the_diagram() {
    let engine = engine_at("8/8/4k3/8/8/3K4/8/8 w - - 0 1");
    assert!(engine.board_string().contains("DRAW"));
}

#[test]
fn moves_render_in_coordinate_notation() {
    let mut engine = engine_at(STARTPOS);
    let moves: Vec<String> = engine.legal_moves().iter().map(|m| m.to_string()).collect();
    assert_eq!(moves.len(), 20);
    for mv in &moves {
        assert!(mv.len() == 4, "unexpected coord form: {mv}");
    }
    assert!(moves.contains(&"e2e4".to_string()));
    assert!(moves.contains(&"b1c3".to_string()));
}
