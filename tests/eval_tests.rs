use stonewall::board::DRAW_BIT;
use stonewall::engine::Engine;

fn engine_at(fen: &str) -> Engine {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_position(fen).expect("valid fen");
    engine
}

/// Flip ranks and swap piece colors, castling rights and the side to move.
/// Only for positions without an en passant square.
fn mirror_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let placement: Vec<String> = fields[0]
        .split('/')
        .rev()
        .map(|rank| {
            rank.chars()
                .map(|c| {
                    if c.is_ascii_alphabetic() {
                        if c.is_ascii_uppercase() {
                            c.to_ascii_lowercase()
                        } else {
                            c.to_ascii_uppercase()
                        }
                    } else {
                        c
                    }
                })
                .collect()
        })
        .collect();
    let side = if fields[1] == "w" { "b" } else { "w" };
    let castling: String = if fields[2] == "-" {
        "-".to_string()
    } else {
        let mut sw: Vec<char> = fields[2]
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();
        sw.sort_by_key(|c| match c {
            'K' => 0,
            'Q' => 1,
            'k' => 2,
            'q' => 3,
            _ => 4,
        });
        sw.into_iter().collect()
    };
    format!(
        "{} {} {} - {} {}",
        placement.join("/"),
        side,
        castling,
        fields[4],
        fields[5]
    )
}

#[test]
fn evaluation_is_color_symmetric() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
        "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQK2R b KQkq - 0 1",
    ];
    for fen in fens {
        let mut engine = engine_at(fen);
        let original = engine.stand_pat();
        engine.set_position(&mirror_fen(fen)).expect("mirror fen");
        let mirrored = engine.stand_pat();
        assert_eq!(
            original, mirrored,
            "asymmetric eval for {fen} vs {}",
            mirror_fen(fen)
        );
    }
}

#[test]
fn tempo_bonus_shifts_the_eval() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let mut engine = engine_at(fen);
    let neutral = engine.stand_pat();

    engine.set_option("Tempo Bonus", "16").unwrap();
    engine.set_position(fen).unwrap();
    assert_eq!(engine.stand_pat(), neutral + 16);
}

#[test]
fn bare_kings_are_a_dead_draw() {
    let engine = engine_at("8/8/4k3/8/8/3K4/8/8 w - - 0 1");
    assert_eq!(engine.stand_pat(), 0);
    assert!(engine.position().state & DRAW_BIT != 0);
}

#[test]
fn minor_piece_only_endings_are_dead_draws() {
    for fen in [
        // king and knight
        "8/8/4k3/8/8/3KN3/8/8 w - - 0 1",
        // king and bishop each
        "8/8/4kb2/8/8/3KB3/8/8 w - - 0 1",
        // two knights cannot force mate
        "8/8/4k3/8/8/3KNN2/8/8 w - - 0 1",
    ] {
        let engine = engine_at(fen);
        assert!(
            engine.position().state & DRAW_BIT != 0,
            "not flagged drawn: {fen}"
        );
    }
    // knight plus bishop can mate
    let engine = engine_at("8/8/4k3/8/8/3KNB2/8/8 w - - 0 1");
    assert!(engine.position().state & DRAW_BIT == 0);
}

#[test]
fn material_advantage_dominates() {
    // a clean extra rook should evaluate far above zero for the mover
    let engine = engine_at("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
    assert!(engine.stand_pat() > 300, "got {}", engine.stand_pat());

    // and far below when the opponent owns it
    let engine = engine_at("6k1/5ppp/8/8/8/8/5PPP/R5K1 b - - 0 1");
    assert!(engine.stand_pat() < -300, "got {}", engine.stand_pat());
}

#[test]
fn doubled_pawns_evaluate_worse_than_split_pawns() {
    let doubled = engine_at("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1");
    let split = engine_at("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1");
    assert!(
        split.stand_pat() > doubled.stand_pat(),
        "split {} doubled {}",
        split.stand_pat(),
        doubled.stand_pat()
    );
}

#[test]
fn eval_is_rounded_to_a_multiple_of_eight() {
    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
    ] {
        let engine = engine_at(fen);
        assert_eq!(engine.stand_pat() % 8, 0, "unrounded eval for {fen}");
    }
}
