//! Every pruning and extension heuristic must be droppable without
//! changing what the search believes about a forced result.

use stonewall::engine::{Engine, GoLimits};
use stonewall::output::CaptureSink;

const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";

fn solve_with(toggles: &[(&str, &str)]) -> (String, String) {
    let mut engine = Engine::new();
    engine.initialize();
    let sink = CaptureSink::new();
    engine.set_sink(Box::new(sink.clone()));
    for (name, value) in toggles {
        engine.set_option(name, value).unwrap();
    }
    engine.set_position(MATE_IN_ONE).unwrap();
    let best = engine
        .go(&GoLimits {
            depth: 4,
            ..GoLimits::default()
        })
        .unwrap()
        .expect("a best move");
    let score = sink
        .lines()
        .iter()
        .rev()
        .find(|l| l.contains(" score "))
        .cloned()
        .unwrap();
    (best, score)
}

#[test]
fn baseline_finds_the_mate() {
    let (best, score) = solve_with(&[]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn null_move_off_finds_the_mate() {
    let (best, score) = solve_with(&[("Null Move Pruning", "false")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn lmr_off_finds_the_mate() {
    let (best, score) = solve_with(&[("Late Move Reduction", "0")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn lmr_maxed_finds_the_mate() {
    let (best, score) = solve_with(&[("Late Move Reduction", "3")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn razoring_off_finds_the_mate() {
    let (best, score) = solve_with(&[("Razoring Delta", "0")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn iid_off_finds_the_mate() {
    let (best, score) = solve_with(&[("Internal Iterative Deepening", "false")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn extensions_off_find_the_mate() {
    let (best, score) = solve_with(&[
        ("Check Extensions", "false"),
        ("One Reply Extensions", "false"),
    ]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}

#[test]
fn delta_margin_extremes_find_the_mate() {
    for margin in ["0", "9999"] {
        let (best, _) = solve_with(&[("Delta Pruning Margin", margin)]);
        assert_eq!(best, "a1a8", "margin {margin}");
    }
}

#[test]
fn hashless_search_finds_the_mate() {
    let (best, score) = solve_with(&[("Hash", "0")]);
    assert_eq!(best, "a1a8");
    assert!(score.contains("score mate 1"), "{score}");
}
