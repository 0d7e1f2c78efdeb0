use stonewall::config::{OptionKind, OPTIONS};
use stonewall::engine::{Engine, GoLimits, STARTPOS};
use stonewall::error::EngineError;
use stonewall::output::CaptureSink;

#[test]
fn descriptor_table_lists_the_uci_surface() {
    let names: Vec<&str> = OPTIONS.iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        [
            "Hash",
            "Clear Hash",
            "Contempt",
            "Delta Pruning Margin",
            "Check Extensions",
            "Internal Iterative Deepening",
            "Late Move Reduction",
            "Null Move Pruning",
            "One Reply Extensions",
            "Razoring Delta",
            "Tempo Bonus",
        ]
    );
    let hash = &OPTIONS[0];
    assert!(matches!(
        hash.kind,
        OptionKind::Spin {
            default: 1024,
            min: 0,
            max: 4096
        }
    ));
}

#[test]
fn engine_applies_option_changes() {
    let mut engine = Engine::new();
    engine.initialize();

    engine.set_option("Null Move Pruning", "false").unwrap();
    assert!(!engine.options().nmp);
    engine.set_option("Late Move Reduction", "0").unwrap();
    assert_eq!(engine.options().lmr, 0);
    engine.set_option("Razoring Delta", "0").unwrap();
    assert_eq!(engine.options().razor_margin, 0);

    assert!(matches!(
        engine.set_option("Ponder", "true"),
        Err(EngineError::UnknownOption(_))
    ));
}

#[test]
fn search_runs_with_every_heuristic_disabled() {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_sink(Box::new(CaptureSink::new()));

    for (name, value) in [
        ("Hash", "0"),
        ("Check Extensions", "false"),
        ("Internal Iterative Deepening", "false"),
        ("Late Move Reduction", "0"),
        ("Null Move Pruning", "false"),
        ("One Reply Extensions", "false"),
        ("Razoring Delta", "0"),
        ("Delta Pruning Margin", "0"),
    ] {
        engine.set_option(name, value).unwrap();
    }

    engine.set_position(STARTPOS).unwrap();
    let limits = GoLimits {
        depth: 4,
        ..GoLimits::default()
    };
    let best = engine.go(&limits).unwrap();
    assert!(best.is_some(), "no move found with heuristics off");
}

#[test]
fn go_and_perft_require_initialization() {
    let mut engine = Engine::new();
    assert!(matches!(
        engine.go(&GoLimits::default()),
        Err(EngineError::NotInitialized)
    ));
    assert!(matches!(engine.perft(3), Err(EngineError::NotInitialized)));
    assert!(matches!(
        engine.make_move("e2e4"),
        Err(EngineError::NotInitialized)
    ));
}

#[test]
fn clear_hash_button_is_accepted() {
    let mut engine = Engine::new();
    engine.initialize();
    engine.set_option("Clear Hash", "").unwrap();
}
