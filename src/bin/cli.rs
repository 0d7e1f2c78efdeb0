//! UCI adapter. The engine core only ever sees a depth limit and a stop
//! flag; everything about the clock is decided here and enforced by a
//! timer thread that flips the flag.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stonewall::config::{OptionKind, OPTIONS};
use stonewall::engine::{Engine, GoLimits, STARTPOS};
use stonewall::logger;

fn main() {
    logger::init("stonewall=info");

    let mut engine = Engine::new();
    engine.initialize();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "setoption" => handle_setoption(&mut engine, &line),
            "ucinewgame" => {
                engine.clear_search_data();
                let _ = engine.set_position(STARTPOS);
            }
            "position" => handle_position(&mut engine, &parts),
            "go" => handle_go(&mut engine, &parts),
            "perft" => {
                let depth = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);
                engine.reset_stop();
                match engine.perft(depth) {
                    Ok(count) => println!("info string perft {depth} = {count}"),
                    Err(err) => eprintln!("{err}"),
                }
            }
            "fen" => println!("{}", engine.get_fen()),
            "d" | "display" => print!("{}", engine.board_string()),
            "stop" => {
                engine.stop_handle().store(true, Ordering::Relaxed);
            }
            "quit" => {
                engine.quit();
                break;
            }
            _ => {}
        }
    }
}

fn handle_uci() {
    println!("id name Stonewall 1.0");
    println!("id author Stonewall authors");
    for desc in OPTIONS {
        match desc.kind {
            OptionKind::Spin { default, min, max } => println!(
                "option name {} type spin default {} min {} max {}",
                desc.name, default, min, max
            ),
            OptionKind::Check { default } => {
                println!("option name {} type check default {}", desc.name, default);
            }
            OptionKind::Button => println!("option name {} type button", desc.name),
        }
    }
    println!("uciok");
}

fn handle_setoption(engine: &mut Engine, line: &str) {
    // setoption name <spaced name> [value <spaced value>]
    let Some(name_at) = line.find(" name ") else {
        return;
    };
    let after_name = &line[name_at + 6..];
    let (name, value) = match after_name.find(" value ") {
        Some(value_at) => (&after_name[..value_at], &after_name[value_at + 7..]),
        None => (after_name, ""),
    };
    if let Err(err) = engine.set_option(name.trim(), value.trim()) {
        eprintln!("{err}");
    }
}

fn handle_position(engine: &mut Engine, parts: &[&str]) {
    let result = if parts.get(1) == Some(&"startpos") {
        engine.set_position(STARTPOS)
    } else if parts.get(1) == Some(&"fen") {
        let moves_at = parts.iter().position(|&p| p == "moves").unwrap_or(parts.len());
        let fen = parts[2..moves_at].join(" ");
        engine.set_position(&fen).map(|_| "")
    } else {
        engine.set_position(STARTPOS)
    };
    if let Err(err) = result {
        eprintln!("{err}");
        return;
    }

    if let Some(moves_at) = parts.iter().position(|&p| p == "moves") {
        for mv in &parts[moves_at + 1..] {
            if let Err(err) = engine.make_move(mv) {
                eprintln!("{err}");
                return;
            }
        }
    }
}

fn handle_go(engine: &mut Engine, parts: &[&str]) {
    let mut limits = GoLimits::default();

    let mut i = 1;
    while i < parts.len() {
        let arg = |idx: usize| parts.get(idx).and_then(|s| s.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                limits.depth = arg(i + 1).unwrap_or(0) as i32;
                i += 2;
            }
            "movetime" => {
                limits.movetime = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "wtime" => {
                limits.wtime = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "btime" => {
                limits.btime = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "winc" => {
                limits.winc = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                limits.binc = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                limits.movestogo = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "infinite" => {
                limits.infinite = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    let stop = engine.reset_stop();
    if !limits.infinite
        && let Some(budget) = allocate_time(&limits, engine.white_to_move())
    {
        tracing::debug!(budget_ms = budget.as_millis() as u64, "time budget");
        arm_timer(stop, budget);
    }

    match engine.go(&limits) {
        Ok(Some(best)) => println!("bestmove {best}"),
        Ok(None) => println!("bestmove 0000"),
        Err(err) => eprintln!("{err}"),
    }
}

/// Pick a time budget from the clock. Conservative: a slice of the
/// remaining time plus most of the increment, capped hard so one move can
/// never drain the clock.
fn allocate_time(limits: &GoLimits, white: bool) -> Option<Duration> {
    if limits.movetime > 0 {
        return Some(Duration::from_millis(limits.movetime));
    }

    let (time, inc) = if white {
        (limits.wtime, limits.winc)
    } else {
        (limits.btime, limits.binc)
    };
    if time == 0 {
        return None;
    }

    // reserve a slice for I/O and OS latency the search never sees
    let safety = (time * 15 / 100).min(500);
    let usable = time.saturating_sub(safety);

    let mut alloc = if limits.movestogo > 0 {
        usable / limits.movestogo.max(2) + (inc * 3) / 4
    } else if usable > 5000 {
        usable / 40 + (inc * 9) / 10
    } else if usable > 2000 {
        usable / 30 + (inc * 3) / 4
    } else if usable > 500 {
        usable / 20 + inc / 2
    } else {
        inc / 2 + 20
    };

    alloc = alloc.min(usable / 5).min(usable);
    if alloc < 10 && usable >= 10 {
        alloc = 10;
    }
    Some(Duration::from_millis(alloc))
}

fn arm_timer(stop: Arc<AtomicBool>, budget: Duration) {
    thread::spawn(move || {
        thread::sleep(budget);
        stop.store(true, Ordering::Relaxed);
    });
}
