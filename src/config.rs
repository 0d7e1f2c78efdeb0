//! Engine options: the exact set the UCI handshake advertises, stored as
//! plain values the search reads every node. Range clamping happens here
//! so the search never has to defend against wild settings.

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Transposition table size in megabytes; 0 disables the table.
    pub hash_mb: i64,
    /// Magnitude of the draw score from the opponent's perspective.
    pub contempt: i32,
    /// Quiescence delta pruning margin; 0 disables.
    pub delta_margin: i32,
    pub check_extensions: bool,
    pub iid: bool,
    /// Base late-move reduction plies; 0 disables.
    pub lmr: i32,
    pub nmp: bool,
    pub one_reply_extensions: bool,
    /// Razoring margin; 0 disables.
    pub razor_margin: i32,
    /// Bonus for the side to move in static evaluation.
    pub tempo: i32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            hash_mb: 1024,
            contempt: 0,
            delta_margin: 500,
            check_extensions: true,
            iid: true,
            lmr: 1,
            nmp: true,
            one_reply_extensions: true,
            razor_margin: 500,
            tempo: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Spin { default: i64, min: i64, max: i64 },
    Check { default: bool },
    Button,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionDesc {
    pub name: &'static str,
    pub kind: OptionKind,
}

/// Side effect the engine must apply after an option change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionAction {
    None,
    ResizeHash(i64),
    ClearHash,
}

pub const OPTIONS: &[OptionDesc] = &[
    OptionDesc {
        name: "Hash",
        kind: OptionKind::Spin {
            default: 1024,
            min: 0,
            max: 4096,
        },
    },
    OptionDesc {
        name: "Clear Hash",
        kind: OptionKind::Button,
    },
    OptionDesc {
        name: "Contempt",
        kind: OptionKind::Spin {
            default: 0,
            min: 0,
            max: 50,
        },
    },
    OptionDesc {
        name: "Delta Pruning Margin",
        kind: OptionKind::Spin {
            default: 500,
            min: 0,
            max: 9999,
        },
    },
    OptionDesc {
        name: "Check Extensions",
        kind: OptionKind::Check { default: true },
    },
    OptionDesc {
        name: "Internal Iterative Deepening",
        kind: OptionKind::Check { default: true },
    },
    OptionDesc {
        name: "Late Move Reduction",
        kind: OptionKind::Spin {
            default: 1,
            min: 0,
            max: 3,
        },
    },
    OptionDesc {
        name: "Null Move Pruning",
        kind: OptionKind::Check { default: true },
    },
    OptionDesc {
        name: "One Reply Extensions",
        kind: OptionKind::Check { default: true },
    },
    OptionDesc {
        name: "Razoring Delta",
        kind: OptionKind::Spin {
            default: 500,
            min: 0,
            max: 9999,
        },
    },
    OptionDesc {
        name: "Tempo Bonus",
        kind: OptionKind::Spin {
            default: 0,
            min: 0,
            max: 50,
        },
    },
];

fn descriptor(name: &str) -> Option<&'static OptionDesc> {
    OPTIONS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

fn parse_spin(desc: &OptionDesc, value: &str) -> Result<i64, EngineError> {
    let OptionKind::Spin { min, max, .. } = desc.kind else {
        unreachable!()
    };
    let v: i64 = value
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidOptionValue {
            name: desc.name,
            value: value.to_string(),
        })?;
    Ok(v.clamp(min, max))
}

fn parse_check(desc: &OptionDesc, value: &str) -> Result<bool, EngineError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(EngineError::InvalidOptionValue {
            name: desc.name,
            value: value.to_string(),
        }),
    }
}

impl Options {
    /// Apply a named option. Returns the action the engine owner still has
    /// to perform (hash resize / clear).
    pub fn set(&mut self, name: &str, value: &str) -> Result<OptionAction, EngineError> {
        let desc = descriptor(name).ok_or_else(|| EngineError::UnknownOption(name.to_string()))?;
        match desc.name {
            "Hash" => {
                self.hash_mb = parse_spin(desc, value)?;
                Ok(OptionAction::ResizeHash(self.hash_mb))
            }
            "Clear Hash" => Ok(OptionAction::ClearHash),
            "Contempt" => {
                self.contempt = parse_spin(desc, value)? as i32;
                Ok(OptionAction::None)
            }
            "Delta Pruning Margin" => {
                self.delta_margin = parse_spin(desc, value)? as i32;
                Ok(OptionAction::None)
            }
            "Check Extensions" => {
                self.check_extensions = parse_check(desc, value)?;
                Ok(OptionAction::None)
            }
            "Internal Iterative Deepening" => {
                self.iid = parse_check(desc, value)?;
                Ok(OptionAction::None)
            }
            "Late Move Reduction" => {
                self.lmr = parse_spin(desc, value)? as i32;
                Ok(OptionAction::None)
            }
            "Null Move Pruning" => {
                self.nmp = parse_check(desc, value)?;
                Ok(OptionAction::None)
            }
            "One Reply Extensions" => {
                self.one_reply_extensions = parse_check(desc, value)?;
                Ok(OptionAction::None)
            }
            "Razoring Delta" => {
                self.razor_margin = parse_spin(desc, value)? as i32;
                Ok(OptionAction::None)
            }
            "Tempo Bonus" => {
                self.tempo = parse_spin(desc, value)? as i32;
                Ok(OptionAction::None)
            }
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_values_clamp_to_range() {
        let mut opts = Options::default();
        assert_eq!(
            opts.set("Hash", "99999").unwrap(),
            OptionAction::ResizeHash(4096)
        );
        opts.set("Late Move Reduction", "7").unwrap();
        assert_eq!(opts.lmr, 3);
        opts.set("Contempt", "25").unwrap();
        assert_eq!(opts.contempt, 25);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut opts = Options::default();
        opts.set("null move pruning", "false").unwrap();
        assert!(!opts.nmp);
    }

    #[test]
    fn unknown_and_malformed_are_rejected() {
        let mut opts = Options::default();
        assert!(matches!(
            opts.set("Threads", "4"),
            Err(EngineError::UnknownOption(_))
        ));
        assert!(matches!(
            opts.set("Hash", "lots"),
            Err(EngineError::InvalidOptionValue { .. })
        ));
    }
}
