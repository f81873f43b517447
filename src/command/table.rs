//! Command table and line parser.
//!
//! Every command is a fixed word phrase, optionally followed by integer
//! arguments. The table is const data; parsing borrows from the line and
//! allocates nothing.

use crate::config::MAX_COMMAND_TOKENS;
use crate::error::{MonitorError, Result};

/// Command identity, independent of its spelling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandId {
    /// List commands
    Help,
    /// Latest temperatures
    Status,
    /// Latest temperatures (alias of `status`)
    GetTemps,
    /// Flip the stream flag
    ToggleStream,
    /// Flip the conversion log flag
    ToggleTempLog,
    /// Rebuild the acquisition cache now
    ForceRefresh,
    /// Change the sampling interval
    SetInterval,
    /// Report the sampling interval
    GetInterval,
    /// Calibration offset +1 step
    IncrCal,
    /// Calibration offset -1 step
    DecrCal,
    /// Calibration offset to a value
    SetCal,
}

/// Command metadata (const-initializable, no execution logic).
#[derive(Debug, Clone)]
pub struct CommandMeta {
    /// Which command this is
    pub id: CommandId,

    /// Words that select the command
    pub phrase: &'static str,

    /// Argument placeholders, for help output
    pub usage: &'static str,

    /// Number of integer arguments after the phrase
    pub arg_count: usize,
}

/// All recognized commands, in help order.
pub const COMMANDS: &[CommandMeta] = &[
    CommandMeta { id: CommandId::Help, phrase: "help", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::Status, phrase: "status", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::GetTemps, phrase: "get temps", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::ToggleStream, phrase: "toggle serial stream", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::ToggleTempLog, phrase: "toggle temp log", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::ForceRefresh, phrase: "force cache refresh", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::SetInterval, phrase: "set sampling interval", usage: " <ms>", arg_count: 1 },
    CommandMeta { id: CommandId::GetInterval, phrase: "get sampling interval", usage: "", arg_count: 0 },
    CommandMeta { id: CommandId::IncrCal, phrase: "incr cal res", usage: " <index>", arg_count: 1 },
    CommandMeta { id: CommandId::DecrCal, phrase: "decr cal res", usage: " <index>", arg_count: 1 },
    CommandMeta { id: CommandId::SetCal, phrase: "set cal res", usage: " <index> <ohms>", arg_count: 2 },
];

/// A parsed command with its arguments.
///
/// Indices are still the 1-based protocol values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// `help`
    Help,
    /// `status` / `get temps`
    Temperatures,
    /// `toggle serial stream`
    ToggleStream,
    /// `toggle temp log`
    ToggleTempLog,
    /// `force cache refresh`
    ForceRefresh,
    /// `set sampling interval <ms>`
    SetInterval(i64),
    /// `get sampling interval`
    GetInterval,
    /// `incr cal res <index>`
    IncrCal(i64),
    /// `decr cal res <index>`
    DecrCal(i64),
    /// `set cal res <index> <ohms>`
    SetCal {
        /// 1-based slot index
        index: i64,
        /// New offset
        offset: i64,
    },
}

/// Parse one trimmed line.
///
/// Returns `Ok(None)` for an unrecognized line, including a fixed phrase with
/// trailing words. A recognized phrase with the wrong number of arguments or
/// a non-integer argument is `MalformedCommand`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    for meta in COMMANDS {
        let Some(rest) = strip_phrase(meta.phrase, line) else {
            continue;
        };

        if meta.arg_count == 0 {
            if rest.clone().next().is_some() {
                continue;
            }
            return Ok(Some(build(meta.id, &[])));
        }

        let mut args: heapless::Vec<i64, MAX_COMMAND_TOKENS> = heapless::Vec::new();
        for token in rest {
            let value = token
                .parse::<i64>()
                .map_err(|_| MonitorError::MalformedCommand)?;
            args.push(value).map_err(|_| MonitorError::MalformedCommand)?;
        }
        if args.len() != meta.arg_count {
            return Err(MonitorError::MalformedCommand);
        }
        return Ok(Some(build(meta.id, &args)));
    }
    Ok(None)
}

/// Remaining words if `line` starts with every word of `phrase`.
fn strip_phrase<'a>(phrase: &str, line: &'a str) -> Option<core::str::SplitWhitespace<'a>> {
    let mut tokens = line.split_whitespace();
    for word in phrase.split_whitespace() {
        if tokens.next()? != word {
            return None;
        }
    }
    Some(tokens)
}

/// `args` has exactly `arg_count` entries for `id`.
fn build(id: CommandId, args: &[i64]) -> Command {
    let arg = |n: usize| args.get(n).copied().unwrap_or_default();
    match id {
        CommandId::Help => Command::Help,
        CommandId::Status | CommandId::GetTemps => Command::Temperatures,
        CommandId::ToggleStream => Command::ToggleStream,
        CommandId::ToggleTempLog => Command::ToggleTempLog,
        CommandId::ForceRefresh => Command::ForceRefresh,
        CommandId::SetInterval => Command::SetInterval(arg(0)),
        CommandId::GetInterval => Command::GetInterval,
        CommandId::IncrCal => Command::IncrCal(arg(0)),
        CommandId::DecrCal => Command::DecrCal(arg(0)),
        CommandId::SetCal => Command::SetCal {
            index: arg(0),
            offset: arg(1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_phrases() {
        let cases = [
            ("help", Command::Help),
            ("status", Command::Temperatures),
            ("get temps", Command::Temperatures),
            ("toggle serial stream", Command::ToggleStream),
            ("toggle temp log", Command::ToggleTempLog),
            ("force cache refresh", Command::ForceRefresh),
            ("get sampling interval", Command::GetInterval),
        ];
        for (line, expected) in cases {
            assert_eq!(parse(line).unwrap(), Some(expected), "line {:?}", line);
        }
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            parse("set sampling interval 5000").unwrap(),
            Some(Command::SetInterval(5000))
        );
        assert_eq!(parse("incr cal res 2").unwrap(), Some(Command::IncrCal(2)));
        assert_eq!(parse("decr cal res 6").unwrap(), Some(Command::DecrCal(6)));
        assert_eq!(
            parse("set cal res 2 -150").unwrap(),
            Some(Command::SetCal {
                index: 2,
                offset: -150
            })
        );
    }

    #[test]
    fn test_extra_whitespace_between_words() {
        assert_eq!(
            parse("set   cal\tres 1  10").unwrap(),
            Some(Command::SetCal {
                index: 1,
                offset: 10
            })
        );
    }

    #[test]
    fn test_unrecognized() {
        for line in ["", "reboot", "status now", "get", "toggle serial", "HELP"] {
            assert_eq!(parse(line).unwrap(), None, "line {:?}", line);
        }
    }

    #[test]
    fn test_malformed_arguments() {
        for line in [
            "set sampling interval",
            "set sampling interval fast",
            "set sampling interval 1000 2000",
            "incr cal res",
            "set cal res 2",
            "set cal res two 150",
            "set cal res 1 2 3 4 5 6 7 8 9",
        ] {
            assert!(
                matches!(parse(line), Err(MonitorError::MalformedCommand)),
                "line {:?}",
                line
            );
        }
    }

    #[test]
    fn test_table_phrases_unique() {
        for (i, a) in COMMANDS.iter().enumerate() {
            for b in &COMMANDS[i + 1..] {
                assert_ne!(a.phrase, b.phrase);
            }
        }
    }
}
