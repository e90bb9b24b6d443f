//! Line commands typed into the terminal shell.

use lifeview::runtime::Intent;
use lifeview::Speed;

pub const HELP: &str = "\
commands:
  p        play / pause
  s        step once
  f | l    faster / slower
  n        new grids
  r        retry after an error
  c <idx>  advance only grid <idx>
  h        this help
  q        quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    TogglePlay,
    Step,
    Faster,
    Slower,
    NewGrids,
    Retry,
    Click(usize),
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err("empty command".to_string());
        };
        let cmd = match word.to_ascii_lowercase().as_str() {
            "p" | "play" | "pause" => ShellCommand::TogglePlay,
            "s" | "step" => ShellCommand::Step,
            "f" | "faster" => ShellCommand::Faster,
            "l" | "slower" => ShellCommand::Slower,
            "n" | "new" | "reset" => ShellCommand::NewGrids,
            "r" | "retry" => ShellCommand::Retry,
            "c" | "click" => {
                let idx = words
                    .next()
                    .ok_or_else(|| "click needs a grid index".to_string())?;
                let idx: usize = idx
                    .parse()
                    .map_err(|_| format!("invalid grid index '{idx}'"))?;
                ShellCommand::Click(idx)
            }
            "h" | "help" | "?" => ShellCommand::Help,
            "q" | "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(cmd)
    }

    /// Controller intent, if the command maps to one.
    pub fn intent(self) -> Option<Intent> {
        match self {
            ShellCommand::TogglePlay => Some(Intent::TogglePlay),
            ShellCommand::Step => Some(Intent::Step),
            ShellCommand::Faster => Some(Intent::SetSpeed(Speed::Faster)),
            ShellCommand::Slower => Some(Intent::SetSpeed(Speed::Slower)),
            ShellCommand::NewGrids => Some(Intent::Reset),
            ShellCommand::Retry => Some(Intent::Retry),
            ShellCommand::Click(idx) => Some(Intent::Click(idx)),
            ShellCommand::Help | ShellCommand::Quit => None,
        }
    }
}
