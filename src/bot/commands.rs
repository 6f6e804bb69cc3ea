//! Bot commands.

/// Commands the bot reacts to. Anything else starting with `/` is plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin a new scanning session.
    Start,
    /// Show usage.
    Help,
    /// Abort the current session.
    Cancel,
    /// Finish a multi-item session.
    Done,
    /// Type the barcode instead of scanning it.
    Manual,
}

impl Command {
    /// Parses `/name`, `/name@BotName` or `/name args`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim_start().split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);

        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "cancel" => Some(Self::Cancel),
            "done" => Some(Self::Done),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Cancel => "cancel",
            Self::Done => "done",
            Self::Manual => "manual",
        }
    }
}
