use std::fmt;

/// Input mode. The discriminants are the codes used at the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum InputMode {
    /// Native-script (pinyin) input.
    #[default]
    Primary = 0,
    /// Persistent Latin/ASCII input.
    Latin = 1,
    /// One-shot Latin input, expected to revert to Primary.
    TemporaryLatin = 2,
}

impl InputMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Latin),
            2 => Some(Self::TemporaryLatin),
            _ => None,
        }
    }

    /// The engine's ASCII flag for this mode.
    pub fn is_ascii(self) -> bool {
        !matches!(self, Self::Primary)
    }

    pub fn from_ascii(ascii: bool) -> Self {
        if ascii {
            Self::Latin
        } else {
            Self::Primary
        }
    }

    /// `TemporaryLatin` collapses to `Primary` instead of cycling on.
    pub fn toggled(self) -> Self {
        match self {
            Self::Primary => Self::Latin,
            Self::Latin | Self::TemporaryLatin => Self::Primary,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Latin,
            2 => Self::TemporaryLatin,
            _ => Self::Primary,
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Latin => "latin",
            Self::TemporaryLatin => "temporary-latin",
        })
    }
}

/// What requested a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOrigin {
    /// Direct `set` call.
    Api,
    Toggle,
    /// The engine reported a new ASCII flag.
    Engine,
    /// TemporaryLatin reverted after a commit.
    Commit,
}

/// Delivered to the listener once per effective transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub previous: InputMode,
    pub current: InputMode,
    pub origin: ModeOrigin,
}
