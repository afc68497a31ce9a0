use suyan_core::LearnedPhrase;
use suyan_session::{InputMode, ModeChange, ModeOrigin};

use crate::integration::IntegrationError;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SyError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid data: {msg}")]
    InvalidData { msg: String },
    #[error("not initialized")]
    NotInitialized,
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<IntegrationError> for SyError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::NotInitialized => SyError::NotInitialized,
            IntegrationError::Io(e) => SyError::Io { msg: e.to_string() },
            IntegrationError::Settings(e) => SyError::InvalidData { msg: e.to_string() },
            e @ (IntegrationError::Storage(_) | IntegrationError::Bridge(_)) => {
                SyError::Internal { msg: e.to_string() }
            }
        }
    }
}

/// Foreign implementations that throw something unexpected.
impl From<uniffi::UnexpectedUniFFICallbackError> for SyError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        SyError::Internal { msg: e.reason }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, uniffi::Record)]
pub struct SyModeChange {
    pub previous: SyInputMode,
    pub current: SyInputMode,
    pub origin: SyModeOrigin,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct SyLearnedPhrase {
    pub word: String,
    pub context: String,
    pub segments: u32,
    pub score: u64,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum SyInputMode {
    Primary,
    Latin,
    TemporaryLatin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum SyModeOrigin {
    Api,
    Toggle,
    Engine,
    Commit,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<InputMode> for SyInputMode {
    fn from(m: InputMode) -> Self {
        match m {
            InputMode::Primary => SyInputMode::Primary,
            InputMode::Latin => SyInputMode::Latin,
            InputMode::TemporaryLatin => SyInputMode::TemporaryLatin,
        }
    }
}

impl From<SyInputMode> for InputMode {
    fn from(m: SyInputMode) -> Self {
        match m {
            SyInputMode::Primary => InputMode::Primary,
            SyInputMode::Latin => InputMode::Latin,
            SyInputMode::TemporaryLatin => InputMode::TemporaryLatin,
        }
    }
}

impl From<ModeOrigin> for SyModeOrigin {
    fn from(o: ModeOrigin) -> Self {
        match o {
            ModeOrigin::Api => SyModeOrigin::Api,
            ModeOrigin::Toggle => SyModeOrigin::Toggle,
            ModeOrigin::Engine => SyModeOrigin::Engine,
            ModeOrigin::Commit => SyModeOrigin::Commit,
        }
    }
}

impl From<ModeChange> for SyModeChange {
    fn from(c: ModeChange) -> Self {
        Self {
            previous: c.previous.into(),
            current: c.current.into(),
            origin: c.origin.into(),
        }
    }
}

impl From<LearnedPhrase> for SyLearnedPhrase {
    fn from(p: LearnedPhrase) -> Self {
        Self {
            word: p.word,
            context: p.context,
            segments: p.segments as u32,
            score: p.score,
        }
    }
}
