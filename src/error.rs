//! Error types for testbench construction and execution.

/// Invalid configuration detected before any signal is driven.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("clock period must be greater than zero")]
    ZeroPeriod,

    #[error("clock period of {steps} simulator step(s) is too short to toggle at half period")]
    PeriodTooShort { steps: u64 },

    #[error("unknown time unit '{0}'")]
    UnknownTimeUnit(String),

    /// A time value can't be expressed in whole simulator steps.
    #[error("can't convert {time} {unit} to simulator steps without rounding (precision: {precision})")]
    NonIntegralTime {
        time: u64,
        unit: String,
        precision: String,
    },

    #[error("time {time} {unit} overflows the simulator time range")]
    TimeOverflow { time: u64, unit: String },

    #[error("port '{0}' has zero width")]
    ZeroWidthPort(String),

    #[error("port '{0}' is declared twice")]
    DuplicatePort(String),
}

/// Errors raised while running a testbench.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TbError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no simulator is installed on this thread")]
    NoSimulator,

    #[error("object not found: {0}")]
    UnknownObject(String),

    #[error("invalid handle {0}")]
    InvalidHandle(usize),

    #[error("'{0}' is not a signal")]
    NotASignal(String),

    #[error("width mismatch on '{name}': expected {expected} bit(s), got {actual}")]
    WidthMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("'{0}' is not writable from the testbench")]
    NotWritable(String),

    #[error("'{0}' is already driven by another driver")]
    AlreadyDriven(String),

    #[error("write to '{0}' during the read-only phase")]
    ReadOnlyPhase(String),

    #[error("invalid bit string '{0}'")]
    InvalidBitString(String),

    /// The simulation ran out of events before the test finished.
    #[error("simulation stalled at step {time_steps}: no further events scheduled")]
    Stalled { time_steps: u64 },

    #[error("simulation time limit of {limit_steps} step(s) reached")]
    Timeout { limit_steps: u64 },

    #[error("delta cycle limit exceeded at step {time_steps} (max {max_deltas} deltas)")]
    DeltaLimit { time_steps: u64, max_deltas: u32 },

    /// At least one output group was not fully defined when sampled.
    #[error("output '{first}' is undefined ({} undefined group(s))", .groups.len())]
    UndefinedOutputs {
        first: String,
        /// Every undefined group as `(name, binary value)`.
        groups: Vec<(String, String)>,
    },

    #[error("awaited task was cancelled")]
    TaskCancelled,
}

pub type TbResult<T = ()> = Result<T, TbError>;
