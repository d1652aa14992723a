pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("\"{panel}\" is not a valid panel. Valid panels are: {valid}.")]
    InvalidPanel { panel: String, valid: String },

    #[error("at least one panel must be requested")]
    NoPanels,

    #[error(
        "must run the in-space placebo analysis before plotting the in-space placebo panel"
    )]
    PlaceboMissing,

    #[error("series `{name}` is empty")]
    EmptySeries { name: String },

    #[error("series `{name}` has {actual} periods, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("periods_pre_treatment must be within 1..={periods_all}, got {periods_pre_treatment}")]
    PreTreatmentOutOfRange {
        periods_pre_treatment: usize,
        periods_all: usize,
    },

    #[error("expected one in-space placebo per control unit ({controls}), got {placebos}")]
    PlaceboCountMismatch { controls: usize, placebos: usize },

    #[error("series `{name}` has a non-finite value at period {index}")]
    NonFiniteValue { name: String, index: usize },

    #[error("time axis must be strictly increasing, but period {index} is not after the previous one")]
    TimeNotIncreasing { index: usize },

    #[error("invalid figure size: {message}")]
    InvalidFigureSize { message: String },

    #[error("study JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
