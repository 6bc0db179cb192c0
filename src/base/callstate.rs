/// Execution state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallState {
    /// Never executed; a new execution may start.
    #[default]
    Idle,

    /// An execution was dispatched and has not been resolved yet.
    ///
    /// For `invoke` this lasts until `invoke_finish` consumes the result.
    InFlight,

    /// The last execution completed; a new one may start.
    Completed,
}

impl CallState {
    /// Whether a new execution may start from this state.
    pub fn can_start(self) -> bool {
        !matches!(self, CallState::InFlight)
    }
}
