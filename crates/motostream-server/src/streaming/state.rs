/// Lifecycle of a single motorcycle stream.
///
/// ```text
/// Open -> Emitting -> Completed
///                  -> Failed
///                  -> Cancelled
/// ```
///
/// `emitted` counts items successfully handed to the subscriber channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Emitting { emitted: usize },
    Completed { emitted: usize },
    Failed { emitted: usize, reason: String },
    Cancelled { emitted: usize },
}

impl StreamState {
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }

    pub const fn emitted(&self) -> usize {
        match self {
            Self::Open => 0,
            Self::Emitting { emitted }
            | Self::Completed { emitted }
            | Self::Failed { emitted, .. }
            | Self::Cancelled { emitted } => *emitted,
        }
    }
}
