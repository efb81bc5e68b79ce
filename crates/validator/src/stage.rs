//! Pipeline states.

/// Where a validation run currently is.  `Done` and `Failed` are
/// terminal; the pipeline as a whole is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initializing,
    ExtractingLocal,
    FetchingRemote,
    ResolvingStatus,
    ComparingFields,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::ExtractingLocal => "extracting_local",
            Self::FetchingRemote => "fetching_remote",
            Self::ResolvingStatus => "resolving_status",
            Self::ComparingFields => "comparing_fields",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::FetchingRemote.is_terminal());
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(Stage::ExtractingLocal.to_string(), "extracting_local");
    }
}
