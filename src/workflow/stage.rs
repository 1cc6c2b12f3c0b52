use std::fmt;

/// ワークフローの段階
///
/// ```text
/// Idle -> Uploading -> Reviewing -> Optimizing -> Completed
///   ^________|  (失敗)     ^___________|  (失敗)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    Reviewing,
    Optimizing,
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploading => "uploading",
            Stage::Reviewing => "reviewing",
            Stage::Optimizing => "optimizing",
            Stage::Completed => "completed",
        }
    }

    /// 通信待ちの段階か
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Stage::Uploading | Stage::Optimizing)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
