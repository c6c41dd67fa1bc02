/// How the decoder treats a `PreviousTagSize` that disagrees with the tag it follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrevTagSizeMode {
    /// Don't compare `PreviousTagSize` values at all.
    Ignore,
    /// Record and log mismatches but continue decoding.
    #[default]
    Warn,
    /// Treat any mismatch as an error.
    Strict,
}

/// What to do with a tag whose type is not Audio (8), Video (9) or Script (18).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    /// Stop decoding with [`DecodeError::UnknownTagType`](crate::DecodeError::UnknownTagType).
    #[default]
    Abort,
    /// Skip the tag's `data_size` payload bytes and continue with the next tag.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub prev_tag_size: PrevTagSizeMode,
    pub unknown_tag: UnknownTagPolicy,
    /// Decode script tag payloads. When false they are skipped.
    pub script_detail: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            prev_tag_size: PrevTagSizeMode::default(),
            unknown_tag: UnknownTagPolicy::default(),
            script_detail: true,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prev_tag_size_mode(mut self, mode: PrevTagSizeMode) -> Self {
        self.prev_tag_size = mode;
        self
    }

    pub fn with_unknown_tag_policy(mut self, policy: UnknownTagPolicy) -> Self {
        self.unknown_tag = policy;
        self
    }

    pub fn with_script_detail(mut self, enabled: bool) -> Self {
        self.script_detail = enabled;
        self
    }
}
