/// Segmentation mode (strongly-typed).
///
/// Used by [`Jieba::cut`](crate::Jieba::cut) so that mode dispatch is an
/// exhaustive `match` instead of string comparison in hot paths.
///
/// # String parsing
///
/// Mode names coming from a request can be parsed via `TryFrom<&str>`
/// (case-insensitive). Callers map unknown names to [`CutMode::Default`].
///
/// # Variants
///
/// | Variant    | Name       | Output                                                   |
/// |-----------:|------------|----------------------------------------------------------|
/// | 0          | `default`  | Same as `accurate`                                       |
/// | 1          | `full`     | Every dictionary word found at every position            |
/// | 2          | `accurate` | Most probable segmentation, HMM for unknown words        |
/// | 3          | `nohmm`    | Most probable segmentation, unknown chars left single    |
/// | 4          | `search`   | `accurate`, plus 2/3-char dictionary words inside long tokens |
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CutMode {
    #[default]
    Default = 0,

    Full = 1,

    Accurate = 2,

    NoHmm = 3,

    Search = 4,
}

impl TryFrom<&str> for CutMode {
    type Error = ();

    /// Accepted names: `"default"`, `"full"`, `"accurate"`, `"nohmm"`, `"search"`.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Ok(Self::Default),
            "full" => Ok(Self::Full),
            "accurate" => Ok(Self::Accurate),
            "nohmm" => Ok(Self::NoHmm),
            "search" => Ok(Self::Search),
            _ => Err(()),
        }
    }
}

impl CutMode {
    pub const ALL: [CutMode; 5] = [
        Self::Default,
        Self::Full,
        Self::Accurate,
        Self::NoHmm,
        Self::Search,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Full => "full",
            Self::Accurate => "accurate",
            Self::NoHmm => "nohmm",
            Self::Search => "search",
        }
    }

    /// Whether unknown single-character spans go through the HMM.
    #[inline]
    pub fn uses_hmm(self) -> bool {
        match self {
            Self::Default | Self::Accurate | Self::Search => true,
            Self::Full | Self::NoHmm => false,
        }
    }
}
