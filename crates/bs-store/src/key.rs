use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::StoreError;

/// Storage key of a chapter: `main_<n>` or `dlc_<pack>_<n>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChapterKey {
    Main { chapter: u32 },
    Dlc { pack: String, chapter: u32 },
}

fn main_key_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^main_(\d+)$").expect("main key regex must compile"))
}

fn dlc_key_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^dlc_([a-z0-9][a-z0-9_]*)_(\d+)$").expect("dlc key regex must compile")
    })
}

impl ChapterKey {
    pub fn main(chapter: u32) -> Self {
        Self::Main { chapter }
    }

    pub fn dlc(pack: impl Into<String>, chapter: u32) -> Self {
        Self::Dlc {
            pack: pack.into(),
            chapter,
        }
    }

    pub fn chapter(&self) -> u32 {
        match self {
            Self::Main { chapter } | Self::Dlc { chapter, .. } => *chapter,
        }
    }
}

impl FromStr for ChapterKey {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidKey(raw.to_string());

        let key = if let Some(captures) = main_key_regex().captures(raw) {
            Self::Main {
                chapter: captures[1].parse().map_err(|_| invalid())?,
            }
        } else if let Some(captures) = dlc_key_regex().captures(raw) {
            Self::Dlc {
                pack: captures[1].to_string(),
                chapter: captures[2].parse().map_err(|_| invalid())?,
            }
        } else {
            return Err(invalid());
        };

        // One row per chapter: `main_01` would alias `main_1`.
        if key.to_string() != raw {
            return Err(invalid());
        }
        Ok(key)
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main { chapter } => write!(f, "main_{}", chapter),
            Self::Dlc { pack, chapter } => write!(f, "dlc_{}_{}", pack, chapter),
        }
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn parses_main_and_dlc_keys() {
        assert_eq!("main_3".parse::<ChapterKey>().expect("main"), ChapterKey::main(3));
        let dlc = "dlc_hr_onboarding_2".parse::<ChapterKey>().expect("dlc");
        assert_eq!(dlc, ChapterKey::dlc("hr_onboarding", 2));
        assert_eq!(dlc.chapter(), 2);
        assert_eq!(dlc.to_string(), "dlc_hr_onboarding_2");
    }

    #[test]
    fn rejects_other_shapes() {
        for raw in ["", "main", "main_x", "main_01", "dlc__1", "dlc_pack", "dlc_pack_007", "../main_1", "MAIN_1"] {
            assert!(
                matches!(raw.parse::<ChapterKey>(), Err(StoreError::InvalidKey(_))),
                "{} should be rejected",
                raw
            );
        }
    }
}
