//! Derivation path templates such as `m/44'/60'/0'/0/{i}`.
//!
//! A template is validated once, up front, so that a bad template is reported before
//! any seed is computed or any file is written. Resolving a valid template is then
//! total for every index below 2^31.

use crate::errors::MnemonicToolError;
use std::{fmt, str::FromStr};

pub const PLACEHOLDER: &str = "{i}";

/// Largest value a BIP32 level can carry before the hardened bit.
pub const MAX_LEVEL_INDEX: u32 = 0x7FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildIndex {
    pub index: u32,
    pub hardened: bool,
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Fixed(ChildIndex),
    Account { hardened: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    levels: Vec<Level>,
}

/// A fully resolved derivation path, e.g. `m/44'/60'/0'/0/3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcretePath {
    levels: Vec<ChildIndex>,
}

fn split_hardened(segment: &str) -> (&str, bool) {
    match segment
        .strip_suffix('\'')
        .or_else(|| segment.strip_suffix('h'))
        .or_else(|| segment.strip_suffix('H'))
    {
        Some(body) => (body, true),
        None => (segment, false),
    }
}

fn parse_index(body: &str) -> Option<u32> {
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    body.parse::<u32>().ok().filter(|v| *v <= MAX_LEVEL_INDEX)
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, MnemonicToolError> {
        let err = |reason: &str| MnemonicToolError::path_template(template, reason);

        let trimmed = template.trim();
        let mut parts = trimmed.split('/');
        if parts.next() != Some("m") {
            return Err(err("must start with `m/`"));
        }

        let mut levels = vec![];
        let mut placeholders = 0_usize;
        for segment in parts {
            let (body, hardened) = split_hardened(segment);
            if body == PLACEHOLDER {
                placeholders += 1;
                levels.push(Level::Account { hardened });
                continue;
            }
            if body.contains('{') || body.contains('}') {
                return Err(err(&format!(
                    "placeholder must fill a whole level, got `{segment}`"
                )));
            }
            let index = parse_index(body).ok_or_else(|| {
                err(&format!(
                    "`{segment}` is not a level index (0..=2147483647, optionally hardened with ' or h)"
                ))
            })?;
            levels.push(Level::Fixed(ChildIndex { index, hardened }));
        }

        match placeholders {
            0 => Err(err("missing `{i}` placeholder")),
            1 => Ok(Self {
                raw: trimmed.to_owned(),
                levels,
            }),
            _ => Err(err("`{i}` must appear exactly once")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substitute `index` for `{i}`.
    pub fn resolve(&self, index: u32) -> Result<ConcretePath, MnemonicToolError> {
        if index > MAX_LEVEL_INDEX {
            return Err(MnemonicToolError::path_template(
                &self.raw,
                format!("account index {index} does not fit in a derivation level"),
            ));
        }
        let levels = self
            .levels
            .iter()
            .map(|l| match *l {
                Level::Fixed(c) => c,
                Level::Account { hardened } => ChildIndex { index, hardened },
            })
            .collect();
        Ok(ConcretePath { levels })
    }

    /// True when every level, including the account level, is hardened.
    pub fn all_hardened(&self) -> bool {
        self.levels.iter().all(|l| match *l {
            Level::Fixed(c) => c.hardened,
            Level::Account { hardened } => hardened,
        })
    }
}

impl FromStr for PathTemplate {
    type Err = MnemonicToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl ConcretePath {
    pub fn levels(&self) -> &[ChildIndex] {
        &self.levels
    }

    /// First non-hardened level, if any.
    pub fn first_unhardened(&self) -> Option<ChildIndex> {
        self.levels.iter().copied().find(|c| !c.hardened)
    }

    /// BIP43 purpose level (`44`, `49`, `84`, `86`, ...).
    pub fn purpose(&self) -> Option<u32> {
        self.levels.first().map(|c| c.index)
    }
}

impl fmt::Display for ConcretePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for c in &self.levels {
            write!(f, "/{c}")?;
        }
        Ok(())
    }
}

/// Parse `template` and resolve it at `index` in one step.
pub fn resolve(template: &str, index: u32) -> Result<ConcretePath, MnemonicToolError> {
    PathTemplate::parse(template)?.resolve(index)
}
