//! Interchangeable summarization strategies.
//!
//! `Own` is the TF-IDF sentence scoring of this crate. `Frequency` and
//! `TextRank` are the two alternative rankers that can be selected instead;
//! all three turn a document into summary text the same way.

pub mod frequency;
pub mod textrank;

use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use frequency::FrequencySummarizer;
pub use textrank::TextRankConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Own,
    Frequency,
    TextRank,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Own, Strategy::Frequency, Strategy::TextRank];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Own => "own",
            Strategy::Frequency => "frequency",
            Strategy::TextRank => "textrank",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Strategy {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "own" => Ok(Strategy::Own),
            "frequency" | "spacy" => Ok(Strategy::Frequency),
            "textrank" | "gensim" => Ok(Strategy::TextRank),
            _ => Err(ScoreError::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_legacy_aliases() {
        assert_eq!("own".parse::<Strategy>().unwrap(), Strategy::Own);
        assert_eq!("Spacy".parse::<Strategy>().unwrap(), Strategy::Frequency);
        assert_eq!("gensim".parse::<Strategy>().unwrap(), Strategy::TextRank);
        assert!(matches!("lsa".parse::<Strategy>(), Err(ScoreError::UnknownStrategy(_))));
        for s in Strategy::ALL {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }
}
