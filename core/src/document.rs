use crate::error::{Result, ScoreError};
use crate::index::DocId;
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 1000;
pub const MAX_TEXT_CHARS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub text: String,
}

/// Per-document aggregates memoized in the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    WordFrequencies,
    TfMax,
}

impl Aggregate {
    pub const ALL: [Aggregate; 2] = [Aggregate::WordFrequencies, Aggregate::TfMax];

    pub fn name(self) -> &'static str {
        match self {
            Aggregate::WordFrequencies => "word_frequencies",
            Aggregate::TfMax => "tf_max",
        }
    }
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let (title, text) = (title.into(), text.into());
        check_len("title", &title, MAX_TITLE_CHARS)?;
        check_len("text", &text, MAX_TEXT_CHARS)?;
        Ok(Self { id, title, text })
    }

    /// Transliterated title shared by all of this document's cache keys.
    pub fn cache_prefix(&self) -> String { transliterate(&self.title) }

    /// `<transliterated title>:<aggregate>`
    pub fn cache_key(&self, aggregate: Aggregate) -> String {
        format!("{}:{}", self.cache_prefix(), aggregate.name())
    }
}

fn check_len(field: &'static str, value: &str, limit: usize) -> Result<()> {
    if value.chars().count() > limit {
        return Err(ScoreError::TooLong { field, limit });
    }
    Ok(())
}

/// Russian to Latin transliteration; other characters pass through unchanged.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        let latin = match lower {
            'а' => "a", 'б' => "b", 'в' => "v", 'г' => "g", 'д' => "d", 'е' => "e", 'ё' => "e",
            'ж' => "zh", 'з' => "z", 'и' => "i", 'й' => "j", 'к' => "k", 'л' => "l", 'м' => "m",
            'н' => "n", 'о' => "o", 'п' => "p", 'р' => "r", 'с' => "s", 'т' => "t", 'у' => "u",
            'ф' => "f", 'х' => "h", 'ц' => "ts", 'ч' => "ch", 'ш' => "sh", 'щ' => "sch", 'ъ' => "\"",
            'ы' => "y", 'ь' => "'", 'э' => "e", 'ю' => "ju", 'я' => "ja",
            _ => {
                out.push(c);
                continue;
            }
        };
        if lower != c {
            let mut chars = latin.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(latin);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_transliterated() {
        let d = Document::new(0, "Съешь ещё", "текст").unwrap();
        assert_eq!(d.cache_key(Aggregate::WordFrequencies), "S\"esh' esche:word_frequencies");
        assert_eq!(d.cache_key(Aggregate::TfMax), "S\"esh' esche:tf_max");
    }

    #[test]
    fn latin_titles_pass_through() {
        assert_eq!(transliterate("Report-2021"), "Report-2021");
        assert_eq!(transliterate("Щука"), "Schuka");
    }

    #[test]
    fn cyrillic_and_latin_spellings_share_a_prefix() {
        let a = Document::new(0, "кот", "").unwrap();
        let b = Document::new(1, "kot", "").unwrap();
        assert_eq!(a.cache_prefix(), b.cache_prefix());
        assert_eq!(a.cache_key(Aggregate::TfMax), "kot:tf_max");
    }

    #[test]
    fn oversized_text_is_rejected() {
        let text = "я".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(Document::new(0, "t", text), Err(ScoreError::TooLong { field: "text", .. })));
    }
}
