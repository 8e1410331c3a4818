use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Morphological class of a token. Only `Content` tokens carry topical weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Content,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
}

impl PartOfSpeech {
    pub fn is_function_word(self) -> bool { self != PartOfSpeech::Content }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTerm {
    pub lemma: String,
    pub tag: PartOfSpeech,
}

impl NormalizedTerm {
    pub fn is_content(&self) -> bool { !self.tag.is_function_word() }
}

/// Reduces words to a canonical form and classifies them.
///
/// Implementations are injected into the scoring components; only `parse` is
/// required, the text-level helpers are built on top of it.
pub trait Normalizer: Send + Sync {
    fn parse(&self, token: &str) -> NormalizedTerm;

    /// Every surviving token of `text`, function words included.
    fn analyze(&self, text: &str) -> Vec<NormalizedTerm> {
        tokens(text).map(|t| self.parse(t)).collect()
    }

    /// Canonical forms of the content-bearing tokens of `text`, in order.
    fn content_terms(&self, text: &str) -> Vec<String> {
        tokens(text)
            .map(|t| self.parse(t))
            .filter(NormalizedTerm::is_content)
            .map(|t| t.lemma)
            .collect()
    }

    fn lemma(&self, word: &str) -> String {
        self.parse(strip_punctuation(word)).lemma
    }
}

pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '«' | '»' | '—' | '–' | '…' | '“' | '”' | '„' | '‘' | '’')
}

pub fn strip_punctuation(token: &str) -> &str { token.trim_matches(is_punctuation) }

/// Whitespace tokens with leading/trailing punctuation removed; pure punctuation is dropped.
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().map(strip_punctuation).filter(|t| !t.is_empty())
}

const PREPOSITIONS: &[&str] = &[
    "в","во","на","с","со","к","ко","о","об","обо","от","ото","по","за","из","изо","у","до","для",
    "без","безо","под","подо","над","надо","при","про","через","между","меж","перед","передо","около",
    "после","вокруг","против","среди","сквозь","ради","вместо","кроме","возле","мимо","вдоль","вне",
    "внутри","благодаря","согласно","вследствие","насчет","из-за","из-под","сверх","вроде",
    "in","on","at","of","to","from","with","by","for","about","into","onto","over","under","between",
    "through","during","without","within","upon","across","against","among","after","before","behind",
    "below","beneath","beside","beyond","near","since","toward","towards","via","per",
];

const CONJUNCTIONS: &[&str] = &[
    "и","а","но","или","либо","да","что","чтобы","если","когда","как","потому","поэтому","хотя","также",
    "тоже","зато","однако","будто","словно","пока","ибо","причем","притом","иначе","едва",
    "затем","то","так","нежели","чем",
    "and","or","but","nor","yet","if","because","although","though","while","whereas","unless",
    "whether","than","so",
];

const PARTICLES: &[&str] = &[
    "не","ни","же","ли","бы","б","вот","вон","даже","ведь","уж","только","лишь","разве","неужели",
    "именно","пусть","пускай","давай","мол","дескать","ка","ж",
    "not",
];

const INTERJECTIONS: &[&str] = &[
    "ах","ох","эх","ух","ой","ай","увы","ура","эй","ого","ну","алло","браво","тьфу","фу","ага","угу",
    "oh","ah","wow","hey","alas","oops","ouch","hmm","hurray",
];

lazy_static! {
    static ref CLOSED_CLASSES: HashMap<&'static str, PartOfSpeech> = {
        let groups = [
            (PartOfSpeech::Preposition, PREPOSITIONS),
            (PartOfSpeech::Conjunction, CONJUNCTIONS),
            (PartOfSpeech::Particle, PARTICLES),
            (PartOfSpeech::Interjection, INTERJECTIONS),
        ];
        let mut map = HashMap::new();
        for (tag, words) in groups {
            for w in words { map.entry(*w).or_insert(tag); }
        }
        map
    };
}

/// Default normalizer: closed-class lexicon for tagging, Snowball stemming for the canonical form.
pub struct MorphNormalizer {
    russian: Stemmer,
    english: Stemmer,
}

impl Default for MorphNormalizer {
    fn default() -> Self { Self::new() }
}

impl MorphNormalizer {
    pub fn new() -> Self {
        Self { russian: Stemmer::create(Algorithm::Russian), english: Stemmer::create(Algorithm::English) }
    }
}

fn is_cyrillic(c: char) -> bool { matches!(c, '\u{0400}'..='\u{04FF}') }

impl Normalizer for MorphNormalizer {
    fn parse(&self, token: &str) -> NormalizedTerm {
        let lower = token.nfkc().collect::<String>().to_lowercase().replace('ё', "е");
        if let Some(&tag) = CLOSED_CLASSES.get(lower.as_str()) {
            return NormalizedTerm { lemma: lower, tag };
        }
        let stemmer = if lower.chars().any(is_cyrillic) { &self.russian } else { &self.english };
        NormalizedTerm { lemma: stemmer.stem(&lower).into_owned(), tag: PartOfSpeech::Content }
    }
}
