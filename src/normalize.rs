//! Turns raw profile records into liked-item names and feature token bags.

use std::fmt;

use fnv::FnvHashSet;
use regex::Regex;
use serde_derive::Deserialize;
use tracing::warn;

use crate::error::Result;

/// Value used upstream for fields a user left empty
pub const NOT_AVAILABLE: &str = "N/A";

/// One user's profile as delivered by the collector. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub tv: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub movies: Option<String>,
    #[serde(default)]
    pub books: Option<String>,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub activities: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Tv,
    About,
    Gender,
    Locale,
    Movies,
    Books,
    Music,
    Interests,
    Activities,
}

/// Fields contributing to the feature bag, in the order their tokens are concatenated
pub const FEATURE_FIELDS: [ProfileField; 8] = [
    ProfileField::About,
    ProfileField::Gender,
    ProfileField::Locale,
    ProfileField::Movies,
    ProfileField::Books,
    ProfileField::Music,
    ProfileField::Interests,
    ProfileField::Activities,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Whitespace,
}

impl ProfileField {

    pub fn name(&self) -> &'static str {
        match *self {
            ProfileField::Tv => "tv",
            ProfileField::About => "about",
            ProfileField::Gender => "gender",
            ProfileField::Locale => "locale",
            ProfileField::Movies => "movies",
            ProfileField::Books => "books",
            ProfileField::Music => "music",
            ProfileField::Interests => "interests",
            ProfileField::Activities => "activities",
        }
    }

    /// List-like fields are comma separated, prose and categorical fields are split on
    /// whitespace.
    pub fn delimiter(&self) -> Delimiter {
        match *self {
            ProfileField::About | ProfileField::Gender | ProfileField::Locale =>
                Delimiter::Whitespace,
            _ => Delimiter::Comma,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl UserRecord {

    pub fn field(&self, field: ProfileField) -> Option<&str> {
        let value = match field {
            ProfileField::Tv => &self.tv,
            ProfileField::About => &self.about,
            ProfileField::Gender => &self.gender,
            ProfileField::Locale => &self.locale,
            ProfileField::Movies => &self.movies,
            ProfileField::Books => &self.books,
            ProfileField::Music => &self.music,
            ProfileField::Interests => &self.interests,
            ProfileField::Activities => &self.activities,
        };

        value.as_ref().map(|text| text.as_str())
    }
}

/// Result of normalizing a single field. A skipped field contributes nothing, the reason is
/// kept so the loss stays visible.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Tokens(Vec<String>),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedField {
    pub field: ProfileField,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub user: String,
    /// Distinct liked-item names in order of first appearance
    pub liked_items: Vec<String>,
    pub features: Vec<String>,
    pub diagnostics: Vec<SkippedField>,
}

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub stopwords: FnvHashSet<String>,
    /// Words are extracted from feature tokens with this pattern
    pub word_pattern: String,
    /// Feature tokens fully matching this pattern are dropped
    pub noise_pattern: Option<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            stopwords: FnvHashSet::default(),
            word_pattern: String::from(r"\w+"),
            noise_pattern: Some(String::from(r"^[_\d.]+$")),
        }
    }
}

pub struct Normalizer {
    stopwords: FnvHashSet<String>,
    word: Regex,
    noise: Option<Regex>,
}

impl Normalizer {

    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let word = Regex::new(&config.word_pattern)?;
        let noise = match config.noise_pattern {
            Some(pattern) => Some(Regex::new(&pattern)?),
            None => None,
        };

        Ok(Normalizer { stopwords: config.stopwords, word, noise })
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn is_noise(&self, token: &str) -> bool {
        match self.noise {
            Some(ref noise) => noise.is_match(token),
            None => false,
        }
    }

    /// Splits, trims and lowercases a raw field value. Missing values and the `N/A` sentinel
    /// yield no tokens.
    pub fn tokens(&self, text: Option<&str>, delimiter: Delimiter) -> FieldOutcome {
        let text = match text {
            Some(text) if text.trim() != NOT_AVAILABLE => text,
            _ => return FieldOutcome::Tokens(Vec::new()),
        };

        let pieces: Vec<&str> = match delimiter {
            Delimiter::Comma => text.split(',').collect(),
            Delimiter::Whitespace => text.split_whitespace().collect(),
        };

        let mut tokens = Vec::with_capacity(pieces.len());

        for piece in pieces {
            let token = piece.trim().to_lowercase();
            if token.is_empty() {
                continue;
            }
            if let Err(reason) = encode(&token) {
                return FieldOutcome::Skipped(reason);
            }
            tokens.push(token);
        }

        FieldOutcome::Tokens(tokens)
    }

    /// Like `tokens`, but reduces every token to its first word and drops stopwords and noise.
    pub fn feature_tokens(&self, text: Option<&str>, delimiter: Delimiter) -> FieldOutcome {
        match self.tokens(text, delimiter) {
            FieldOutcome::Tokens(tokens) => {
                let words = tokens.iter()
                    .filter_map(|token| self.first_word(token))
                    .collect();
                FieldOutcome::Tokens(words)
            },
            skipped => skipped,
        }
    }

    /// First word of an already normalized token, unless it is a stopword or noise.
    pub fn first_word(&self, token: &str) -> Option<String> {
        self.word.find(token)
            .map(|word| word.as_str())
            .filter(|word| self.is_term(word))
            .map(String::from)
    }

    /// All words of an already normalized token, without stopwords and noise.
    pub fn words(&self, token: &str) -> Vec<String> {
        self.word.find_iter(token)
            .map(|word| word.as_str())
            .filter(|word| self.is_term(word))
            .map(String::from)
            .collect()
    }

    fn is_term(&self, word: &str) -> bool {
        !self.is_stopword(word) && !self.is_noise(word)
    }

    pub fn normalize(&self, record: &UserRecord) -> NormalizedRecord {

        let mut diagnostics = Vec::new();

        let mut liked_items = Vec::new();
        let field = ProfileField::Tv;
        match self.tokens(record.field(field), field.delimiter()) {
            FieldOutcome::Tokens(tokens) => {
                let mut seen = FnvHashSet::default();
                for token in tokens {
                    if seen.insert(token.clone()) {
                        liked_items.push(token);
                    }
                }
            },
            FieldOutcome::Skipped(reason) => {
                diagnostics.push(skipped(&record.id, field, reason));
            },
        }

        let mut features = Vec::new();
        for field in FEATURE_FIELDS.iter() {
            match self.feature_tokens(record.field(*field), field.delimiter()) {
                FieldOutcome::Tokens(tokens) => features.extend(tokens),
                FieldOutcome::Skipped(reason) => {
                    diagnostics.push(skipped(&record.id, *field, reason));
                },
            }
        }

        NormalizedRecord { user: record.id.clone(), liked_items, features, diagnostics }
    }
}

fn skipped(user: &str, field: ProfileField, reason: String) -> SkippedField {
    warn!(user = %user, field = %field, reason = %reason, "Skipping malformed profile field");
    SkippedField { field, reason }
}

/// Tokens must be clean text: a replacement character marks an upstream decoding failure, and
/// control characters other than whitespace do not occur in text that decoded correctly.
fn encode(token: &str) -> std::result::Result<(), String> {
    if let Some(position) = token.find('\u{FFFD}') {
        return Err(format!("undecodable character at byte {} of {:?}", position, token));
    }
    if token.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(format!("control character in {:?}", token));
    }
    Ok(())
}
