use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

/// One learned word sense from the remote vocabulary overview. Read-only
/// snapshot, alive for a single sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub id: String,                    // Opaque lexeme id, unique per word sense
    pub word_string: String,           // Surface form in the learning language
    #[serde(default)]
    pub normalized_string: String,     // Normalized pronunciation/spelling
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,           // Part-of-speech label
    #[serde(default)]
    pub skill: Option<String>,         // Course skill the word was taught in
}

/// Word string -> ordered translations. Entries may be missing or empty for a
/// subset of the requested words; those go through the fallback lookup.
pub type TranslationMap = HashMap<String, Vec<String>>;

/// Output of the retrieve stage: the target language and the entries that do
/// not exist locally yet, in the remote listing order.
#[derive(Debug, Clone)]
pub struct RetrievedVocabulary {
    pub language: String,
    pub new_entries: Vec<VocabularyEntry>,
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub notes_added: usize,
    pub problem_words: Vec<String>,
}
