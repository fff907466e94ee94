use crate::{
    anki::AnkiStore,
    core::models::{
        SyncResult,
        VocabularyEntry,
    },
    duolingo::DuolingoClient,
};

/// State carried between the retrieve and import stages: the authenticated
/// session, the store handle, and what the diff found. The caller confirms
/// with the user before handing this back for import.
#[derive(Debug, Clone)]
pub struct SyncSession {
    pub client: DuolingoClient,
    pub store: AnkiStore,
    pub language: String,
    pub new_entries: Vec<VocabularyEntry>,
}

/// Messages sent from a sync worker back to the driver. Stage errors arrive
/// already rendered as user-facing text.
#[derive(Debug, Clone)]
pub enum TaskResult {
    Progress { label: String, current: usize, total: usize },
    RetrieveComplete(Result<SyncSession, String>),
    SyncComplete(Result<SyncResult, String>),
}
