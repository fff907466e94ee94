use std::collections::HashSet;

use crate::{
    anki::{
        build_note,
        NoteInput,
        SYNC_TAG,
    },
    core::{
        models::{
            RetrievedVocabulary,
            SyncResult,
            TranslationMap,
            VocabularyEntry,
        },
        SyncError,
    },
};

/// Bulk-translation requests are capped at this many words per call. Chunk
/// boundaries never change the final result, only the request sizes.
pub const WORD_CHUNK_SIZE: usize = 50;

const ADD_STATUS_TEMPLATE: &str = "Importing from Duolingo: {} of {} complete.";

/// Remote vocabulary service. One authenticated session per sync run.
#[allow(async_fn_in_trait)]
pub trait VocabularyService {
    /// Single attempt, no retry. Credential rejections map to
    /// `SyncError::LoginFailed`, unreachable hosts to `SyncError::Connection`.
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SyncError>;

    /// Returns the language display name and the full current vocabulary list.
    async fn fetch_vocabulary(&mut self) -> Result<(String, Vec<VocabularyEntry>), SyncError>;

    /// One bulk lookup for a chunk of words. Missing or empty values are
    /// allowed; the importer falls back per word.
    async fn fetch_translations(&self, words: &[String]) -> Result<TranslationMap, SyncError>;

    /// Fallback lookup by external identifier.
    async fn fetch_definition_by_id(&self, lexeme_id: &str) -> Result<Vec<String>, SyncError>;
}

/// The host application's note collection.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn list_existing_identifiers(&self, tag: &str) -> Result<HashSet<String>, SyncError>;

    /// Ok(false) means the store rejected the note; the run continues and the
    /// word is reported in the end-of-run summary.
    async fn create_record(&mut self, note: NoteInput) -> Result<bool, SyncError>;
}

/// Receives progress snapshots from a worker thread. The integration layer is
/// responsible for marshalling onto a UI thread if it has one.
pub trait ProgressObserver {
    fn update(&self, label: &str, current: usize, total: usize);
}

/// Entries from the remote list whose identifier is not yet known locally,
/// in the remote listing order.
pub fn diff_new_entries(
    known: &HashSet<String>,
    entries: Vec<VocabularyEntry>,
) -> Vec<VocabularyEntry> {
    entries.into_iter().filter(|entry| !known.contains(&entry.id)).collect()
}

/// Fetch + diff stage: log in, pull the vocabulary overview, and drop every
/// entry already present in the store. The known-identifier set is queried
/// once per run, before the loop.
pub async fn retrieve_new_words<S, R, P>(
    service: &mut S,
    store: &R,
    observer: &P,
    username: &str,
    password: &str,
) -> Result<RetrievedVocabulary, SyncError>
where
    S: VocabularyService,
    R: RecordStore,
    P: ProgressObserver,
{
    observer.update("Logging in...", 0, 0);
    service.authenticate(username, password).await?;

    observer.update("Retrieving vocabulary...", 0, 0);
    let (language, entries) = service.fetch_vocabulary().await?;

    let known = store.list_existing_identifiers(SYNC_TAG).await?;
    let new_entries = diff_new_entries(&known, entries);

    Ok(RetrievedVocabulary { language, new_entries })
}

/// Import stage: resolve translations chunk by chunk, create one note per
/// entry, and keep going past store rejections. Progress is reported after
/// every entry.
pub async fn import_vocabulary<S, R, P>(
    service: &S,
    store: &mut R,
    observer: &P,
    entries: &[VocabularyEntry],
    language: &str,
    chunk_size: usize,
) -> Result<SyncResult, SyncError>
where
    S: VocabularyService,
    R: RecordStore,
    P: ProgressObserver,
{
    let total = entries.len();
    let mut result = SyncResult::default();
    let mut processed = 0;

    for chunk in entries.chunks(chunk_size.max(1)) {
        let words: Vec<String> = chunk.iter().map(|vocab| vocab.word_string.clone()).collect();
        let translations = service.fetch_translations(&words).await?;

        for vocab in chunk {
            let resolved = match translations.get(&vocab.word_string) {
                Some(list) if !list.is_empty() => list.clone(),
                _ => resolve_fallback(service, vocab).await,
            };

            let note = build_note(vocab, &resolved, language);

            if store.create_record(note).await? {
                result.notes_added += 1;
            } else {
                result.problem_words.push(vocab.word_string.clone());
            }

            processed += 1;
            observer.update(
                &status_label(result.notes_added, total),
                processed,
                total,
            );
        }
    }

    Ok(result)
}

/// The bulk endpoint does not always return a translation. Try the definition
/// lookup, and when that errors or comes back empty too, substitute an
/// editable placeholder. Nothing raises past this point.
async fn resolve_fallback<S: VocabularyService>(
    service: &S,
    vocab: &VocabularyEntry,
) -> Vec<String> {
    match service.fetch_definition_by_id(&vocab.id).await {
        Ok(translations) if !translations.is_empty() => translations,
        _ => {
            vec![format!(
                "Translation not found for '{}'. Edit this card to add it.",
                vocab.word_string
            )]
        }
    }
}

fn status_label(added: usize, total: usize) -> String {
    ADD_STATUS_TEMPLATE
        .replacen("{}", &added.to_string(), 1)
        .replacen("{}", &total.to_string(), 1)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::Mutex,
    };

    use super::*;

    fn entry(id: &str, word: &str) -> VocabularyEntry {
        VocabularyEntry {
            id: id.to_string(),
            word_string: word.to_string(),
            normalized_string: word.to_string(),
            gender: None,
            pos: None,
            skill: None,
        }
    }

    #[derive(Default)]
    struct FakeService {
        language: String,
        vocab: Vec<VocabularyEntry>,
        translations: TranslationMap,
        definitions: HashMap<String, Vec<String>>,
        fail_auth: bool,
        fail_definitions: bool,
    }

    impl VocabularyService for FakeService {
        async fn authenticate(&mut self, _username: &str, _password: &str) -> Result<(), SyncError> {
            if self.fail_auth {
                return Err(SyncError::LoginFailed);
            }
            Ok(())
        }

        async fn fetch_vocabulary(
            &mut self,
        ) -> Result<(String, Vec<VocabularyEntry>), SyncError> {
            Ok((self.language.clone(), self.vocab.clone()))
        }

        async fn fetch_translations(&self, words: &[String]) -> Result<TranslationMap, SyncError> {
            Ok(words
                .iter()
                .map(|word| {
                    (word.clone(), self.translations.get(word).cloned().unwrap_or_default())
                })
                .collect())
        }

        async fn fetch_definition_by_id(&self, lexeme_id: &str) -> Result<Vec<String>, SyncError> {
            if self.fail_definitions {
                return Err(SyncError::Custom("definition lookup failed".to_string()));
            }
            Ok(self.definitions.get(lexeme_id).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        existing: HashSet<String>,
        created: Vec<NoteInput>,
        reject_words: HashSet<String>,
        fail_listing: bool,
    }

    impl RecordStore for MemoryStore {
        async fn list_existing_identifiers(
            &self,
            _tag: &str,
        ) -> Result<HashSet<String>, SyncError> {
            if self.fail_listing {
                return Err(SyncError::AnkiConnect("collection is not available".to_string()));
            }
            Ok(self.existing.clone())
        }

        async fn create_record(&mut self, note: NoteInput) -> Result<bool, SyncError> {
            if self.reject_words.contains(&note.fields["Target"]) {
                return Ok(false);
            }
            self.created.push(note);
            Ok(true)
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        updates: Mutex<Vec<(String, usize, usize)>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn update(&self, label: &str, current: usize, total: usize) {
            self.updates.lock().unwrap().push((label.to_string(), current, total));
        }
    }

    #[test]
    fn diff_filters_known_ids_and_preserves_order() {
        let known: HashSet<String> = ["b".to_string()].into_iter().collect();
        let remote = vec![entry("a", "uno"), entry("b", "dos"), entry("c", "tres")];

        let new_entries = diff_new_entries(&known, remote);

        let ids: Vec<&str> = new_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn diff_of_empty_remote_list_is_empty() {
        let known: HashSet<String> = ["a".to_string()].into_iter().collect();

        assert!(diff_new_entries(&known, Vec::new()).is_empty());
    }

    #[test]
    fn diff_is_idempotent() {
        let known: HashSet<String> = HashSet::new();
        let remote = vec![entry("a", "uno"), entry("b", "dos")];

        let first = diff_new_entries(&known, remote.clone());
        let after_import: HashSet<String> = first.iter().map(|e| e.id.clone()).collect();

        assert!(diff_new_entries(&after_import, remote).is_empty());
    }

    #[tokio::test]
    async fn import_result_is_chunk_size_invariant() {
        let entries: Vec<VocabularyEntry> =
            (0..7).map(|i| entry(&format!("id{}", i), &format!("word{}", i))).collect();

        let mut service = FakeService::default();
        for e in &entries {
            service.translations.insert(e.word_string.clone(), vec!["t".to_string()]);
        }

        let mut results = Vec::new();
        for chunk_size in [1, 2, 3, 50] {
            let mut store = MemoryStore::default();
            store.reject_words.insert("word4".to_string());
            let observer = RecordingObserver::default();

            let result = import_vocabulary(
                &service,
                &mut store,
                &observer,
                &entries,
                "Spanish",
                chunk_size,
            )
            .await
            .unwrap();
            results.push(result);
        }

        for result in &results {
            assert_eq!(result, &results[0]);
            assert_eq!(result.notes_added, 6);
            assert_eq!(result.problem_words, vec!["word4".to_string()]);
        }
    }

    #[tokio::test]
    async fn empty_bulk_translation_falls_back_to_definition() {
        let entries = vec![entry("lex1", "gato")];

        let mut service = FakeService::default();
        service.definitions.insert("lex1".to_string(), vec!["foo".to_string()]);

        let mut store = MemoryStore::default();
        let observer = RecordingObserver::default();

        import_vocabulary(&service, &mut store, &observer, &entries, "Spanish", WORD_CHUNK_SIZE)
            .await
            .unwrap();

        assert_eq!(store.created[0].fields["Source"], "foo");
    }

    #[tokio::test]
    async fn failed_fallback_substitutes_placeholder() {
        let entries = vec![entry("lex1", "gato")];

        let mut service = FakeService::default();
        service.fail_definitions = true;

        let mut store = MemoryStore::default();
        let observer = RecordingObserver::default();

        let result = import_vocabulary(
            &service,
            &mut store,
            &observer,
            &entries,
            "Spanish",
            WORD_CHUNK_SIZE,
        )
        .await
        .unwrap();

        assert_eq!(result.notes_added, 1);
        assert_eq!(
            store.created[0].fields["Source"],
            "Translation not found for 'gato'. Edit this card to add it."
        );
    }

    #[tokio::test]
    async fn empty_fallback_also_substitutes_placeholder() {
        let entries = vec![entry("lex1", "gato")];

        let service = FakeService::default();
        let mut store = MemoryStore::default();
        let observer = RecordingObserver::default();

        import_vocabulary(&service, &mut store, &observer, &entries, "Spanish", WORD_CHUNK_SIZE)
            .await
            .unwrap();

        assert_eq!(
            store.created[0].fields["Source"],
            "Translation not found for 'gato'. Edit this card to add it."
        );
    }

    #[tokio::test]
    async fn rejected_note_is_skipped_and_run_continues() {
        let entries = vec![entry("a", "uno"), entry("b", "dos"), entry("c", "tres")];

        let mut service = FakeService::default();
        for e in &entries {
            service.translations.insert(e.word_string.clone(), vec!["t".to_string()]);
        }

        let mut store = MemoryStore::default();
        store.reject_words.insert("dos".to_string());
        let observer = RecordingObserver::default();

        let result = import_vocabulary(
            &service,
            &mut store,
            &observer,
            &entries,
            "Spanish",
            WORD_CHUNK_SIZE,
        )
        .await
        .unwrap();

        assert_eq!(result.notes_added, 2);
        assert_eq!(result.problem_words, vec!["dos".to_string()]);
        assert_eq!(store.created.len(), 2);
    }

    #[tokio::test]
    async fn end_to_end_skips_known_entry_and_reports_progress() {
        let mut service = FakeService {
            language: "French".to_string(),
            vocab: vec![entry("a", "un"), entry("b", "deux"), entry("c", "trois")],
            ..FakeService::default()
        };
        for word in ["un", "deux", "trois"] {
            service.translations.insert(word.to_string(), vec!["x".to_string()]);
        }

        let mut store = MemoryStore::default();
        store.existing.insert("a".to_string());

        let retrieve_observer = RecordingObserver::default();
        let retrieved =
            retrieve_new_words(&mut service, &store, &retrieve_observer, "user", "pass")
                .await
                .unwrap();

        assert_eq!(retrieved.language, "French");
        assert_eq!(retrieved.new_entries.len(), 2);

        let import_observer = RecordingObserver::default();
        let result = import_vocabulary(
            &service,
            &mut store,
            &import_observer,
            &retrieved.new_entries,
            &retrieved.language,
            WORD_CHUNK_SIZE,
        )
        .await
        .unwrap();

        assert_eq!(result, SyncResult { notes_added: 2, problem_words: Vec::new() });

        let updates = import_observer.updates.lock().unwrap();
        let counts: Vec<(usize, usize)> = updates.iter().map(|(_, c, t)| (*c, *t)).collect();
        assert_eq!(counts, vec![(1, 2), (2, 2)]);
        assert_eq!(updates[1].0, "Importing from Duolingo: 2 of 2 complete.");
    }

    #[tokio::test]
    async fn failed_identifier_listing_aborts_instead_of_treating_all_as_new() {
        let mut service = FakeService {
            language: "French".to_string(),
            vocab: vec![entry("a", "un"), entry("b", "deux")],
            ..FakeService::default()
        };

        let store = MemoryStore { fail_listing: true, ..MemoryStore::default() };
        let observer = RecordingObserver::default();

        let result = retrieve_new_words(&mut service, &store, &observer, "user", "pass").await;

        // A broken known-id query must abort the run; an empty set here would
        // make every remote entry look new and re-import the whole list.
        assert!(matches!(result, Err(SyncError::AnkiConnect(_))));
        assert!(store.created.is_empty());
    }

    #[tokio::test]
    async fn auth_failure_terminates_before_any_import_work() {
        let mut service = FakeService { fail_auth: true, ..FakeService::default() };
        let store = MemoryStore::default();
        let observer = RecordingObserver::default();

        let result = retrieve_new_words(&mut service, &store, &observer, "user", "bad").await;

        assert!(matches!(result, Err(SyncError::LoginFailed)));
        assert!(store.created.is_empty());

        // Only the login label, no importer-stage updates.
        let updates = observer.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "Logging in...");
    }
}
