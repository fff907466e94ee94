use std::collections::{
    HashMap,
    HashSet,
};

use api::AnkiClient;

use crate::{
    core::{
        pipeline::RecordStore,
        SyncError,
        VocabularyEntry,
    },
    persistence::SyncSettings,
};

pub mod api;

/// Marker tag carried by every note this tool creates. The diff stage keys off
/// notes with this tag.
pub const SYNC_TAG: &str = "duolingo_sync";

/// First field of the note type; holds the external identifier used for
/// deduplication.
pub const GID_FIELD: &str = "Gid";

const MODEL_FIELDS: [&str; 6] =
    ["Gid", "Gender", "Source", "Target", "Pronunciation", "Target Language"];

const MODEL_CSS: &str = ".card {\n  font-family: arial;\n  font-size: 20px;\n  text-align: \
                         center;\n  color: black;\n  background-color: white;\n}";

/// Fields and tags for one note, ready to hand to the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInput {
    pub fields: HashMap<String, String>,
    pub tags: Vec<String>,
}

/// Maps one vocabulary entry onto the note layout. The translation list is
/// joined with "; " for display, the pronunciation is trimmed, and a missing
/// gender becomes an empty field rather than being omitted.
pub fn build_note(
    vocab: &VocabularyEntry,
    translations: &[String],
    language: &str,
) -> NoteInput {
    let mut fields = HashMap::new();
    fields.insert(GID_FIELD.to_string(), vocab.id.clone());
    fields.insert("Gender".to_string(), vocab.gender.clone().unwrap_or_default());
    fields.insert("Source".to_string(), translations.join("; "));
    fields.insert("Target".to_string(), vocab.word_string.clone());
    fields.insert("Pronunciation".to_string(), vocab.normalized_string.trim().to_string());
    fields.insert("Target Language".to_string(), language.to_string());

    let mut tags = vec![language.to_string(), SYNC_TAG.to_string()];

    if let Some(pos) = &vocab.pos {
        tags.push(pos.clone());
    }

    if let Some(skill) = &vocab.skill {
        tags.push(skill.replace(' ', "-"));
    }

    NoteInput { fields, tags }
}

/// Record store backed by a running Anki instance via AnkiConnect.
#[derive(Debug, Clone)]
pub struct AnkiStore {
    client: AnkiClient,
    deck_name: String,
    model_name: String,
}

impl AnkiStore {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            client: AnkiClient::new(&settings.anki_connect_url),
            deck_name: settings.deck_name.clone(),
            model_name: settings.model_name.clone(),
        }
    }

    /// Verifies AnkiConnect is reachable and creates the deck and note type
    /// when they do not exist yet.
    pub async fn ensure_setup(&self) -> Result<(), SyncError> {
        self.client.version().await?;

        let decks = self.client.deck_names_and_ids().await?;
        if !decks.contains_key(&self.deck_name) {
            self.client.create_deck(&self.deck_name).await?;
        }

        let models = self.client.model_names_and_ids().await?;
        if !models.contains_key(&self.model_name) {
            self.client.create_model(self.model_definition()).await?;
        }

        Ok(())
    }

    fn model_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "modelName": self.model_name,
            "inOrderFields": MODEL_FIELDS,
            "css": MODEL_CSS,
            "cardTemplates": [
                {
                    "Name": "Card 1",
                    "Front": "{{Target}}<br><i>{{Pronunciation}}</i>",
                    "Back": "{{FrontSide}}<hr id=answer>{{Source}}<br>{{Gender}}"
                }
            ]
        })
    }
}

impl RecordStore for AnkiStore {
    async fn list_existing_identifiers(&self, tag: &str) -> Result<HashSet<String>, SyncError> {
        let note_ids = self.client.find_notes(&format!("tag:{}", tag)).await?;

        if note_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let notes = self.client.notes_info(note_ids).await?;

        Ok(notes
            .into_iter()
            .filter_map(|note| note.fields.get(GID_FIELD).map(|field| field.value.clone()))
            .collect())
    }

    async fn create_record(&mut self, note: NoteInput) -> Result<bool, SyncError> {
        let params = serde_json::json!({
            "deckName": self.deck_name,
            "modelName": self.model_name,
            "fields": note.fields,
            "tags": note.tags,
            "options": { "allowDuplicate": false }
        });

        Ok(self.client.add_note(params).await?.is_some())
    }
}
