use std::{
    collections::HashMap,
    time::Duration,
};

use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::SyncError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Field {
    pub value: String,
    order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    note_id: u64,
    pub tags: Vec<String>,
    pub fields: HashMap<String, Field>,
    pub model_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T: Default> ApiResponse<T> {
    /// An error string from AnkiConnect aborts the call; swallowing it would
    /// hand the caller an empty default where real data was expected.
    pub fn into_result(self) -> Result<T, SyncError> {
        if let Some(error) = self.error {
            return Err(SyncError::AnkiConnect(error));
        }
        Ok(self.result.unwrap_or_default())
    }
}

/// Thin client for the AnkiConnect JSON API (action/version/params envelope).
#[derive(Debug, Clone)]
pub struct AnkiClient {
    http: Client,
    endpoint: String,
}

impl AnkiClient {
    pub fn new(endpoint: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http, endpoint: endpoint.to_string() }
    }

    async fn request<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, SyncError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number((6).into()));

        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        let response: ApiResponse<T> =
            self.http.post(&self.endpoint).json(&body).send().await?.json().await?;

        Ok(response)
    }

    // Used to check that AnkiConnect is reachable before a run.
    pub async fn version(&self) -> Result<u32, SyncError> {
        let response: ApiResponse<u32> = self.request("version", None).await?;

        response.into_result()
    }

    pub async fn find_notes(&self, query: &str) -> Result<Vec<u64>, SyncError> {
        let params = serde_json::json!({ "query": query });
        let response: ApiResponse<Vec<u64>> = self.request("findNotes", Some(params)).await?;
        response.into_result()
    }

    pub async fn notes_info(&self, note_ids: Vec<u64>) -> Result<Vec<NoteInfo>, SyncError> {
        let params = serde_json::json!({ "notes": note_ids });
        let response: ApiResponse<Vec<NoteInfo>> = self.request("notesInfo", Some(params)).await?;
        response.into_result()
    }

    pub async fn deck_names_and_ids(&self) -> Result<HashMap<String, u64>, SyncError> {
        let response: ApiResponse<HashMap<String, u64>> =
            self.request("deckNamesAndIds", None).await?;
        response.into_result()
    }

    pub async fn create_deck(&self, name: &str) -> Result<(), SyncError> {
        let params = serde_json::json!({ "deck": name });
        let response: ApiResponse<u64> = self.request("createDeck", Some(params)).await?;

        match response.error {
            Some(error) => Err(SyncError::AnkiConnect(error)),
            None => Ok(()),
        }
    }

    pub async fn model_names_and_ids(&self) -> Result<HashMap<String, u64>, SyncError> {
        let response: ApiResponse<HashMap<String, u64>> =
            self.request("modelNamesAndIds", None).await?;
        response.into_result()
    }

    pub async fn create_model(&self, model: serde_json::Value) -> Result<(), SyncError> {
        let response: ApiResponse<serde_json::Value> =
            self.request("createModel", Some(model)).await?;

        match response.error {
            Some(error) => Err(SyncError::AnkiConnect(error)),
            None => Ok(()),
        }
    }

    /// Returns the new note id, or None when the collection rejected the note
    /// (AnkiConnect reports that as a null result plus an error string).
    pub async fn add_note(&self, note: serde_json::Value) -> Result<Option<u64>, SyncError> {
        let params = serde_json::json!({ "note": note });
        let response: ApiResponse<u64> = self.request("addNote", Some(params)).await?;

        if response.error.is_some() {
            eprintln!("AnkiConnect rejected note: {:?}", response.error);
        }

        Ok(response.result)
    }
}
