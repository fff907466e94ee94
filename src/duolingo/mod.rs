use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::core::{
    pipeline::VocabularyService,
    SyncError,
    TranslationMap,
    VocabularyEntry,
};

const BASE_URL: &str = "https://www.duolingo.com";
const HINTS_URL: &str = "https://d2.duolingo.com/api/1/dictionary/hints";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    failure: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularyOverview {
    language_string: String,
    learning_language: String,
    from_language: String,
    vocab_overview: Vec<VocabularyEntry>,
}

#[derive(Debug, Deserialize)]
struct DictionaryPage {
    #[serde(default)]
    translations: serde_json::Value,
}

/// Authenticated Duolingo session. Language codes for the hints endpoint are
/// captured from the vocabulary overview, so `fetch_vocabulary` must run
/// before `fetch_translations`.
#[derive(Debug, Clone)]
pub struct DuolingoClient {
    http: Client,
    jwt: Option<String>,
    learning_language: Option<String>,
    from_language: Option<String>,
}

impl DuolingoClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http, jwt: None, learning_language: None, from_language: None }
    }

    fn auth_header(&self) -> Result<String, SyncError> {
        match &self.jwt {
            Some(jwt) => Ok(format!("Bearer {}", jwt)),
            None => Err(SyncError::Custom("not logged in".to_string())),
        }
    }
}

impl Default for DuolingoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VocabularyService for DuolingoClient {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), SyncError> {
        let body = serde_json::json!({ "login": username, "password": password });

        let response = self.http.post(format!("{}/login", BASE_URL)).json(&body).send().await?;

        let status = response.status();
        let jwt = response
            .headers()
            .get("jwt")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        // Rejected credentials come back as a 403 or as a "failure" body.
        let login: LoginResponse =
            response.json().await.unwrap_or(LoginResponse { failure: None, message: None });

        if status == reqwest::StatusCode::FORBIDDEN || login.failure.is_some() {
            eprintln!("Duolingo login failed: {:?} ({:?})", login.failure, login.message);
            return Err(SyncError::LoginFailed);
        }

        match jwt {
            Some(jwt) => {
                self.jwt = Some(jwt);
                Ok(())
            }
            None => Err(SyncError::LoginFailed),
        }
    }

    async fn fetch_vocabulary(&mut self) -> Result<(String, Vec<VocabularyEntry>), SyncError> {
        let auth = self.auth_header()?;

        let overview: VocabularyOverview = self
            .http
            .get(format!("{}/vocabulary/overview", BASE_URL))
            .header("Authorization", auth)
            .send()
            .await?
            .json()
            .await?;

        self.learning_language = Some(overview.learning_language);
        self.from_language = Some(overview.from_language);

        Ok((overview.language_string, overview.vocab_overview))
    }

    async fn fetch_translations(&self, words: &[String]) -> Result<TranslationMap, SyncError> {
        let (Some(learning), Some(from)) = (&self.learning_language, &self.from_language) else {
            return Err(SyncError::Custom("vocabulary not fetched yet".to_string()));
        };

        let auth = self.auth_header()?;
        let tokens = serde_json::to_string(words)?;

        let translations: TranslationMap = self
            .http
            .get(format!("{}/{}/{}", HINTS_URL, learning, from))
            .query(&[("tokens", tokens.as_str())])
            .header("Authorization", auth)
            .send()
            .await?
            .json()
            .await?;

        Ok(translations)
    }

    async fn fetch_definition_by_id(&self, lexeme_id: &str) -> Result<Vec<String>, SyncError> {
        let auth = self.auth_header()?;

        let page: DictionaryPage = self
            .http
            .get(format!("{}/api/1/dictionary_page", BASE_URL))
            .query(&[("lexeme_id", lexeme_id)])
            .header("Authorization", auth)
            .send()
            .await?
            .json()
            .await?;

        Ok(parse_translations(&page.translations))
    }
}

// The dictionary page reports translations either as a list or as one
// comma-separated string, depending on the endpoint revision.
fn parse_translations(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|item| item.to_string())
            .collect(),
        serde_json::Value::String(joined) => joined
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
