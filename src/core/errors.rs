use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Duolingo rejected the supplied credentials")]
    LoginFailed,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    #[error("SyncError: {0}")]
    Custom(String),
}

impl SyncError {
    /// Message shown to the user when a sync stage aborts. Credential and
    /// connectivity failures get actionable text instead of the raw error.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::LoginFailed => "Logging in to Duolingo failed. Please check your Duolingo \
                                       credentials.\n\nHaving trouble logging in? You must use your \
                                       Duolingo username and password. You can't use your Google or \
                                       Facebook credentials, even if that's what you use to sign in \
                                       to Duolingo.\n\nYou can find your Duolingo username at \
                                       https://www.duolingo.com/settings and you can create or set \
                                       your Duolingo password at \
                                       https://www.duolingo.com/settings/password."
                .to_string(),
            SyncError::Connection(_) => {
                "Could not connect. Please check your internet connection and that Anki is running \
                 with AnkiConnect."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            SyncError::Connection(error.to_string())
        } else {
            SyncError::Reqwest(Box::new(error))
        }
    }
}
