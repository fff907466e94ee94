pub mod errors;
pub mod models;
pub mod pipeline;
pub mod tasks;

pub use errors::SyncError;
pub use models::{ RetrievedVocabulary, SyncResult, TranslationMap, VocabularyEntry };
