use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        mpsc,
        Arc,
    },
    thread,
};

use tokio::runtime::Runtime;

use super::{
    SyncSession,
    TaskResult,
};
use crate::{
    anki::AnkiStore,
    core::errors::SyncError,
    core::pipeline::{
        import_vocabulary,
        retrieve_new_words,
        ProgressObserver,
        WORD_CHUNK_SIZE,
    },
    duolingo::DuolingoClient,
    persistence::SyncSettings,
};

/// Runs sync stages on background worker threads and reports back over a
/// channel. One stage at a time; a second start call while a worker is still
/// running is refused.
pub struct TaskManager {
    runtime: Arc<Runtime>,
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
    busy: Arc<AtomicBool>,
}

impl TaskManager {
    pub fn new() -> Self {
        let runtime = Arc::new(Runtime::new().expect("Failed to create TaskManager runtime"));

        let (sender, receiver) = mpsc::channel();

        Self { runtime, receiver, sender, busy: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Blocks until the next worker message. None means every sender is gone.
    pub fn recv_result(&self) -> Option<TaskResult> {
        self.receiver.recv().ok()
    }

    fn task_context(&self) -> (mpsc::Sender<TaskResult>, Arc<Runtime>) {
        (self.sender.clone(), self.runtime.clone())
    }

    /// Stage one: log in, fetch the vocabulary, diff against the store.
    /// Ends with a `TaskResult::RetrieveComplete`.
    pub fn start_retrieve(
        &self,
        username: String,
        password: String,
        settings: SyncSettings,
    ) -> bool {
        if self.busy.swap(true, Ordering::SeqCst) {
            return false;
        }

        let (sender, runtime) = self.task_context();
        let busy = self.busy.clone();

        thread::spawn(move || {
            let observer = ChannelProgress { sender: sender.clone() };

            let result = runtime.block_on(async {
                let store = AnkiStore::new(&settings);
                store.ensure_setup().await?;

                let mut client = DuolingoClient::new();
                let retrieved =
                    retrieve_new_words(&mut client, &store, &observer, &username, &password)
                        .await?;

                Ok::<SyncSession, SyncError>(SyncSession {
                    client,
                    store,
                    language: retrieved.language,
                    new_entries: retrieved.new_entries,
                })
            });

            finish_stage(
                &sender,
                &busy,
                TaskResult::RetrieveComplete(result.map_err(|e| e.user_message())),
            );
        });

        true
    }

    /// Stage two: translate and import the confirmed entries. Ends with a
    /// `TaskResult::SyncComplete`.
    pub fn start_import(&self, session: SyncSession) -> bool {
        if self.busy.swap(true, Ordering::SeqCst) {
            return false;
        }

        let (sender, runtime) = self.task_context();
        let busy = self.busy.clone();

        thread::spawn(move || {
            let observer = ChannelProgress { sender: sender.clone() };
            let mut store = session.store;

            let result = runtime.block_on(import_vocabulary(
                &session.client,
                &mut store,
                &observer,
                &session.new_entries,
                &session.language,
                WORD_CHUNK_SIZE,
            ));

            finish_stage(
                &sender,
                &busy,
                TaskResult::SyncComplete(result.map_err(|e| e.user_message())),
            );
        });

        true
    }
}

/// Ends a worker stage. The guard must be clear before the terminal message
/// is delivered: the driver may react to the message immediately, and a still
/// set flag would refuse the next stage.
fn finish_stage(sender: &mpsc::Sender<TaskResult>, busy: &AtomicBool, result: TaskResult) {
    busy.store(false, Ordering::SeqCst);
    let _ = sender.send(result);
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

struct ChannelProgress {
    sender: mpsc::Sender<TaskResult>,
}

impl ProgressObserver for ChannelProgress {
    fn update(&self, label: &str, current: usize, total: usize) {
        let _ = self.sender.send(TaskResult::Progress {
            label: label.to_string(),
            current,
            total,
        });
    }
}
