use std::io::{
    self,
    BufRead,
    Write,
};

use duosync::{
    core::tasks::{
        SyncSession,
        TaskManager,
        TaskResult,
    },
    persistence,
};

fn main() {
    persistence::ensure_settings_file();
    let settings = persistence::load_settings();

    let Some((username, password)) = read_credentials() else {
        return;
    };

    let manager = TaskManager::new();
    if !manager.start_retrieve(username, password, settings) {
        eprintln!("A sync is already running.");
        return;
    }

    let session = loop {
        match manager.recv_result() {
            Some(TaskResult::Progress { label, .. }) => println!("{}", label),
            Some(TaskResult::RetrieveComplete(result)) => break result,
            Some(TaskResult::SyncComplete(_)) | None => return,
        }
    };

    let session = match session {
        Ok(session) => session,
        Err(message) => {
            eprintln!("{}", message);
            return;
        }
    };

    if session.new_entries.is_empty() {
        println!(
            "Successfully logged in to Duolingo, but no new words found in {} language.",
            session.language
        );
        return;
    }

    let question =
        format!("Add {} notes from {} language?", session.new_entries.len(), session.language);
    if !confirm(&question) {
        return;
    }

    run_import(&manager, session);
}

fn run_import(manager: &TaskManager, session: SyncSession) {
    if !manager.start_import(session) {
        eprintln!("A sync is already running.");
        return;
    }

    loop {
        match manager.recv_result() {
            Some(TaskResult::Progress { label, .. }) => {
                print!("\r{}", label);
                let _ = io::stdout().flush();
            }
            Some(TaskResult::SyncComplete(result)) => {
                println!();
                match result {
                    Ok(sync_result) => {
                        let mut message = format!("{} notes added.", sync_result.notes_added);
                        if !sync_result.problem_words.is_empty() {
                            message += &format!(
                                " Failed to add: {}",
                                sync_result.problem_words.join(", ")
                            );
                        }
                        println!("{}", message);
                    }
                    Err(message) => eprintln!("{}", message),
                }
                return;
            }
            Some(TaskResult::RetrieveComplete(_)) | None => return,
        }
    }
}

// Credentials come from the environment when set, otherwise from a prompt.
// They are never written to disk.
fn read_credentials() -> Option<(String, String)> {
    let username = match std::env::var("DUOLINGO_USERNAME") {
        Ok(username) => username,
        Err(_) => prompt("Duolingo username: ")?,
    };

    let password = match std::env::var("DUOLINGO_PASSWORD") {
        Ok(password) => password,
        Err(_) => prompt("Duolingo password: ")?,
    };

    if username.is_empty() || password.is_empty() {
        eprintln!("A Duolingo username and password are required.");
        return None;
    }

    Some((username, password))
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    Some(line.trim().to_string())
}

fn confirm(question: &str) -> bool {
    match prompt(&format!("{} [y/N] ", question)) {
        Some(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
        None => false,
    }
}
