use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::{ChatMessage, LlmProvider};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    /// Per-session chat history, kept in memory only. The booking engine
    /// reads from the database; conversation transcripts do not need to
    /// survive a restart.
    pub chat_sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
}
