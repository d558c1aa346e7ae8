//! Per-session discovery state.
//!
//! A session holds the latest curated tools and the chat transcript. Each
//! search takes a ticket from a monotonically increasing generation counter;
//! results are applied only if no newer search has started since, so a slow
//! earlier request can never overwrite a newer one.

use crate::discovery::{Conversation, ConversationTurn, CuratedTool, DiscoveryOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Generation number handed out when a search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct SessionState {
    query: Option<String>,
    keywords: Vec<String>,
    tools: Vec<CuratedTool>,
    transcript: Vec<ConversationTurn>,
    applied: u64,
}

/// Read-only view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub query: Option<String>,
    pub generation: u64,
    pub keywords: Vec<String>,
    pub tools: Vec<CuratedTool>,
    pub transcript: Vec<ConversationTurn>,
}

/// One page of a filtered tool listing.
#[derive(Debug, Clone, Serialize)]
pub struct ToolPage {
    pub tools: Vec<CuratedTool>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Discovery state for one user session.
#[derive(Debug)]
pub struct DiscoverySession {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_active: Mutex<Instant>,
    generation: AtomicU64,
    state: RwLock<SessionState>,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_active: Mutex::new(Instant::now()),
            generation: AtomicU64::new(0),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Mark the session as used now.
    pub fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    /// Time of the last lookup through the store, or creation.
    pub fn last_active(&self) -> Instant {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a search; any earlier ticket becomes stale.
    pub fn begin_search(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// True if no newer search has started since `ticket` was issued.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Replace keywords and tools with `outcome` if `ticket` is still current.
    ///
    /// Idle outcomes leave the session unchanged. Returns whether the outcome
    /// was applied.
    pub async fn apply(&self, ticket: SearchTicket, query: &str, outcome: &DiscoveryOutcome) -> bool {
        let DiscoveryOutcome::Completed { keywords, tools, .. } = outcome else {
            return false;
        };

        let mut state = self.state.write().await;
        if !self.is_current(ticket) || ticket.0 <= state.applied {
            info!(
                "Discarding stale results for session {} (ticket {}, latest {})",
                self.id,
                ticket.0,
                self.generation.load(Ordering::SeqCst)
            );
            return false;
        }

        state.query = Some(query.trim().to_string());
        state.keywords = keywords.clone();
        state.tools = tools.clone();
        state.applied = ticket.0;
        debug!("Session {} now has {} tools", self.id, state.tools.len());
        true
    }

    /// Current curated tools.
    pub async fn tools(&self) -> Vec<CuratedTool> {
        self.state.read().await.tools.clone()
    }

    /// Current transcript.
    pub async fn transcript(&self) -> Vec<ConversationTurn> {
        self.state.read().await.transcript.clone()
    }

    /// Answer a chat message against the current tools and transcript, then
    /// append the user turn and (if non-empty) the bot turn.
    pub async fn chat(&self, conversation: &Conversation, message: &str) -> String {
        let (tools, transcript) = {
            let state = self.state.read().await;
            (state.tools.clone(), state.transcript.clone())
        };

        let reply = conversation.reply(&tools, &transcript, message).await;

        let mut state = self.state.write().await;
        state.transcript.push(ConversationTurn::user(message));
        if !reply.is_empty() {
            state.transcript.push(ConversationTurn::bot(&reply));
        }
        reply
    }

    /// Filter tools by a case-folded substring of title or summary and return one page.
    ///
    /// Linear scan; fine for the handful of tools a session holds.
    pub async fn list_tools(&self, filter: Option<&str>, page: usize, per_page: usize) -> ToolPage {
        let state = self.state.read().await;
        let needle = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty());

        let matching: Vec<&CuratedTool> = state
            .tools
            .iter()
            .filter(|t| match &needle {
                Some(n) => {
                    t.title.to_lowercase().contains(n.as_str())
                        || t.summary.to_lowercase().contains(n.as_str())
                }
                None => true,
            })
            .collect();

        let per_page = per_page.max(1);
        let page = page.max(1);
        let tools = matching
            .iter()
            .skip(page.saturating_sub(1).saturating_mul(per_page))
            .take(per_page)
            .map(|t| (*t).clone())
            .collect();

        ToolPage {
            tools,
            total: matching.len(),
            page,
            per_page,
        }
    }

    /// Drop the chat transcript, keeping the current tools.
    pub async fn clear_transcript(&self) {
        self.state.write().await.transcript.clear();
    }

    /// Clear tools, keywords and transcript. Outstanding tickets become stale.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        let applied = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *state = SessionState {
            applied,
            ..SessionState::default()
        };
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            query: state.query.clone(),
            generation: state.applied,
            keywords: state.keywords.clone(),
            tools: state.tools.clone(),
            transcript: state.transcript.clone(),
        }
    }
}

impl Default for DiscoverySession {
    fn default() -> Self {
        Self::new()
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 1000;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// In-memory registry of sessions.
///
/// Sessions idle for longer than the timeout are dropped whenever a new one
/// is created. At capacity the least recently used session makes room.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<DiscoverySession>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_limits(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    pub async fn create(&self) -> Arc<DiscoverySession> {
        let session = Arc::new(DiscoverySession::new());
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| s.last_active().elapsed() < self.idle_timeout);
        if sessions.len() < before {
            info!("Expired {} idle sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_active())
                .map(|s| s.id())
            else {
                break;
            };
            debug!("Evicting least recently used session {}", oldest);
            sessions.remove(&oldest);
        }

        sessions.insert(session.id(), session.clone());
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<DiscoverySession>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Return the session for `id`, or a new one when `id` is None.
    /// An unknown id yields None.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> Option<Arc<DiscoverySession>> {
        match id {
            Some(id) => self.get(&id).await,
            None => Some(self.create().await),
        }
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fakes::ScriptedModel;

    fn tool(title: &str, link: &str) -> CuratedTool {
        CuratedTool {
            title: title.to_string(),
            summary: format!("{} summary", title),
            tool_link: link.to_string(),
            video_link: "https://www.youtube.com/watch?v=abcdefghijk".to_string(),
            description: None,
            url: None,
        }
    }

    fn completed(tools: Vec<CuratedTool>) -> DiscoveryOutcome {
        DiscoveryOutcome::Completed {
            keywords: vec!["kw".to_string()],
            candidates: Vec::new(),
            tools,
        }
    }

    #[tokio::test]
    async fn test_stale_results_are_discarded() {
        let session = DiscoverySession::new();
        let first = session.begin_search();
        let second = session.begin_search();
        assert!(second > first);

        assert!(session.apply(second, "new", &completed(vec![tool("New", "https://new.ai")])).await);
        assert!(!session.apply(first, "old", &completed(vec![tool("Old", "https://old.ai")])).await);

        let tools = session.tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].title, "New");
    }

    #[tokio::test]
    async fn test_older_ticket_finishing_first_is_still_stale() {
        let session = DiscoverySession::new();
        let first = session.begin_search();
        let _second = session.begin_search();

        assert!(!session.apply(first, "old", &completed(vec![tool("Old", "https://old.ai")])).await);
        assert!(session.tools().await.is_empty());
    }

    #[tokio::test]
    async fn test_idle_outcome_leaves_state() {
        let session = DiscoverySession::new();
        let ticket = session.begin_search();
        session.apply(ticket, "q", &completed(vec![tool("Kept", "https://kept.ai")])).await;

        let idle_ticket = session.begin_search();
        assert!(!session.apply(idle_ticket, "", &DiscoveryOutcome::Idle).await);
        assert_eq!(session.tools().await[0].title, "Kept");
    }

    #[tokio::test]
    async fn test_chat_appends_turns_in_order() {
        let model = Arc::new(
            ScriptedModel::new()
                .with_reply("Use Remove.bg.")
                .with_reply("Yes, there is a free tier."),
        );
        let conversation = Conversation::new(model.clone());
        let session = DiscoverySession::new();
        let ticket = session.begin_search();
        session
            .apply(ticket, "q", &completed(vec![tool("Remove.bg", "https://remove.bg")]))
            .await;

        session.chat(&conversation, "Which one removes backgrounds?").await;
        session.chat(&conversation, "Is it free?").await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[3], ConversationTurn::bot("Yes, there is a free tier."));

        let second_prompt = &model.calls()[1].prompt;
        assert_eq!(
            second_prompt,
            "User: Which one removes backgrounds?\nBot: Use Remove.bg.\nUser: Is it free?"
        );
    }

    #[tokio::test]
    async fn test_failed_reply_records_only_user_turn() {
        let conversation = Conversation::new(Arc::new(ScriptedModel::new()));
        let session = DiscoverySession::new();

        let reply = session.chat(&conversation, "hello?").await;

        assert!(reply.is_empty());
        assert_eq!(session.transcript().await, vec![ConversationTurn::user("hello?")]);
    }

    #[tokio::test]
    async fn test_list_tools_filters_and_paginates() {
        let session = DiscoverySession::new();
        let ticket = session.begin_search();
        let tools = vec![
            tool("Remove.bg", "https://remove.bg"),
            tool("Photoroom", "https://photoroom.com"),
            tool("Runway", "https://runwayml.com"),
        ];
        session.apply(ticket, "q", &completed(tools)).await;

        let page = session.list_tools(Some("PHOTO"), 1, 10).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.tools[0].title, "Photoroom");

        let page = session.list_tools(None, 2, 2).await;
        assert_eq!(page.total, 3);
        assert_eq!(page.tools.len(), 1);
        assert_eq!(page.tools[0].title, "Runway");

        let page = session.list_tools(Some("  "), 0, 0).await;
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_list_tools_huge_page_is_empty() {
        let session = DiscoverySession::new();
        let ticket = session.begin_search();
        session
            .apply(ticket, "q", &completed(vec![tool("Remove.bg", "https://remove.bg")]))
            .await;

        let page = session.list_tools(None, usize::MAX, 2).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.page, usize::MAX);
        assert!(page.tools.is_empty());

        let page = session.list_tools(None, 2, usize::MAX).await;
        assert!(page.tools.is_empty());
    }

    #[tokio::test]
    async fn test_reset_invalidates_tickets() {
        let session = DiscoverySession::new();
        let ticket = session.begin_search();
        session.reset().await;
        assert!(!session.apply(ticket, "q", &completed(vec![tool("A", "https://a.ai")])).await);
        assert!(session.snapshot().await.tools.is_empty());
    }

    #[tokio::test]
    async fn test_store_get_or_create() {
        let store = SessionStore::new();
        let created = store.get_or_create(None).await.unwrap();
        let fetched = store.get_or_create(Some(created.id())).await.unwrap();
        assert_eq!(created.id(), fetched.id());
        assert!(store.get_or_create(Some(Uuid::new_v4())).await.is_none());
        assert_eq!(store.len().await, 1);
        assert!(store.remove(&created.id()).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_evicts_least_recently_used() {
        let store = SessionStore::with_limits(2, Duration::from_secs(3600));
        let first = store.create().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = store.create().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get(&first.id()).await.is_some());
        tokio::time::advance(Duration::from_secs(1)).await;

        let third = store.create().await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first.id()).await.is_some());
        assert!(store.get(&second.id()).await.is_none());
        assert!(store.get(&third.id()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_expires_idle_sessions() {
        let store = SessionStore::with_limits(10, Duration::from_secs(60));
        let idle = store.create().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let recent = store.create().await;
        tokio::time::advance(Duration::from_secs(31)).await;

        store.create().await;

        assert!(store.get(&idle.id()).await.is_none());
        assert!(store.get(&recent.id()).await.is_some());
        assert_eq!(store.len().await, 2);
    }
}
