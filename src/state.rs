use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    autosave::AutosaveHandle,
    credentials::Credentials,
    draft::DraftStore,
    gateway::{ApiClient, Backend, IdentityGateway},
    identity::{IdentityFlow, Role},
    questionnaire::SessionController,
};

pub const SESSION_COOKIE: &str = "vocared_sid";

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub drafts: Arc<dyn DraftStore>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
    pub autosave_every: Duration,
}

/// Registry entry: the session and when its browser was last heard from.
struct SessionSlot {
    session: Arc<Mutex<BrowserSession>>,
    last_seen: Instant,
}

/// The questionnaire being taken plus its timer; dropping it stops autosave.
pub struct ActiveAttempt {
    pub controller: Arc<Mutex<SessionController>>,
    _autosave: AutosaveHandle,
}

impl ActiveAttempt {
    pub fn new(controller: SessionController, autosave_every: Duration) -> Self {
        let controller = Arc::new(Mutex::new(controller));
        let autosave = AutosaveHandle::spawn(controller.clone(), autosave_every);
        Self {
            controller,
            _autosave: autosave,
        }
    }
}

/// Everything one browser owns.
pub struct BrowserSession {
    pub backend: Backend,
    pub identity: IdentityFlow,
    pub role: Option<Role>,
    pub attempt: Option<ActiveAttempt>,
    /// message shown once on the next page
    pub flash: Option<String>,
}

impl BrowserSession {
    fn new(api: &ApiClient) -> Self {
        Self {
            backend: api.for_session(Arc::new(Credentials::new())),
            identity: IdentityFlow::new(),
            role: None,
            attempt: None,
            flash: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.backend.credentials().is_authenticated()
    }

    pub fn logout(&mut self) {
        self.backend.logout();
        self.identity = IdentityFlow::new();
        self.role = None;
        self.attempt = None;
    }
}

impl AppState {
    pub fn new(api: ApiClient, drafts: Arc<dyn DraftStore>, autosave_every: Duration) -> Self {
        Self {
            api,
            drafts,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            autosave_every,
        }
    }

    /// Session for the cookie in `jar`, creating one (and the cookie) if needed.
    pub async fn session(&self, jar: CookieJar) -> (CookieJar, Arc<Mutex<BrowserSession>>) {
        let known = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok());
        if let Some(id) = known {
            if let Some(slot) = self.sessions.write().await.get_mut(&id) {
                slot.last_seen = Instant::now();
                return (jar, slot.session.clone());
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(BrowserSession::new(&self.api)));
        let slot = SessionSlot {
            session: session.clone(),
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id, slot);
        debug!(session = %id, "new browser session");

        let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        (jar.add(cookie), session)
    }

    pub async fn forget(&self, jar: &CookieJar) {
        if let Some(id) = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())
        {
            self.sessions.write().await.remove(&id);
        }
    }

    /// Drops sessions not seen for longer than `idle`, together with any
    /// attempt and autosave timer they hold. Returns how many were dropped.
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| now.duration_since(slot.last_seen) <= idle);
        let dropped = before - sessions.len();
        if dropped > 0 {
            info!(dropped, remaining = sessions.len(), "idle browser sessions expired");
        }
        dropped
    }

    /// Runs [`AppState::sweep_idle`] every quarter of `idle` until aborted.
    pub fn spawn_session_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let every = (idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + every, every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                state.sweep_idle(idle).await;
            }
        })
    }

    pub fn new_controller(&self, backend: &Backend) -> SessionController {
        SessionController::new(Arc::new(backend.clone()), self.drafts.clone())
    }
}
