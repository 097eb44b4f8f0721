mod apply;
pub mod events;
mod fetch;
pub mod forms;
mod keys;
pub mod state;

use std::{future::Future, time::Duration};

use crossterm::event::{self, Event};
use engine::{
    EngineError, HttpBackend, Route, SessionContext, auth::LoginFlow, session::resolve,
};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    time::Instant,
};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    ui,
};

pub use events::AppEvent;
pub use state::{AppState, ToastLevel, ToastState, Workspace};

const TICK_RATE: Duration = Duration::from_millis(50);

pub struct App {
    config: AppConfig,
    backend: HttpBackend,
    sessions: SessionContext,
    pub state: AppState,
    events_tx: UnboundedSender<(u64, AppEvent)>,
    events_rx: UnboundedReceiver<(u64, AppEvent)>,
    /// Bumped on sign-out so answers for a previous session are dropped.
    generation: u64,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let timezone = config.timezone()?;
        let sessions = SessionContext::load(&config.state_path)?;
        let token = sessions
            .session()
            .and_then(|s| s.token())
            .map(str::to_string);
        let backend =
            HttpBackend::new(&config.base_url, config.request_timeout())?.with_token(token);
        let workspace = sessions
            .session()
            .cloned()
            .map(|session| Workspace::new(session, &config, config.otp_policy()));
        let (events_tx, events_rx) = unbounded_channel();

        let state = AppState {
            route: resolve(Route::Root, sessions.session()),
            theme: sessions.theme(),
            login: LoginFlow::new(""),
            workspace,
            toast: None,
            alert: None,
            base_url: config.base_url.clone(),
            timezone,
        };

        Ok(Self {
            config,
            backend,
            sessions,
            state,
            events_tx,
            events_rx,
            generation: 0,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        self.navigate(self.state.route);

        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            while let Ok((generation, event)) = self.events_rx.try_recv() {
                if generation == self.generation {
                    self.apply_event(event);
                } else {
                    tracing::debug!(?event, "dropping answer for a previous session");
                }
            }
            self.on_tick(Instant::now());
            tokio::task::yield_now().await;
        }

        tracing::info!("shutting down");
        Ok(())
    }

    /// Runs a backend call off the UI loop; its result comes back as an event.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            // The receiver only goes away on shutdown.
            let _ = tx.send((generation, task.await));
        });
    }

    fn notify(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + state::TOAST_TTL,
        });
    }

    /// Logs the failure and raises the blocking alert. An expired session also
    /// signs the user out.
    fn fail(&mut self, err: EngineError) {
        tracing::warn!(kind = ?err.kind(), error = %err, "action failed");
        if err.is_unauthorized() {
            self.drop_session();
        }
        self.state.alert = Some(err.alert_message());
    }

    fn navigate(&mut self, requested: Route) {
        let route = resolve(requested, self.sessions.session());
        if route != requested {
            tracing::debug!(from = requested.path(), to = route.path(), "route redirected");
        }
        self.state.route = route;
        let first_visit = self
            .state
            .workspace
            .as_mut()
            .is_some_and(|ws| ws.first_visit(route));
        if first_visit {
            self.load_route(route);
        }
    }

    fn signed_in(&mut self) {
        let Some(session) = self.sessions.session().cloned() else {
            return;
        };
        self.backend = self
            .backend
            .clone()
            .with_token(session.token().map(str::to_string));
        self.state.workspace = Some(Workspace::new(
            session,
            &self.config,
            self.config.otp_policy(),
        ));
        self.navigate(Route::Dashboard);
    }

    fn logout(&mut self) {
        tracing::info!("logout requested");
        self.drop_session();
        self.notify("Signed out.", ToastLevel::Info);
    }

    /// Forgets the session in memory and on disk and returns to `Login`.
    fn drop_session(&mut self) {
        if let Err(err) = self.sessions.sign_out() {
            tracing::error!(error = %err, "could not clear stored session");
        }
        self.generation += 1;
        self.backend = self.backend.clone().with_token(None);
        self.state.workspace = None;
        self.state.login = LoginFlow::new("");
        self.state.route = Route::Login;
    }

    fn toggle_theme(&mut self) {
        let theme = self.state.theme.toggled();
        match self.sessions.set_theme(theme) {
            Ok(()) => self.state.theme = theme,
            Err(err) => self.fail(err),
        }
    }

    fn on_tick(&mut self, now: Instant) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.state.toast = None;
        }
        self.poll_searches(now);
    }
}
