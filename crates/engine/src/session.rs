//! Session lifecycle and route guard.
//!
//! The session is an explicit value owned by the application and passed to
//! whoever needs it. It is created by a successful OTP verification, cleared
//! on logout or when the backend answers `401`, and persisted in a small JSON
//! file together with the theme preference so a restart keeps the user
//! signed in. A stored session is never validated up front.
use std::{
    fs,
    path::{Path, PathBuf},
};

use api_types::auth::{Role, UserRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserRecord,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserRecord) -> Self {
        Self {
            user,
            created_at: Utc::now(),
        }
    }

    pub fn farmer_id(&self) -> &str {
        &self.user.id
    }

    pub fn phone(&self) -> Option<&str> {
        self.user
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.user.token.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

/// Content of the local state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub theme: ThemeChoice,
}

impl LocalState {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }
}

/// Owns the session and keeps the state file in sync with it.
#[derive(Debug)]
pub struct SessionContext {
    path: PathBuf,
    state: LocalState,
}

impl SessionContext {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let state = LocalState::load(&path)?;
        if state.session.is_some() {
            tracing::info!(path = %path.display(), "restored stored session");
        }
        Ok(Self { path, state })
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session.as_ref()
    }

    pub fn require(&self) -> Result<&Session, EngineError> {
        self.session().ok_or(EngineError::NoSession)
    }

    pub fn sign_in(&mut self, user: UserRecord) -> Result<&Session, EngineError> {
        let user_id = user.id.clone();
        self.commit(LocalState {
            session: Some(Session::new(user)),
            ..self.state.clone()
        })?;
        tracing::info!(user = %user_id, "signed in");
        self.require()
    }

    /// Always forgets the in-memory session. When the cleared state cannot be
    /// written the file is removed instead, so a stale session is not restored.
    pub fn sign_out(&mut self) -> Result<(), EngineError> {
        if self.state.session.take().is_some() {
            tracing::info!("signed out");
        }
        match self.state.save(&self.path) {
            Ok(()) => Ok(()),
            Err(err) => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(remove) if remove.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(_) => Err(err),
            },
        }
    }

    pub fn theme(&self) -> ThemeChoice {
        self.state.theme
    }

    pub fn set_theme(&mut self, theme: ThemeChoice) -> Result<(), EngineError> {
        self.commit(LocalState {
            theme,
            ..self.state.clone()
        })
    }

    /// Writes `next` and adopts it only once the file holds it.
    fn commit(&mut self, next: LocalState) -> Result<(), EngineError> {
        next.save(&self.path)?;
        self.state = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    VerifyOtp,
    Dashboard,
    Products,
    Inventory,
    MarketPrices,
    Wallet,
    Loans,
    Planner,
    Diary,
    AdminGroups,
    AdminFarmers,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::VerifyOtp => "/verify-otp",
            Self::Dashboard => "/dashboard",
            Self::Products => "/products",
            Self::Inventory => "/inventory",
            Self::MarketPrices => "/market-prices",
            Self::Wallet => "/wallet",
            Self::Loans => "/loans",
            Self::Planner => "/planner",
            Self::Diary => "/diary",
            Self::AdminGroups => "/admin/groups",
            Self::AdminFarmers => "/admin/farmers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "Home",
            Self::Login => "Login",
            Self::VerifyOtp => "Verify",
            Self::Dashboard => "Dashboard",
            Self::Products => "Products",
            Self::Inventory => "Inventory",
            Self::MarketPrices => "Market",
            Self::Wallet => "Wallet",
            Self::Loans => "Loans",
            Self::Planner => "Planner",
            Self::Diary => "Diary",
            Self::AdminGroups => "Groups",
            Self::AdminFarmers => "Farmers",
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::VerifyOtp)
    }

    pub fn requires_admin(self) -> bool {
        matches!(self, Self::AdminGroups | Self::AdminFarmers)
    }
}

/// Route actually shown for a requested route.
///
/// No session: everything but the login screens goes to `Login`. With a
/// session: `Root` and the login screens go to `Dashboard`, and admin routes
/// need the admin role.
pub fn resolve(route: Route, session: Option<&Session>) -> Route {
    match session {
        None if route.is_public() => route,
        None => Route::Login,
        Some(_) if route == Route::Root || route.is_public() => Route::Dashboard,
        Some(session) if route.requires_admin() && !session.is_admin() => Route::Dashboard,
        Some(_) => route,
    }
}

#[cfg(test)]
pub(crate) fn user(id: &str, role: Role) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: None,
        phone: Some("+254700000001".to_string()),
        role,
        token: Some("token".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_users_are_sent_to_login() {
        for route in [Route::Root, Route::Dashboard, Route::Wallet, Route::AdminGroups] {
            assert_eq!(resolve(route, None), Route::Login);
        }
        assert_eq!(resolve(Route::VerifyOtp, None), Route::VerifyOtp);
    }

    #[test]
    fn signed_in_root_goes_to_dashboard() {
        let session = Session::new(user("f1", Role::Farmer));
        assert_eq!(resolve(Route::Root, Some(&session)), Route::Dashboard);
        assert_eq!(resolve(Route::Login, Some(&session)), Route::Dashboard);
        assert_eq!(resolve(Route::Products, Some(&session)), Route::Products);
    }

    #[test]
    fn admin_routes_need_admin_role() {
        let farmer = Session::new(user("f1", Role::Farmer));
        let admin = Session::new(user("a1", Role::Admin));
        assert_eq!(resolve(Route::AdminFarmers, Some(&farmer)), Route::Dashboard);
        assert_eq!(resolve(Route::AdminFarmers, Some(&admin)), Route::AdminFarmers);
    }

    #[test]
    fn session_survives_reload_and_sign_out_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/shamba.json");

        let mut ctx = SessionContext::load(&path).unwrap();
        assert!(ctx.session().is_none());
        ctx.sign_in(user("f1", Role::Farmer)).unwrap();
        ctx.set_theme(ThemeChoice::Light).unwrap();

        let mut reloaded = SessionContext::load(&path).unwrap();
        assert_eq!(reloaded.session().map(Session::farmer_id), Some("f1"));
        assert_eq!(reloaded.theme(), ThemeChoice::Light);

        reloaded.sign_out().unwrap();
        let cleared = SessionContext::load(&path).unwrap();
        assert!(cleared.session().is_none());
        assert_eq!(cleared.theme(), ThemeChoice::Light);
    }

    #[test]
    fn failed_write_leaves_user_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocker/state.json");
        let mut ctx = SessionContext::load(&path).unwrap();
        std::fs::write(dir.path().join("blocker"), "not a directory").unwrap();

        assert!(ctx.sign_in(user("f1", Role::Farmer)).is_err());
        assert!(ctx.session().is_none());
        assert_eq!(resolve(Route::Root, ctx.session()), Route::Login);

        assert!(ctx.set_theme(ThemeChoice::Light).is_err());
        assert_eq!(ctx.theme(), ThemeChoice::default());
    }

    #[test]
    fn sign_out_forgets_session_even_when_file_is_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let path = blocker.join("state.json");
        let mut ctx = SessionContext::load(&path).unwrap();
        ctx.sign_in(user("f1", Role::Farmer)).unwrap();

        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, "not a directory").unwrap();

        assert!(ctx.sign_out().is_err());
        assert!(ctx.session().is_none());
    }

    #[test]
    fn blank_phone_counts_as_missing() {
        let mut record = user("f1", Role::Farmer);
        record.phone = Some("  ".to_string());
        assert_eq!(Session::new(record).phone(), None);
    }
}
