//! Email one-time-passcode login.
//!
//! Two steps: request a code for an email address, then exchange the code
//! for the user record. Only a successful verification creates a session.
use api_types::auth::{OtpRequest, OtpVerify, UserRecord};

use crate::{
    EngineError,
    backend::AuthApi,
    guard::SubmitGuard,
    session::{Route, SessionContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Request,
    Verify,
}

#[derive(Debug, Clone)]
pub struct LoginFlow {
    step: LoginStep,
    pub email: String,
    pub otp: String,
    guard: SubmitGuard,
    message: Option<String>,
}

impl LoginFlow {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            step: LoginStep::Request,
            email: email.into(),
            otp: String::new(),
            guard: SubmitGuard::default(),
            message: None,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn route(&self) -> Route {
        match self.step {
            LoginStep::Request => Route::Login,
            LoginStep::Verify => Route::VerifyOtp,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Back to the email step, e.g. to fix a typo.
    pub fn restart(&mut self) {
        self.step = LoginStep::Request;
        self.otp.clear();
        self.message = None;
    }

    pub fn begin_request(&mut self) -> Result<OtpRequest, EngineError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            let err = EngineError::validation("Enter a valid email address.");
            self.message = Some(err.alert_message());
            return Err(err);
        }
        let body = OtpRequest {
            email: email.to_string(),
        };
        self.guard.try_start()?;
        Ok(body)
    }

    pub fn finish_request(&mut self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        self.guard.finish();
        match result {
            Ok(()) => {
                self.step = LoginStep::Verify;
                self.otp.clear();
                self.message = Some(format!("We sent a code to {}.", self.email.trim()));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "otp request failed");
                self.message = Some(err.alert_message());
                Err(err)
            }
        }
    }

    pub fn begin_verify(&mut self) -> Result<OtpVerify, EngineError> {
        if self.step != LoginStep::Verify {
            return Err(EngineError::validation("Request a code first."));
        }
        let otp = self.otp.trim();
        if otp.len() < 4 || otp.len() > 8 || !otp.chars().all(|c| c.is_ascii_digit()) {
            let err = EngineError::validation("The code is 4 to 8 digits.");
            self.message = Some(err.alert_message());
            return Err(err);
        }
        let body = OtpVerify {
            email: self.email.trim().to_string(),
            otp: otp.to_string(),
        };
        self.guard.try_start()?;
        Ok(body)
    }

    /// Stores the session on success and returns where to go next. On
    /// failure the flow stays on the verify step with the code cleared.
    pub fn finish_verify(
        &mut self,
        result: Result<UserRecord, EngineError>,
        sessions: &mut SessionContext,
    ) -> Result<Route, EngineError> {
        self.guard.finish();
        match result.and_then(|user| sessions.sign_in(user).map(|_| ())) {
            Ok(()) => {
                self.message = None;
                self.otp.clear();
                self.step = LoginStep::Request;
                Ok(Route::Dashboard)
            }
            Err(err) => {
                tracing::warn!(error = %err, "otp verification failed");
                self.otp.clear();
                self.message = Some(err.alert_message());
                Err(err)
            }
        }
    }

    /// Runs the request step end to end.
    pub async fn request<A: AuthApi + Sync + ?Sized>(&mut self, api: &A) -> Result<(), EngineError> {
        let body = self.begin_request()?;
        let result = api.request_login_otp(&body).await.map_err(EngineError::from);
        self.finish_request(result)
    }

    /// Runs the verify step end to end.
    pub async fn verify<A: AuthApi + Sync + ?Sized>(
        &mut self,
        api: &A,
        sessions: &mut SessionContext,
    ) -> Result<Route, EngineError> {
        let body = self.begin_verify()?;
        let result = api.verify_login_otp(&body).await.map_err(EngineError::from);
        self.finish_verify(result, sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_must_look_like_an_address() {
        let mut flow = LoginFlow::new("farmer");
        assert!(flow.begin_request().is_err());
        assert!(!flow.is_busy());
        assert!(flow.message().is_some());
    }

    #[test]
    fn request_success_moves_to_verify() {
        let mut flow = LoginFlow::new(" a@b.com ");
        let body = flow.begin_request().unwrap();
        assert_eq!(body.email, "a@b.com");
        flow.finish_request(Ok(())).unwrap();
        assert_eq!(flow.step(), LoginStep::Verify);
        assert_eq!(flow.route(), Route::VerifyOtp);
    }

    #[test]
    fn code_format_is_checked_before_sending() {
        let mut flow = LoginFlow::new("a@b.com");
        flow.begin_request().unwrap();
        flow.finish_request(Ok(())).unwrap();
        flow.otp = "12a4".to_string();
        assert!(flow.begin_verify().is_err());
        flow.otp = "123456".to_string();
        assert_eq!(flow.begin_verify().unwrap().otp, "123456");
    }

    #[test]
    fn restart_returns_to_email_step() {
        let mut flow = LoginFlow::new("a@b.com");
        flow.begin_request().unwrap();
        flow.finish_request(Ok(())).unwrap();
        flow.restart();
        assert_eq!(flow.step(), LoginStep::Request);
        assert_eq!(flow.email, "a@b.com");
    }
}
