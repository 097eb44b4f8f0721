//! Wallet actions with OTP confirmation.
//!
//! Money-moving actions run in two phases. "Continue" validates the form and,
//! when the [`OtpPolicy`] asks for it, only requests a code for the
//! registered phone. Submitting the code verifies it and then issues exactly
//! one action call with the parameters captured at "Continue". Balance and
//! history are refreshed afterwards by separate calls.
use api_types::wallet::{
    MobileMoneyRequest, OtpCheck, OtpSend, PeerPayment, WalletBalance, WalletReceipt,
    WalletTransaction,
};

use crate::{
    EngineError, Money,
    backend::WalletApi,
    guard::SubmitGuard,
    listing::{Faceted, ListController},
    money::parse_whole,
    session::Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    Deposit,
    Withdraw,
    Transfer,
    Pay,
}

impl WalletAction {
    pub const ALL: [WalletAction; 4] = [Self::Deposit, Self::Withdraw, Self::Transfer, Self::Pay];

    pub fn label(self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
            Self::Transfer => "Transfer",
            Self::Pay => "Pay",
        }
    }

    /// Deposit and withdraw go through mobile money, transfer and pay go to
    /// another account.
    pub fn uses_mobile_money(self) -> bool {
        matches!(self, Self::Deposit | Self::Withdraw)
    }

    fn spends_balance(self) -> bool {
        !matches!(self, Self::Deposit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Mpesa,
    AirtelMoney,
}

impl PaymentMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::AirtelMoney => "airtel",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Mpesa => Self::AirtelMoney,
            Self::AirtelMoney => Self::Mpesa,
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mpesa" | "m-pesa" => Ok(Self::Mpesa),
            "airtel" | "airtel money" => Ok(Self::AirtelMoney),
            other => Err(EngineError::validation(format!(
                "Unsupported payment method: {other}"
            ))),
        }
    }
}

/// Which actions need an OTP.
///
/// Deposit and withdraw always do. Transfer and pay only with `gate_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OtpPolicy {
    pub gate_all: bool,
}

impl OtpPolicy {
    pub fn requires_otp(self, action: WalletAction) -> bool {
        action.uses_mobile_money() || self.gate_all
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionForm {
    pub action: WalletAction,
    pub amount: String,
    pub method: Option<PaymentMethod>,
    pub destination: String,
}

impl ActionForm {
    pub fn new(action: WalletAction) -> Self {
        Self {
            action,
            amount: String::new(),
            method: action.uses_mobile_money().then_some(PaymentMethod::Mpesa),
            destination: String::new(),
        }
    }
}

/// Action parameters captured at "Continue".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    TopUp(MobileMoneyRequest),
    Withdraw(MobileMoneyRequest),
    Transfer(PeerPayment),
    Pay(PeerPayment),
}

impl PendingAction {
    pub fn amount(&self) -> u64 {
        match self {
            Self::TopUp(req) | Self::Withdraw(req) => req.amount,
            Self::Transfer(req) | Self::Pay(req) => req.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletStep {
    Selecting,
    Entering(ActionForm),
    AwaitingOtp {
        form: ActionForm,
        pending: PendingAction,
        phone: String,
        otp: String,
    },
}

/// What the caller runs after "Continue".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continue {
    RequestOtp(OtpSend),
    Execute(PendingAction),
}

/// OTP check plus the action it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub check: OtpCheck,
    pub pending: PendingAction,
}

impl Faceted for WalletTransaction {
    fn category(&self) -> Option<&str> {
        self.method.as_deref()
    }

    fn facet(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }
}

#[derive(Debug)]
pub struct WalletFlow {
    step: WalletStep,
    policy: OtpPolicy,
    balance: Option<WalletBalance>,
    pub history: ListController<WalletTransaction>,
    guard: SubmitGuard,
    message: Option<String>,
}

impl WalletFlow {
    pub fn new(policy: OtpPolicy, farmer_id: &str, page_size: u32) -> Self {
        Self {
            step: WalletStep::Selecting,
            policy,
            balance: None,
            history: ListController::new(page_size).scoped(farmer_id),
            guard: SubmitGuard::default(),
            message: None,
        }
    }

    pub fn step(&self) -> &WalletStep {
        &self.step
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    pub fn balance(&self) -> Option<&WalletBalance> {
        self.balance.as_ref()
    }

    pub fn set_balance(&mut self, balance: WalletBalance) {
        self.balance = Some(balance);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn select(&mut self, action: WalletAction) {
        if self.guard.is_busy() {
            return;
        }
        self.step = WalletStep::Entering(ActionForm::new(action));
        self.message = None;
    }

    pub fn form_mut(&mut self) -> Option<&mut ActionForm> {
        match &mut self.step {
            WalletStep::Entering(form) => Some(form),
            _ => None,
        }
    }

    pub fn otp_mut(&mut self) -> Option<&mut String> {
        match &mut self.step {
            WalletStep::AwaitingOtp { otp, .. } => Some(otp),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        if self.guard.is_busy() {
            return;
        }
        self.step = WalletStep::Selecting;
    }

    /// Validates the form and decides the next call. No money moves here
    /// when an OTP is required.
    pub fn continue_action(&mut self, session: &Session) -> Result<Continue, EngineError> {
        if self.guard.is_busy() {
            return Err(EngineError::InFlight);
        }
        let WalletStep::Entering(form) = &self.step else {
            return Err(EngineError::validation("Choose an action first."));
        };
        let form = form.clone();
        let pending = self.build(&form, session)?;
        self.guard.try_start()?;

        if self.policy.requires_otp(form.action) {
            let phone = registered_phone(session)?;
            self.step = WalletStep::AwaitingOtp {
                form,
                pending,
                phone: phone.clone(),
                otp: String::new(),
            };
            return Ok(Continue::RequestOtp(OtpSend { phone }));
        }
        tracing::info!(action = form.action.label(), "executing without otp");
        Ok(Continue::Execute(pending))
    }

    /// Result of the OTP send. On failure the form comes back untouched.
    pub fn otp_sent(&mut self, result: Result<(), EngineError>) -> Result<(), EngineError> {
        self.guard.finish();
        match result {
            Ok(()) => {
                self.message = Some("Enter the code we sent to your phone.".to_string());
                Ok(())
            }
            Err(err) => {
                if let WalletStep::AwaitingOtp { form, .. } = &self.step {
                    self.step = WalletStep::Entering(form.clone());
                }
                self.message = Some(err.alert_message());
                Err(err)
            }
        }
    }

    pub fn submit_otp(&mut self) -> Result<Confirmation, EngineError> {
        if self.guard.is_busy() {
            return Err(EngineError::InFlight);
        }
        let WalletStep::AwaitingOtp {
            pending, phone, otp, ..
        } = &self.step
        else {
            return Err(EngineError::validation("Nothing to confirm."));
        };
        let otp = otp.trim();
        if otp.is_empty() || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::validation("Enter the code you received."));
        }
        let confirmation = Confirmation {
            check: OtpCheck {
                phone: phone.clone(),
                otp: otp.to_string(),
            },
            pending: pending.clone(),
        };
        self.guard.try_start()?;
        Ok(confirmation)
    }

    /// Result of the confirmed (or ungated) action. Success returns to the
    /// action selector; the caller then refreshes balance and history.
    pub fn finish(
        &mut self,
        result: Result<WalletReceipt, EngineError>,
    ) -> Result<WalletReceipt, EngineError> {
        self.guard.finish();
        match result {
            Ok(receipt) => {
                self.step = WalletStep::Selecting;
                self.message = Some(format!("Done. Reference {}.", receipt.reference));
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "wallet action failed");
                if let WalletStep::AwaitingOtp { otp, .. } = &mut self.step {
                    otp.clear();
                }
                self.message = Some(err.alert_message());
                Err(err)
            }
        }
    }

    fn build(&self, form: &ActionForm, session: &Session) -> Result<PendingAction, EngineError> {
        let amount = parse_whole(&form.amount)?;
        if form.action.spends_balance() {
            if let Some(balance) = &self.balance {
                if Money::from_whole(amount) > Money::new(balance.balance_minor) {
                    return Err(EngineError::validation("Insufficient wallet balance."));
                }
            }
        }
        let farmer_id = session.farmer_id().to_string();

        if form.action.uses_mobile_money() {
            if form.method.is_none() {
                return Err(EngineError::validation("Choose a payment method."));
            }
            let request = MobileMoneyRequest {
                farmer_id,
                amount,
                phone_number: registered_phone(session)?,
            };
            return Ok(match form.action {
                WalletAction::Deposit => PendingAction::TopUp(request),
                _ => PendingAction::Withdraw(request),
            });
        }

        let destination = form.destination.trim();
        if destination.is_empty() {
            return Err(EngineError::validation("Enter a destination account."));
        }
        let payment = PeerPayment {
            farmer_id,
            amount,
            destination: destination.to_string(),
        };
        Ok(match form.action {
            WalletAction::Transfer => PendingAction::Transfer(payment),
            _ => PendingAction::Pay(payment),
        })
    }
}

fn registered_phone(session: &Session) -> Result<String, EngineError> {
    session
        .phone()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation("Add a phone number to your profile first."))
}

/// Issues exactly one action call.
pub async fn execute<A: WalletApi + Sync + ?Sized>(
    api: &A,
    pending: &PendingAction,
) -> Result<WalletReceipt, EngineError> {
    let receipt = match pending {
        PendingAction::TopUp(req) => api.top_up(req).await?,
        PendingAction::Withdraw(req) => api.withdraw(req).await?,
        PendingAction::Transfer(req) => api.transfer(req).await?,
        PendingAction::Pay(req) => api.pay(req).await?,
    };
    tracing::info!(reference = %receipt.reference, "wallet action accepted");
    Ok(receipt)
}

/// Verifies the code, then executes the action. Nothing moves if the code
/// is refused.
pub async fn confirm<A: WalletApi + Sync + ?Sized>(
    api: &A,
    confirmation: &Confirmation,
) -> Result<WalletReceipt, EngineError> {
    api.verify_otp(&confirmation.check).await?;
    execute(api, &confirmation.pending).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::user;
    use api_types::auth::Role;

    fn session() -> Session {
        Session::new(user("f1", Role::Farmer))
    }

    fn flow(gate_all: bool) -> WalletFlow {
        let mut flow = WalletFlow::new(OtpPolicy { gate_all }, "f1", 10);
        flow.set_balance(WalletBalance {
            farmer_id: "f1".to_string(),
            balance_minor: 100_000,
        });
        flow
    }

    #[test]
    fn deposit_asks_for_otp_first() {
        let mut flow = flow(false);
        flow.select(WalletAction::Deposit);
        let form = flow.form_mut().unwrap();
        form.amount = "500".to_string();
        form.method = Some(PaymentMethod::Mpesa);

        let next = flow.continue_action(&session()).unwrap();
        assert_eq!(
            next,
            Continue::RequestOtp(OtpSend {
                phone: "+254700000001".to_string()
            })
        );
        assert!(matches!(flow.step(), WalletStep::AwaitingOtp { .. }));
    }

    #[test]
    fn transfer_skips_otp_unless_policy_gates_all() {
        for (gate_all, expect_otp) in [(false, false), (true, true)] {
            let mut flow = flow(gate_all);
            flow.select(WalletAction::Transfer);
            let form = flow.form_mut().unwrap();
            form.amount = "200".to_string();
            form.destination = "0722000000".to_string();
            let next = flow.continue_action(&session()).unwrap();
            assert_eq!(matches!(next, Continue::RequestOtp(_)), expect_otp);
        }
    }

    #[test]
    fn withdraw_above_balance_is_refused_locally() {
        let mut flow = flow(false);
        flow.select(WalletAction::Withdraw);
        flow.form_mut().unwrap().amount = "1001".to_string();
        let err = flow.continue_action(&session()).unwrap_err();
        assert_eq!(err.alert_message(), "Insufficient wallet balance.");
        assert!(!flow.is_busy());
    }

    #[test]
    fn failed_otp_send_restores_form() {
        let mut flow = flow(false);
        flow.select(WalletAction::Deposit);
        flow.form_mut().unwrap().amount = "50".to_string();
        flow.continue_action(&session()).unwrap();
        let err = EngineError::validation("sms gateway down");
        assert!(flow.otp_sent(Err(err)).is_err());
        match flow.step() {
            WalletStep::Entering(form) => assert_eq!(form.amount, "50"),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn rejected_code_keeps_pending_action() {
        let mut flow = flow(false);
        flow.select(WalletAction::Deposit);
        flow.form_mut().unwrap().amount = "50".to_string();
        flow.continue_action(&session()).unwrap();
        flow.otp_sent(Ok(())).unwrap();
        *flow.otp_mut().unwrap() = "1234".to_string();
        let confirmation = flow.submit_otp().unwrap();
        assert_eq!(confirmation.pending.amount(), 50);

        let err = crate::ApiError::Rejected("invalid otp".to_string());
        assert!(flow.finish(Err(err.into())).is_err());
        match flow.step() {
            WalletStep::AwaitingOtp { otp, pending, .. } => {
                assert!(otp.is_empty());
                assert_eq!(pending.amount(), 50);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("M-Pesa".parse::<PaymentMethod>().unwrap(), PaymentMethod::Mpesa);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
