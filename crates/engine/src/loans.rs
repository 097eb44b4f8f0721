use std::future::Future;

use api_types::loan::{Loan, LoanRepayment, LoanStatus};

use crate::{
    EngineError, Money,
    backend::{ApiResult, LoanApi},
    editor::{Draft, Persist},
    guard::SubmitGuard,
    listing::Faceted,
    money::parse_whole,
};

pub const DEFAULT_TERM_MONTHS: u32 = 6;
pub const MAX_TERM_MONTHS: u32 = 60;

impl Draft for Loan {
    fn defaults() -> Self {
        Self {
            id: None,
            farmer_id: None,
            amount: 0,
            purpose: String::new(),
            term_months: DEFAULT_TERM_MONTHS,
            status: LoanStatus::Pending,
            balance_minor: 0,
            applied_at: None,
            due_date: None,
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.amount == 0 {
            return Err(EngineError::validation("Loan amount must be greater than zero."));
        }
        if self.purpose.trim().is_empty() {
            return Err(EngineError::validation("Tell us what the loan is for."));
        }
        if !(1..=MAX_TERM_MONTHS).contains(&self.term_months) {
            return Err(EngineError::validation(format!(
                "Term must be between 1 and {MAX_TERM_MONTHS} months."
            )));
        }
        if self.id.is_some() && self.status != LoanStatus::Pending {
            return Err(EngineError::validation(
                "Only pending applications can be changed.",
            ));
        }
        Ok(())
    }

    fn attach_owner(&mut self, owner_id: &str) {
        if self.farmer_id.is_none() {
            self.farmer_id = Some(owner_id.to_string());
        }
    }
}

impl<A: LoanApi + Sync + ?Sized> Persist<A> for Loan {
    fn create<'a>(
        api: &'a A,
        draft: &'a Self,
        idempotency_key: &'a str,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.create_loan(draft, idempotency_key)
    }

    fn update<'a>(
        api: &'a A,
        id: &'a str,
        draft: &'a Self,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.update_loan(id, draft)
    }
}

impl Faceted for Loan {
    fn category(&self) -> Option<&str> {
        None
    }

    fn facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

/// Repayment form for one active loan.
#[derive(Debug, Clone)]
pub struct RepayForm {
    loan_id: String,
    outstanding: Money,
    pub amount: String,
    guard: SubmitGuard,
}

impl RepayForm {
    pub fn open(loan: &Loan) -> Result<Self, EngineError> {
        let Some(loan_id) = loan.id.clone() else {
            return Err(EngineError::validation("This loan has not been saved yet."));
        };
        if loan.status != LoanStatus::Active {
            return Err(EngineError::validation("Only active loans can be repaid."));
        }
        Ok(Self {
            loan_id,
            outstanding: Money::new(loan.balance_minor),
            amount: String::new(),
            guard: SubmitGuard::default(),
        })
    }

    pub fn loan_id(&self) -> &str {
        &self.loan_id
    }

    pub fn outstanding(&self) -> Money {
        self.outstanding
    }

    pub fn is_submitting(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn begin(&mut self, farmer_id: &str) -> Result<(String, LoanRepayment), EngineError> {
        if self.guard.is_busy() {
            return Err(EngineError::InFlight);
        }
        let amount = parse_whole(&self.amount)?;
        if Money::from_whole(amount) > self.outstanding {
            return Err(EngineError::validation(format!(
                "You only owe {}.",
                self.outstanding
            )));
        }
        self.guard.try_start()?;
        Ok((
            self.loan_id.clone(),
            LoanRepayment {
                farmer_id: farmer_id.to_string(),
                amount,
            },
        ))
    }

    pub fn finish<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        self.guard.finish();
        if let Err(err) = &result {
            tracing::warn!(loan = %self.loan_id, error = %err, "repayment failed");
        }
        result
    }
}

pub async fn repay<A: LoanApi + Sync + ?Sized>(
    api: &A,
    loan_id: &str,
    body: &LoanRepayment,
) -> Result<api_types::wallet::WalletReceipt, EngineError> {
    Ok(api.repay_loan(loan_id, body).await?)
}
