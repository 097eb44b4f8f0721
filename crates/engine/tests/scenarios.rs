use std::sync::Mutex;

use api_types::{
    PageQuery, Paginated,
    auth::{OtpRequest, OtpVerify, Role, UserRecord},
    product::Product,
    wallet::{
        MobileMoneyRequest, OtpCheck, OtpSend, PeerPayment, TransactionStatus, WalletBalance,
        WalletReceipt, WalletTransaction,
    },
};
use engine::{
    ApiError, EngineError, Route, SessionContext,
    auth::{LoginFlow, LoginStep},
    backend::{ApiResult, AuthApi, ProductApi, WalletApi},
    editor::{Draft, Editor, SaveVerb},
    session::resolve,
    wallet::{Continue, OtpPolicy, WalletAction, WalletFlow, WalletStep, confirm},
};

const GOOD_CODE: &str = "123456";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    LoginOtp(String),
    LoginVerify(String),
    Balance(String),
    History(Option<String>),
    SendOtp(String),
    VerifyOtp(String),
    TopUp(MobileMoneyRequest),
    Withdraw(MobileMoneyRequest),
    Transfer(PeerPayment),
    Pay(PeerPayment),
    CreateProduct(String),
    UpdateProduct(String),
}

#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn receipt() -> WalletReceipt {
        WalletReceipt {
            reference: "REF1".to_string(),
            status: TransactionStatus::Pending,
        }
    }
}

fn farmer() -> UserRecord {
    UserRecord {
        id: "f1".to_string(),
        email: "a@b.com".to_string(),
        name: Some("Wanjiku".to_string()),
        phone: Some("+254700000001".to_string()),
        role: Role::Farmer,
        token: Some("tok".to_string()),
    }
}

impl AuthApi for FakeBackend {
    async fn request_login_otp(&self, body: &OtpRequest) -> ApiResult<()> {
        self.record(Call::LoginOtp(body.email.clone()));
        Ok(())
    }

    async fn verify_login_otp(&self, body: &OtpVerify) -> ApiResult<UserRecord> {
        self.record(Call::LoginVerify(body.otp.clone()));
        if body.otp == GOOD_CODE {
            Ok(farmer())
        } else {
            Err(ApiError::Rejected("Invalid or expired code".to_string()))
        }
    }
}

impl WalletApi for FakeBackend {
    async fn balance(&self, farmer_id: &str) -> ApiResult<WalletBalance> {
        self.record(Call::Balance(farmer_id.to_string()));
        Ok(WalletBalance {
            farmer_id: farmer_id.to_string(),
            balance_minor: 150_000,
        })
    }

    async fn wallet_history(&self, query: &PageQuery) -> ApiResult<Paginated<WalletTransaction>> {
        self.record(Call::History(query.scope.clone()));
        Ok(Paginated::empty(query.limit))
    }

    async fn send_otp(&self, body: &OtpSend) -> ApiResult<()> {
        self.record(Call::SendOtp(body.phone.clone()));
        Ok(())
    }

    async fn verify_otp(&self, body: &OtpCheck) -> ApiResult<()> {
        self.record(Call::VerifyOtp(body.otp.clone()));
        if body.otp == GOOD_CODE {
            Ok(())
        } else {
            Err(ApiError::Rejected("Invalid OTP".to_string()))
        }
    }

    async fn top_up(&self, body: &MobileMoneyRequest) -> ApiResult<WalletReceipt> {
        self.record(Call::TopUp(body.clone()));
        Ok(Self::receipt())
    }

    async fn withdraw(&self, body: &MobileMoneyRequest) -> ApiResult<WalletReceipt> {
        self.record(Call::Withdraw(body.clone()));
        Ok(Self::receipt())
    }

    async fn transfer(&self, body: &PeerPayment) -> ApiResult<WalletReceipt> {
        self.record(Call::Transfer(body.clone()));
        Ok(Self::receipt())
    }

    async fn pay(&self, body: &PeerPayment) -> ApiResult<WalletReceipt> {
        self.record(Call::Pay(body.clone()));
        Ok(Self::receipt())
    }
}

impl ProductApi for FakeBackend {
    async fn list_products(&self, query: &PageQuery) -> ApiResult<Paginated<Product>> {
        Ok(Paginated::empty(query.limit))
    }

    async fn create_product(&self, product: &Product, _key: &str) -> ApiResult<Product> {
        self.record(Call::CreateProduct(product.name.clone()));
        let mut saved = product.clone();
        saved.id = Some("p-new".to_string());
        Ok(saved)
    }

    async fn update_product(&self, id: &str, product: &Product) -> ApiResult<Product> {
        self.record(Call::UpdateProduct(id.to_string()));
        Ok(product.clone())
    }
}

fn sessions() -> (tempfile::TempDir, SessionContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = SessionContext::load(dir.path().join("state.json")).unwrap();
    (dir, ctx)
}

#[tokio::test]
async fn wrong_code_keeps_user_signed_out_then_right_code_signs_in() {
    let api = FakeBackend::default();
    let (_dir, mut sessions) = sessions();
    assert_eq!(resolve(Route::Root, sessions.session()), Route::Login);

    let mut flow = LoginFlow::new("a@b.com");
    flow.request(&api).await.unwrap();
    assert_eq!(flow.step(), LoginStep::Verify);

    flow.otp = "000000".to_string();
    let err = flow.verify(&api, &mut sessions).await.unwrap_err();
    assert!(matches!(err, EngineError::Api(ApiError::Rejected(_))));
    assert!(sessions.session().is_none());
    assert_eq!(flow.route(), Route::VerifyOtp);
    assert_eq!(resolve(Route::Dashboard, sessions.session()), Route::Login);

    flow.otp = GOOD_CODE.to_string();
    let next = flow.verify(&api, &mut sessions).await.unwrap();
    assert_eq!(next, Route::Dashboard);
    assert_eq!(sessions.session().map(|s| s.farmer_id()), Some("f1"));
    assert_eq!(resolve(Route::Root, sessions.session()), Route::Dashboard);

    assert_eq!(
        api.calls(),
        vec![
            Call::LoginOtp("a@b.com".to_string()),
            Call::LoginVerify("000000".to_string()),
            Call::LoginVerify(GOOD_CODE.to_string()),
        ]
    );
}

#[tokio::test]
async fn deposit_moves_money_only_after_the_code_is_verified() {
    let api = FakeBackend::default();
    let (_dir, mut sessions) = sessions();
    sessions.sign_in(farmer()).unwrap();
    let session = sessions.require().unwrap().clone();

    let mut wallet = WalletFlow::new(OtpPolicy::default(), session.farmer_id(), 10);
    wallet.set_balance(api.balance(session.farmer_id()).await.unwrap());

    wallet.select(WalletAction::Deposit);
    let form = wallet.form_mut().unwrap();
    form.amount = "500".to_string();
    form.method = Some("mpesa".parse().unwrap());

    let Continue::RequestOtp(send) = wallet.continue_action(&session).unwrap() else {
        panic!("deposit must ask for a code");
    };
    let sent = api.send_otp(&send).await.map_err(EngineError::from);
    wallet.otp_sent(sent).unwrap();
    assert!(matches!(wallet.step(), WalletStep::AwaitingOtp { .. }));
    assert!(
        !api.calls()
            .iter()
            .any(|c| matches!(c, Call::TopUp(_) | Call::Withdraw(_))),
        "no money may move before the code is checked"
    );

    *wallet.otp_mut().unwrap() = GOOD_CODE.to_string();
    let confirmation = wallet.submit_otp().unwrap();
    let result = confirm(&api, &confirmation).await;
    wallet.finish(result).unwrap();
    assert_eq!(wallet.step(), &WalletStep::Selecting);

    wallet.set_balance(api.balance(session.farmer_id()).await.unwrap());
    let fetch = wallet.history.refresh();
    let page = api.wallet_history(&fetch.query).await.map_err(EngineError::from);
    wallet.history.apply(fetch.seq, page).unwrap();

    let top_ups: Vec<_> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::TopUp(req) => Some(req),
            _ => None,
        })
        .collect();
    assert_eq!(
        top_ups,
        vec![MobileMoneyRequest {
            farmer_id: "f1".to_string(),
            amount: 500,
            phone_number: "+254700000001".to_string(),
        }]
    );
    let calls = api.calls();
    assert_eq!(calls[1], Call::SendOtp("+254700000001".to_string()));
    assert_eq!(calls[2], Call::VerifyOtp(GOOD_CODE.to_string()));
    assert_eq!(calls[4], Call::Balance("f1".to_string()));
    assert_eq!(calls[5], Call::History(Some("f1".to_string())));
}

#[tokio::test]
async fn refused_code_issues_no_action_call() {
    let api = FakeBackend::default();
    let session = engine::Session::new(farmer());
    let mut wallet = WalletFlow::new(OtpPolicy::default(), "f1", 10);
    wallet.select(WalletAction::Withdraw);
    wallet.form_mut().unwrap().amount = "100".to_string();

    let Continue::RequestOtp(_) = wallet.continue_action(&session).unwrap() else {
        panic!("withdraw must ask for a code");
    };
    wallet.otp_sent(Ok(())).unwrap();
    *wallet.otp_mut().unwrap() = "999999".to_string();
    let confirmation = wallet.submit_otp().unwrap();
    let result = confirm(&api, &confirmation).await;
    assert!(wallet.finish(result).is_err());

    assert_eq!(api.calls(), vec![Call::VerifyOtp("999999".to_string())]);
}

#[tokio::test]
async fn transfer_runs_directly_with_default_policy() {
    let api = FakeBackend::default();
    let session = engine::Session::new(farmer());
    let mut wallet = WalletFlow::new(OtpPolicy::default(), "f1", 10);
    wallet.select(WalletAction::Transfer);
    let form = wallet.form_mut().unwrap();
    form.amount = "20".to_string();
    form.destination = "f2".to_string();

    let Continue::Execute(pending) = wallet.continue_action(&session).unwrap() else {
        panic!("transfer is not gated by default");
    };
    let result = engine::wallet::execute(&api, &pending).await;
    wallet.finish(result).unwrap();
    assert_eq!(
        api.calls(),
        vec![Call::Transfer(PeerPayment {
            farmer_id: "f1".to_string(),
            amount: 20,
            destination: "f2".to_string(),
        })]
    );
}

#[tokio::test]
async fn save_verb_follows_the_draft_id() {
    let cases = [
        (None, None, SaveVerb::Create),
        (Some(""), None, SaveVerb::Create),
        (Some("p1"), None, SaveVerb::Update("p1".to_string())),
        (Some("p1"), Some(""), SaveVerb::Update("p1".to_string())),
        (None, Some("p2"), SaveVerb::Update("p2".to_string())),
    ];
    for (opened_with, draft_id, expected) in cases {
        let existing = opened_with.map(|id| Product {
            id: Some(id.to_string()),
            name: "Beans".to_string(),
            ..Product::defaults()
        });
        let mut editor = Editor::open(existing);
        editor.draft_mut().name = "Beans".to_string();
        if let Some(id) = draft_id {
            editor.draft_mut().id = Some(id.to_string());
        }

        let api = FakeBackend::default();
        let ticket = editor.begin_save(Some("f1")).unwrap();
        assert_eq!(ticket.verb, expected, "opened with {opened_with:?}, draft id {draft_id:?}");
        let result = ticket.submit(&api).await;
        editor.finish_save(result).unwrap();

        let call = match expected {
            SaveVerb::Create => Call::CreateProduct("Beans".to_string()),
            SaveVerb::Update(id) => Call::UpdateProduct(id),
        };
        assert_eq!(api.calls(), vec![call]);
    }
}

#[tokio::test]
async fn saved_create_switches_editor_to_update() {
    let api = FakeBackend::default();
    let mut editor = Editor::<Product>::open(None);
    editor.draft_mut().name = "Kale".to_string();
    let ticket = editor.begin_save(Some("f1")).unwrap();
    let result = ticket.submit(&api).await;
    editor.finish_save(result).unwrap();
    assert_eq!(editor.verb(), SaveVerb::Update("p-new".to_string()));
}
