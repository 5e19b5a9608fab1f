//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use fundledger::application::access::Caller;
use fundledger::application::wallet_transfer::{PollConfig, WalletTransferClient};
use fundledger::domain::entities::startup::{Startup, StartupProfile};
use fundledger::domain::entities::user::User;
use fundledger::domain::ports::wallet_provider::{
    ProviderError, ProviderEvent, ReceiptStatus, TransferParams, TransferReceipt, WalletProvider,
};
use fundledger::domain::values::amount::Amount;
use fundledger::domain::values::role::Role;
use fundledger::infrastructure::document::DocumentLedgerStore;
use fundledger::infrastructure::memory::MemoryLedgerStore;
use fundledger::infrastructure::resolvers::id_resolver::PrefixPolicy;
use fundledger::FundLedger;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub fn setup() -> FundLedger {
    memory_ledger()
}

pub fn memory_ledger() -> FundLedger {
    FundLedger::with_store(
        Arc::new(MemoryLedgerStore::new()),
        WalletTransferClient::new(None, PollConfig::default()),
    )
}

pub fn document_ledger() -> FundLedger {
    FundLedger::with_store(
        Arc::new(DocumentLedgerStore::open(":memory:", PrefixPolicy::RejectAmbiguous).unwrap()),
        WalletTransferClient::new(None, PollConfig::default()),
    )
}

/// One ledger per backend. Ledger behaviour must not depend on which one.
pub fn ledgers() -> Vec<FundLedger> {
    vec![memory_ledger(), document_ledger()]
}

pub fn addr(n: u32) -> String {
    format!("0x{n:040x}")
}

pub fn amount(s: &str) -> Amount {
    Amount::parse_positive(s).unwrap()
}

pub fn investor(ledger: &FundLedger, name: &str) -> (User, Caller) {
    let user = ledger
        .register_user(name, "hash", &format!("{name}@example.com"), None, Role::Investor)
        .unwrap();
    let caller = Caller::from(&user);
    (user, caller)
}

pub fn founder(ledger: &FundLedger, name: &str, goal: &str) -> (User, Caller, Startup) {
    let user = ledger
        .register_user(name, "hash", &format!("{name}@example.com"), None, Role::Startup)
        .unwrap();
    let caller = Caller::from(&user);
    let startup = ledger
        .create_startup(
            &caller,
            StartupProfile {
                name: format!("{name} Labs"),
                description: "We build things".into(),
                industry: "fintech".into(),
                location: "Lisbon".into(),
                funding_goal: amount(goal),
                ..Default::default()
            },
        )
        .unwrap();
    (user, caller, startup)
}

pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(5),
        max_attempts,
    }
}

/// Scripted wallet provider. Each call pops the next scripted answer.
/// Receipts are scripted per reference; an empty script means "still
/// pending".
pub struct MockWallet {
    pub accounts: Mutex<Result<Vec<String>, ProviderError>>,
    pub sends: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub receipts: Mutex<HashMap<String, VecDeque<Result<Option<TransferReceipt>, ProviderError>>>>,
    pub sent: Mutex<Vec<TransferParams>>,
    pub receipt_calls: Mutex<u32>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    pub fn new(account: &str) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(Ok(vec![account.to_string()])),
            sends: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(HashMap::new()),
            sent: Mutex::new(vec![]),
            receipt_calls: Mutex::new(0),
            send_gate: Mutex::new(None),
            events,
        })
    }

    pub fn rejecting_accounts() -> Arc<Self> {
        let w = Self::new(&addr(1));
        *w.accounts.lock().unwrap() = Err(ProviderError::UserRejected);
        w
    }

    /// Make every `send_transfer` wait, as if the user were still deciding,
    /// until the returned handle is notified.
    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_send(&self, result: Result<&str, ProviderError>) {
        self.sends
            .lock()
            .unwrap()
            .push_back(result.map(String::from));
    }

    fn script(&self, reference: &str, step: Result<Option<TransferReceipt>, ProviderError>) {
        self.receipts
            .lock()
            .unwrap()
            .entry(reference.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn push_pending(&self, reference: &str, n: usize) {
        for _ in 0..n {
            self.script(reference, Ok(None));
        }
    }

    pub fn push_receipt(&self, reference: &str, status: ReceiptStatus) {
        self.script(
            reference,
            Ok(Some(TransferReceipt {
                reference: reference.to_string(),
                status,
                block_number: Some(100),
            })),
        );
    }

    pub fn push_receipt_error(&self, reference: &str) {
        self.script(reference, Err(ProviderError::Request("node timeout".into())));
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn receipt_calls(&self) -> u32 {
        *self.receipt_calls.lock().unwrap()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.accounts.lock().unwrap().clone()
    }

    async fn send_transfer(&self, params: &TransferParams) -> Result<String, ProviderError> {
        self.sent.lock().unwrap().push(params.clone());
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("0xfeed".to_string()))
    }

    async fn get_transfer_receipt(
        &self,
        reference: &str,
    ) -> Result<Option<TransferReceipt>, ProviderError> {
        *self.receipt_calls.lock().unwrap() += 1;
        self.receipts
            .lock()
            .unwrap()
            .get_mut(reference)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Ok(None))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub fn wallet_client(wallet: &Arc<MockWallet>, poll: PollConfig) -> WalletTransferClient {
    WalletTransferClient::new(Some(wallet.clone() as Arc<dyn WalletProvider>), poll)
}
