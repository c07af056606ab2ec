use std::sync::Arc;

use crate::account::AccountStore;
use crate::directory::DirectoryResolver;
use crate::engine::TransferEngine;
use crate::ledger::LedgerStore;
use crate::user_auth::AuthVerifier;

/// Shared gateway state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TransferEngine>,
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub directory: Arc<dyn DirectoryResolver>,
    pub auth: Arc<AuthVerifier>,
}

impl AppState {
    pub fn new(
        engine: Arc<TransferEngine>,
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn DirectoryResolver>,
        auth: Arc<AuthVerifier>,
    ) -> Self {
        Self {
            engine,
            accounts,
            ledger,
            directory,
            auth,
        }
    }
}
