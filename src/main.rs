//! Fundflow service entry point.
//!
//! Loads the environment config, wires the stores (Postgres when
//! configured, in-memory otherwise), builds the transfer engine and
//! starts the HTTP gateway.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use fundflow::account::{AccountStore, MemAccountStore, PgAccountStore};
use fundflow::config::AppConfig;
use fundflow::directory::{DirectoryEntry, MemDirectory};
use fundflow::engine::TransferEngine;
use fundflow::gateway::{run_server, state::AppState};
use fundflow::ledger::{LedgerStore, MemLedgerStore, PgLedgerStore};
use fundflow::logging::init_logging;
use fundflow::user_auth::AuthVerifier;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = init_logging(&config);
    info!("starting fundflow, env={env}");

    if let Some(otp) = &config.otp {
        info!("otp verification provider configured at {}", otp.base_url);
    }

    let directory = Arc::new(MemDirectory::new());
    for seed in &config.seed_accounts {
        directory.register(DirectoryEntry {
            account_id: seed.id,
            name: seed.name.clone(),
            email: seed.email.clone(),
        });
    }

    let (accounts, ledger): (Arc<dyn AccountStore>, Arc<dyn LedgerStore>) =
        match &config.postgres_url {
            Some(url) => {
                let pool = PgPoolOptions::new().max_connections(16).connect(url).await?;
                PgAccountStore::init_schema(&pool).await?;
                PgLedgerStore::init_schema(&pool).await?;
                info!("durable stores on postgres");
                (
                    Arc::new(PgAccountStore::new(pool.clone())),
                    Arc::new(PgLedgerStore::new(pool)),
                )
            }
            None => {
                warn!("no postgres_url configured, running on in-memory stores");
                let mem = Arc::new(MemAccountStore::new());
                seed_demo_accounts(&mem, &config);
                (mem, Arc::new(MemLedgerStore::new()))
            }
        };

    let engine = Arc::new(TransferEngine::new(
        accounts.clone(),
        ledger.clone(),
        config.retry.clone(),
    ));
    let auth = Arc::new(AuthVerifier::new(config.auth.jwt_secret.clone()));
    let state = Arc::new(AppState::new(engine, accounts, ledger, directory, auth));

    run_server(&config.gateway.host, config.gateway.port, state).await
}

#[cfg(feature = "mock-api")]
fn seed_demo_accounts(store: &MemAccountStore, config: &AppConfig) {
    use fundflow::account::Account;

    for seed in &config.seed_accounts {
        store.insert(Account::new(seed.id, seed.balance));
        info!(
            "seeded demo account id={} balance={} email={}",
            seed.id, seed.balance, seed.email
        );
    }
}

#[cfg(not(feature = "mock-api"))]
fn seed_demo_accounts(_store: &MemAccountStore, _config: &AppConfig) {
    warn!("mock-api disabled, in-memory stores start empty");
}
