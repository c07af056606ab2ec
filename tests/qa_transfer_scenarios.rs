//! Independent end-to-end scenarios through the public crate API.

use std::sync::Arc;

use fundflow::account::{Account, MemAccountStore};
use fundflow::config::RetryConfig;
use fundflow::engine::{TransferEngine, TransferError};
use fundflow::ledger::{LedgerStore, MemLedgerStore, TxStatus};

struct Harness {
    accounts: Arc<MemAccountStore>,
    ledger: Arc<MemLedgerStore>,
    engine: Arc<TransferEngine>,
}

fn harness(balances: &[(u64, u64)]) -> Harness {
    let accounts = Arc::new(MemAccountStore::new());
    for &(id, balance) in balances {
        accounts.insert(Account::new(id, balance));
    }
    let ledger = Arc::new(MemLedgerStore::new());
    let engine = Arc::new(TransferEngine::new(
        accounts.clone(),
        ledger.clone(),
        RetryConfig::default(),
    ));
    Harness {
        accounts,
        ledger,
        engine,
    }
}

async fn balance(h: &Harness, id: u64) -> u64 {
    use fundflow::account::AccountStore;
    h.accounts.get(id).await.unwrap().balance
}

#[tokio::test]
async fn qa_tc_month_of_rent_and_groceries() {
    // Alice pays Bob rent, Bob pays Carol for groceries, Carol pays
    // Alice back a loan. Every step carries a distinct request key.
    let h = harness(&[(1, 100_000), (2, 20_000), (3, 5_000)]);

    h.engine
        .transfer(1, 2, 55_000, Some("rent".into()), Some("alice-rent-06".into()))
        .await
        .unwrap();
    h.engine
        .transfer(2, 3, 8_000, Some("groceries".into()), Some("bob-groc-14".into()))
        .await
        .unwrap();
    h.engine
        .transfer(3, 1, 10_000, Some("loan back".into()), Some("carol-loan-01".into()))
        .await
        .unwrap();

    assert_eq!(balance(&h, 1).await, 55_000);
    assert_eq!(balance(&h, 2).await, 67_000);
    assert_eq!(balance(&h, 3).await, 3_000);

    // Total money in the system is unchanged.
    let total = balance(&h, 1).await + balance(&h, 2).await + balance(&h, 3).await;
    assert_eq!(total, 125_000);
}

#[tokio::test]
async fn qa_tc_network_retry_does_not_double_charge() {
    let h = harness(&[(1, 1_000), (2, 0)]);

    // Client sends, times out waiting for the response, and retries the
    // exact same request three more times.
    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(
            h.engine
                .transfer(1, 2, 400, None, Some("payment-abc".into()))
                .await
                .unwrap(),
        );
    }

    assert_eq!(balance(&h, 1).await, 600);
    assert_eq!(balance(&h, 2).await, 400);

    // One executed, three replayed the same transaction.
    assert!(!outcomes[0].replayed);
    assert!(outcomes[1..].iter().all(|o| o.replayed));
    assert!(
        outcomes[1..]
            .iter()
            .all(|o| o.transaction_id == outcomes[0].transaction_id)
    );
}

#[tokio::test]
async fn qa_tc_failed_attempt_then_topup_then_success() {
    let h = harness(&[(1, 100), (2, 0)]);

    let err = h
        .engine
        .transfer(1, 2, 500, None, Some("big-one".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds));
    assert_eq!(balance(&h, 1).await, 100);

    // Someone funds the sender, the client retries the same key.
    use fundflow::account::AccountStore;
    let acct = h.accounts.get(1).await.unwrap();
    h.accounts
        .compare_and_swap(1, acct.version, acct.balance + 1_000)
        .await
        .unwrap();

    let outcome = h
        .engine
        .transfer(1, 2, 500, None, Some("big-one".into()))
        .await
        .unwrap();
    assert!(!outcome.replayed);
    assert_eq!(balance(&h, 1).await, 600);
    assert_eq!(balance(&h, 2).await, 500);

    // The ledger kept both attempts: one failed, one success.
    let page = h.ledger.list_by_account(2, None, 10).await.unwrap();
    let statuses: Vec<TxStatus> = page.items.iter().map(|t| t.status).collect();
    assert!(statuses.contains(&TxStatus::Failed));
    assert!(statuses.contains(&TxStatus::Success));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn qa_tc_payday_fanout_conserves_money() {
    // One payroll account pays 20 employees concurrently while two of
    // them shuffle money between each other.
    let mut seed = vec![(100u64, 1_000_000u64)];
    for id in 1..=20u64 {
        seed.push((id, 1_000));
    }
    let h = harness(&seed);

    let mut handles = Vec::new();
    for id in 1..=20u64 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .transfer(100, id, 5_000, Some("salary".into()), Some(format!("pay-{id}")))
                .await
        }));
    }
    for i in 0..10 {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            let (from, to) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
            engine.transfer(from, to, 50, None, None).await
        }));
    }

    for handle in handles {
        // Contention may exhaust retries; that is a legal outcome, money
        // loss is not.
        let _ = handle.await.unwrap();
    }

    let mut total = balance(&h, 100).await;
    for id in 1..=20u64 {
        total += balance(&h, id).await;
    }
    assert_eq!(total, 1_000_000 + 20 * 1_000);
}
