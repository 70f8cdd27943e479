//! End-to-end ledger scenarios against an in-memory database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use roost_core::{
    ChickenType, ChickenTypeRef, Customer, DebtEntry, DistributionPatch, Employee, ErrorKind,
    LoadingBatch,
    LoadingPatch, LoadingWeight, Money, NewChickenType, NewCustomer, NewDistribution,
    NewEmployee, NewExpense, NewLoading, NewPayment, NewSupplier, NewTransfer, PaymentMethod,
    PaymentPatch, PaymentStatus, Supplier, WasteEntry, Weight,
};
use roost_db::{Database, DbConfig};

// =============================================================================
// Fixtures
// =============================================================================

struct Fixture {
    db: Database,
    supplier: Supplier,
    customer: Customer,
    broiler: ChickenType,
    driver: Employee,
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    fixture_on(DbConfig::in_memory()).await
}

/// A throwaway database file, so more than one connection can be open.
fn scratch_file() -> PathBuf {
    std::env::temp_dir().join(format!("roost-test-{}.db", uuid::Uuid::new_v4()))
}

fn remove_scratch(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

async fn fixture_on(config: DbConfig) -> Fixture {
    let db = Database::new(config).await.unwrap();

    let supplier = db
        .suppliers()
        .create(NewSupplier {
            name: "Green Valley Farm".into(),
            phone: None,
            address: None,
        })
        .await
        .unwrap();
    let customer = db
        .customers()
        .create(NewCustomer {
            name: "Corner Butcher".into(),
            phone: Some("0100".into()),
            address: None,
        })
        .await
        .unwrap();
    let broiler = db
        .chicken_types()
        .create(NewChickenType {
            name: "Broiler".into(),
            price: Money::from_cents(20),
            stock: 0,
        })
        .await
        .unwrap();
    let driver = db
        .employees()
        .create(NewEmployee {
            name: "Sam".into(),
            phone: None,
        })
        .await
        .unwrap();

    Fixture {
        db,
        supplier,
        customer,
        broiler,
        driver,
    }
}

impl Fixture {
    /// 100 birds, 500 kg net at 10 per kg.
    async fn load(&self) -> LoadingBatch {
        self.load_with(100, Weight::from_kg(500)).await
    }

    async fn load_with(&self, quantity: i64, net: Weight) -> LoadingBatch {
        self.db
            .loadings()
            .create(NewLoading {
                supplier_id: self.supplier.id.clone(),
                chicken_type: ChickenTypeRef::id(&self.broiler.id),
                recorded_by: Some(self.driver.id.clone()),
                quantity,
                weight: LoadingWeight::Net(net),
                unit_price: Money::from_cents(10),
                loading_date: Some(at(6)),
                notes: None,
            })
            .await
            .unwrap()
    }

    fn distribution(&self, quantity: i64, gross: Weight) -> NewDistribution {
        NewDistribution {
            customer_id: self.customer.id.clone(),
            chicken_type: ChickenTypeRef::name("Broiler"),
            recorded_by: Some(self.driver.id.clone()),
            quantity,
            gross_weight: gross,
            unit_price: Money::from_cents(20),
            distribution_date: Some(at(10)),
            notes: None,
        }
    }

    fn payment(&self, total: i64, paid: i64, discount: i64) -> NewPayment {
        NewPayment {
            customer_id: self.customer.id.clone(),
            recorded_by: Some(self.driver.id.clone()),
            total_price: Money::from_cents(total),
            paid_amount: Money::from_cents(paid),
            discount: Money::from_cents(discount),
            method: PaymentMethod::Cash,
            payment_date: Some(at(12)),
            notes: None,
        }
    }

    async fn batch(&self, id: &str) -> LoadingBatch {
        self.db.loadings().get_by_id(id).await.unwrap().unwrap()
    }

    async fn debt(&self) -> Money {
        self.db.customers().outstanding_debt(&self.customer.id).await.unwrap()
    }
}

// =============================================================================
// Loadings
// =============================================================================

#[tokio::test]
async fn test_loading_derives_cost_and_books_stock() {
    let fx = fixture().await;
    let batch = fx.load().await;

    assert_eq!(batch.total_cost(), Money::from_cents(5000));
    assert_eq!(batch.remaining_quantity, 100);
    assert_eq!(batch.remaining_net_weight(), Weight::from_kg(500));
    assert_eq!(batch.distributed_quantity, 0);
    assert_eq!(batch.version, 1);

    let broiler = fx.db.chicken_types().get_by_id(&fx.broiler.id).await.unwrap().unwrap();
    assert_eq!(broiler.stock, -100);
}

#[tokio::test]
async fn test_loading_with_unknown_supplier_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .db
        .loadings()
        .create(NewLoading {
            supplier_id: uuid::Uuid::new_v4().to_string(),
            chicken_type: ChickenTypeRef::id(&fx.broiler.id),
            recorded_by: None,
            quantity: 10,
            weight: LoadingWeight::Net(Weight::from_kg(50)),
            unit_price: Money::from_cents(10),
            loading_date: None,
            notes: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_loading_update_with_stale_version_conflicts() {
    let fx = fixture().await;
    let batch = fx.load().await;

    let updated = fx
        .db
        .loadings()
        .update(
            &batch.id,
            LoadingPatch {
                unit_price: Some(Money::from_cents(12)),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.total_cost(), Money::from_cents(6000));

    let err = fx
        .db
        .loadings()
        .update(
            &batch.id,
            LoadingPatch {
                unit_price: Some(Money::from_cents(11)),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.kind().is_retryable());
}

#[tokio::test]
async fn test_loading_cannot_shrink_below_distributed() {
    let fx = fixture().await;
    let batch = fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    let err = fx
        .db
        .loadings()
        .update(
            &batch.id,
            LoadingPatch {
                quantity: Some(20),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_loading_delete_in_use_is_rejected() {
    let fx = fixture().await;
    let batch = fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    let err = fx.db.loadings().delete(&batch.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(fx.db.loadings().get_by_id(&batch.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_loading_delete_restores_stock() {
    let fx = fixture().await;
    let batch = fx.load().await;

    fx.db.loadings().delete(&batch.id).await.unwrap();

    assert!(fx.db.loadings().get_by_id(&batch.id).await.unwrap().is_none());
    let broiler = fx.db.chicken_types().get_by_id(&fx.broiler.id).await.unwrap().unwrap();
    assert_eq!(broiler.stock, 0);
}

// =============================================================================
// Distributions and debt
// =============================================================================

#[tokio::test]
async fn test_distribution_consumes_batch_and_adds_debt() {
    let fx = fixture().await;
    let batch = fx.load().await;

    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    assert_eq!(dist.net_weight(), Weight::from_kg(60));
    assert_eq!(dist.total_amount(), Money::from_cents(1200));
    assert_eq!(dist.loading_id.as_deref(), Some(batch.id.as_str()));
    assert_eq!(dist.allocated_quantity, 30);
    assert_eq!(dist.shortage_quantity, 0);

    let batch = fx.batch(&batch.id).await;
    assert_eq!(batch.remaining_quantity, 70);
    assert_eq!(batch.remaining_net_weight(), Weight::from_kg(440));
    assert_eq!(batch.version, 2);

    assert_eq!(fx.debt().await, Money::from_cents(1200));
}

#[tokio::test]
async fn test_payment_restates_debt_and_later_distributions_add() {
    let fx = fixture().await;
    fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    let payment = fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();
    assert_eq!(payment.remaining_amount(), Money::from_cents(200));
    assert_eq!(payment.status, PaymentStatus::Partial);
    assert_eq!(fx.debt().await, Money::from_cents(200));

    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(1400));

    let settled = fx.db.payments().create(fx.payment(1400, 1400, 0)).await.unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);
    assert_eq!(fx.debt().await, Money::zero());

    // Dropping the latest payment falls back to the previous one's remainder
    fx.db.payments().delete(&settled.id).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(200));

    // and with no payment left the balance is cleared
    fx.db.payments().delete(&payment.id).await.unwrap();
    assert_eq!(fx.debt().await, Money::zero());
}

#[tokio::test]
async fn test_deleting_only_payment_clears_debt() {
    let fx = fixture().await;
    fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    let payment = fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(200));

    fx.db.payments().delete(&payment.id).await.unwrap();
    assert_eq!(fx.debt().await, Money::zero());

    assert!(fx.db.payments().get_by_id(&payment.id).await.unwrap().is_none());
    let err = fx.db.payments().delete(&payment.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleting_payment_restates_previous_remainder_only() {
    let fx = fixture().await;
    fx.load().await;
    let payments = fx.db.payments();

    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    payments.create(fx.payment(1200, 1000, 0)).await.unwrap();

    // a distribution between the two payments
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    let latest = payments.create(fx.payment(1400, 1300, 0)).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(100));

    payments.delete(&latest.id).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(200));
}

#[tokio::test]
async fn test_deleting_distribution_before_payment_reduces_debt() {
    let fx = fixture().await;
    let batch = fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(200));

    fx.db.distributions().delete(&dist.id).await.unwrap();

    // 200 − 1200, floored
    assert_eq!(fx.debt().await, Money::zero());
    assert_eq!(fx.batch(&batch.id).await.remaining_quantity, 100);
}

#[tokio::test]
async fn test_delete_and_recreate_round_trips_across_a_payment() {
    let fx = fixture().await;
    let batch = fx.load().await;
    let distributions = fx.db.distributions();

    let first = distributions.create(fx.distribution(30, Weight::from_kg(300))).await.unwrap();
    fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();
    distributions.create(fx.distribution(30, Weight::from_kg(300))).await.unwrap();

    let debt_before = fx.debt().await;
    let batch_before = fx.batch(&batch.id).await;
    assert_eq!(debt_before, Money::from_cents(1400));
    assert_eq!(batch_before.remaining_quantity, 40);

    distributions.delete(&first.id).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(200));
    assert_eq!(fx.batch(&batch.id).await.remaining_quantity, 70);

    distributions.create(fx.distribution(30, Weight::from_kg(300))).await.unwrap();

    let batch_after = fx.batch(&batch.id).await;
    assert_eq!(fx.debt().await, debt_before);
    assert_eq!(batch_after.remaining_quantity, batch_before.remaining_quantity);
    assert_eq!(batch_after.remaining_net_weight(), batch_before.remaining_net_weight());
}

#[tokio::test]
async fn test_repricing_distribution_before_payment_applies_delta() {
    let fx = fixture().await;
    fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();

    // 60 kg at 25 instead of 20: +300
    fx.db
        .distributions()
        .update(
            &dist.id,
            DistributionPatch {
                unit_price: Some(Money::from_cents(25)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(500));
}

#[tokio::test]
async fn test_debt_journal_replays_to_cached_balance() {
    let fx = fixture().await;
    fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    let payment = fx.db.payments().create(fx.payment(1200, 1000, 0)).await.unwrap();
    fx.db.distributions().delete(&dist.id).await.unwrap();
    fx.db.payments().delete(&payment.id).await.unwrap();

    let entries = fx.db.customers().debt_entries(&fx.customer.id).await.unwrap();
    assert_eq!(
        entries,
        vec![
            DebtEntry::Adjust(Money::from_cents(1200)),
            DebtEntry::Restate(Money::from_cents(200)),
            DebtEntry::Adjust(Money::from_cents(-1200)),
            DebtEntry::Restate(Money::zero()),
        ]
    );

    let cached = fx.debt().await;
    let replayed = fx.db.customers().recompute_outstanding(&fx.customer.id).await.unwrap();
    assert_eq!(replayed, cached);
}

#[tokio::test]
async fn test_payment_update_resettles() {
    let fx = fixture().await;
    let payment = fx.db.payments().create(fx.payment(1000, 400, 0)).await.unwrap();
    assert_eq!(fx.debt().await, Money::from_cents(600));

    let updated = fx
        .db
        .payments()
        .update(
            &payment.id,
            PaymentPatch {
                paid_amount: Some(Money::from_cents(900)),
                discount: Some(Money::from_cents(100)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.remaining_amount(), Money::zero());
    assert_eq!(updated.status, PaymentStatus::Completed);
    assert_eq!(fx.debt().await, Money::zero());
}

#[tokio::test]
async fn test_over_distribution_is_booked_as_waste() {
    let fx = fixture().await;
    let batch = fx.load_with(10, Weight::from_kg(100)).await;

    // 15 birds, 150 kg gross → 30 kg net; only 10 birds are in stock
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(15, Weight::from_kg(150)))
        .await
        .unwrap();

    assert_eq!(dist.allocated_quantity, 10);
    assert_eq!(dist.shortage_quantity, 5);
    assert_eq!(dist.total_amount(), Money::from_cents(600));

    let batch = fx.batch(&batch.id).await;
    assert_eq!(batch.remaining_quantity, 0);
    assert_eq!(batch.remaining_net_weight(), Weight::from_kg(70));

    let waste = fx.db.waste().for_date(day()).await.unwrap();
    assert_eq!(waste.entries.len(), 1);
    assert_eq!(waste.entries[0].over_distribution_quantity, 5);
    assert_eq!(waste.total_quantity, 5);
}

#[tokio::test]
async fn test_distribution_without_stock_is_all_shortage() {
    let fx = fixture().await;

    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(5, Weight::from_kg(50)))
        .await
        .unwrap();

    assert!(dist.loading_id.is_none());
    assert_eq!(dist.allocated_quantity, 0);
    assert_eq!(dist.shortage_quantity, 5);
    assert_eq!(fx.debt().await, dist.total_amount());

    let waste = fx.db.waste().for_date(day()).await.unwrap();
    assert_eq!(waste.entries[0].over_distribution_net_weight_grams, Weight::from_kg(10).grams());
}

#[tokio::test]
async fn test_distribution_update_beyond_headroom_fails() {
    let fx = fixture().await;
    let batch = fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    let err = fx
        .db
        .distributions()
        .update(
            &dist.id,
            DistributionPatch {
                quantity: Some(120),
                gross_weight: Some(Weight::from_kg(1200)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientInventory);

    // Nothing moved
    let batch = fx.batch(&batch.id).await;
    assert_eq!(batch.remaining_quantity, 70);
    assert_eq!(fx.debt().await, Money::from_cents(1200));
}

#[tokio::test]
async fn test_distribution_update_rebooks_batch_and_debt() {
    let fx = fixture().await;
    let batch = fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    // 40 birds, 400 kg gross → 80 kg net
    let updated = fx
        .db
        .distributions()
        .update(
            &dist.id,
            DistributionPatch {
                quantity: Some(40),
                gross_weight: Some(Weight::from_kg(400)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.allocated_quantity, 40);
    assert_eq!(updated.total_amount(), Money::from_cents(1600));

    let batch = fx.batch(&batch.id).await;
    assert_eq!(batch.remaining_quantity, 60);
    assert_eq!(batch.remaining_net_weight(), Weight::from_kg(420));
    assert_eq!(fx.debt().await, Money::from_cents(1600));
}

#[tokio::test]
async fn test_distribution_delete_restores_batch_and_debt() {
    let fx = fixture().await;
    let batch = fx.load().await;
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    fx.db.distributions().delete(&dist.id).await.unwrap();

    let batch = fx.batch(&batch.id).await;
    assert_eq!(batch.remaining_quantity, 100);
    assert_eq!(batch.remaining_net_weight(), Weight::from_kg(500));
    assert_eq!(batch.distributed_quantity, 0);
    assert_eq!(fx.debt().await, Money::zero());

    let err = fx.db.distributions().delete(&dist.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_distribution_picks_batch_with_most_remaining() {
    let fx = fixture().await;
    fx.load_with(20, Weight::from_kg(100)).await;
    let larger = fx.load_with(50, Weight::from_kg(250)).await;

    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(10, Weight::from_kg(100)))
        .await
        .unwrap();

    assert_eq!(dist.loading_id.as_deref(), Some(larger.id.as_str()));
}

#[tokio::test]
async fn test_daily_net_weight() {
    let fx = fixture().await;
    fx.load().await;
    let distributions = fx.db.distributions();
    distributions.create(fx.distribution(10, Weight::from_kg(100))).await.unwrap();
    distributions.create(fx.distribution(5, Weight::from_kg(50))).await.unwrap();

    let daily = distributions.daily_net_weight(day()).await.unwrap();
    assert_eq!(daily.count, 2);
    assert_eq!(daily.total_net_weight, Weight::from_kg(30));
}

// =============================================================================
// Reporting
// =============================================================================

#[tokio::test]
async fn test_stock_snapshot_and_upsert() {
    let fx = fixture().await;
    fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();

    let snapshot = fx.db.stock().snapshot(day()).await.unwrap();
    assert_eq!(snapshot.net_loading_weight, Weight::from_kg(500));
    assert_eq!(snapshot.net_distribution_weight, Weight::from_kg(60));
    assert_eq!(snapshot.result, Weight::from_kg(440));
    assert!(!snapshot.persisted);

    let saved = fx
        .db
        .stock()
        .upsert(day(), Weight::from_kg(40), Some("spoiled".into()))
        .await
        .unwrap();
    assert_eq!(saved.result(), Weight::from_kg(400));

    // Replaces, never accumulates
    let saved = fx.db.stock().upsert(day(), Weight::from_kg(10), None).await.unwrap();
    assert_eq!(saved.result(), Weight::from_kg(430));

    let snapshot = fx.db.stock().snapshot(day()).await.unwrap();
    assert!(snapshot.persisted);
    assert_eq!(snapshot.admin_adjustment, Weight::from_kg(10));
    assert_eq!(snapshot.result, Weight::from_kg(430));
}

#[tokio::test]
async fn test_daily_profit() {
    let fx = fixture().await;
    fx.load().await;
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    fx.db.payments().create(fx.payment(1200, 1150, 50)).await.unwrap();
    fx.db
        .expenses()
        .create(NewExpense {
            employee_id: fx.driver.id.clone(),
            name: "Fuel".into(),
            value: Money::from_cents(100),
            expense_date: Some(at(9)),
        })
        .await
        .unwrap();
    fx.db
        .waste()
        .upsert(WasteEntry {
            date: day(),
            chicken_type: ChickenTypeRef::id(&fx.broiler.id),
            over_distribution_quantity: 0,
            over_distribution_net_weight: Weight::zero(),
            other_waste_quantity: 1,
            other_waste_net_weight: Weight::from_kg(5),
            notes: None,
        })
        .await
        .unwrap();

    let profit = fx.db.reports().daily_profit(day()).await.unwrap();
    let b = profit.breakdown;
    assert_eq!(b.revenue, Money::from_cents(1200));
    assert_eq!(b.loading_cost, Money::from_cents(5000));
    assert_eq!(b.expenses, Money::from_cents(100));
    assert_eq!(b.discounts, Money::from_cents(50));
    assert_eq!(b.waste_cost, Money::from_cents(100));
    assert_eq!(b.profit, Money::from_cents(1200 - 5000 - 100 - 50 - 100));

    let other_day = fx.db.reports().daily_profit(day().succ_opt().unwrap()).await.unwrap();
    assert_eq!(other_day.breakdown.profit, Money::zero());

    let history = fx.db.reports().weekly_profit(day()).await.unwrap();
    assert_eq!(history.days.len(), 1);
    assert_eq!(history.total, b);
}

#[tokio::test]
async fn test_profit_history_rejects_inverted_range() {
    let fx = fixture().await;
    let err = fx
        .db
        .reports()
        .profit_history(Some(day()), day().pred_opt())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// =============================================================================
// Staff cash
// =============================================================================

#[tokio::test]
async fn test_transfer_checks_cash_on_hand() {
    let fx = fixture().await;
    let office = fx
        .db
        .employees()
        .create(NewEmployee {
            name: "Office".into(),
            phone: None,
        })
        .await
        .unwrap();

    fx.db.payments().create(fx.payment(1000, 1000, 0)).await.unwrap();
    fx.db
        .expenses()
        .create(NewExpense {
            employee_id: fx.driver.id.clone(),
            name: "Fuel".into(),
            value: Money::from_cents(100),
            expense_date: None,
        })
        .await
        .unwrap();

    let transfers = fx.db.transfers();
    let err = transfers
        .create(NewTransfer {
            from_employee_id: fx.driver.id.clone(),
            to_employee_id: office.id.clone(),
            amount: Money::from_cents(1000),
            note: None,
            transfer_date: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    transfers
        .create(NewTransfer {
            from_employee_id: fx.driver.id.clone(),
            to_employee_id: office.id.clone(),
            amount: Money::from_cents(500),
            note: Some("end of shift".into()),
            transfer_date: None,
        })
        .await
        .unwrap();

    let driver = transfers.cash_position(&fx.driver.id).await.unwrap();
    assert_eq!(driver.available, Money::from_cents(400));
    let office_position = transfers.cash_position(&office.id).await.unwrap();
    assert_eq!(office_position.available, Money::from_cents(500));

    let summary = transfers.summary(&office.id).await.unwrap();
    assert_eq!(summary.total_in, Money::from_cents(500));
    assert_eq!(summary.count_out, 0);
    assert_eq!(transfers.list(Some(fx.driver.id.as_str())).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_transfer_to_self_is_invalid() {
    let fx = fixture().await;
    let err = fx
        .db
        .transfers()
        .create(NewTransfer {
            from_employee_id: fx.driver.id.clone(),
            to_employee_id: fx.driver.id.clone(),
            amount: Money::from_cents(1),
            note: None,
            transfer_date: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// =============================================================================
// Tenancy
// =============================================================================

#[tokio::test]
async fn test_tenants_do_not_see_each_other() {
    let fx = fixture().await;
    fx.load().await;

    let other = fx.db.for_tenant(uuid::Uuid::new_v4().to_string());

    assert!(other.customers().get_by_id(&fx.customer.id).await.unwrap().is_none());
    assert!(other.loadings().list(&Default::default()).await.unwrap().is_empty());

    // Names are unique per tenant only
    other
        .chicken_types()
        .create(NewChickenType {
            name: "Broiler".into(),
            price: Money::from_cents(25),
            stock: 0,
        })
        .await
        .unwrap();

    let err = other
        .payments()
        .create(fx.payment(100, 100, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Concurrency and best-effort side effects
// =============================================================================

#[tokio::test]
async fn test_distribution_blocked_by_another_writer_conflicts() {
    let path = scratch_file();
    let fx = fixture_on(
        DbConfig::new(&path)
            .max_connections(2)
            .busy_timeout(Duration::from_millis(100)),
    )
    .await;
    let batch = fx.load().await;

    // another writer holds the batch mid-transaction
    let mut writer = fx.db.pool().begin().await.unwrap();
    sqlx::query("UPDATE loadings SET version = version + 1 WHERE id = ?1")
        .bind(&batch.id)
        .execute(&mut *writer)
        .await
        .unwrap();

    let err = fx
        .db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.kind().is_retryable());

    writer.commit().await.unwrap();

    // nothing from the rejected attempt survived
    let after = fx.batch(&batch.id).await;
    assert_eq!(after.remaining_quantity, 100);
    assert_eq!(after.version, 2);
    assert_eq!(fx.debt().await, Money::zero());

    // a retry goes through
    fx.db
        .distributions()
        .create(fx.distribution(30, Weight::from_kg(300)))
        .await
        .unwrap();
    assert_eq!(fx.batch(&batch.id).await.remaining_quantity, 70);

    fx.db.close().await;
    remove_scratch(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_distributions_never_overcommit_a_batch() {
    let path = scratch_file();
    let fx = fixture_on(
        DbConfig::new(&path)
            .max_connections(2)
            .busy_timeout(Duration::from_millis(200)),
    )
    .await;
    let batch = fx.load().await;

    // 60 birds each against 100 in stock
    let first = fx.db.distributions();
    let second = fx.db.distributions();
    let (a, b) = tokio::join!(
        first.create(fx.distribution(60, Weight::from_kg(600))),
        second.create(fx.distribution(60, Weight::from_kg(600))),
    );

    let mut committed = Vec::new();
    for result in [a, b] {
        match result {
            Ok(dist) => committed.push(dist),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
        }
    }
    assert!(!committed.is_empty());

    let allocated: i64 = committed.iter().map(|d| d.allocated_quantity).sum();
    let charged: Money = committed.iter().map(|d| d.total_amount()).sum();
    let after = fx.batch(&batch.id).await;
    assert!(allocated <= 100);
    assert_eq!(after.distributed_quantity, allocated);
    assert_eq!(after.remaining_quantity, 100 - allocated);
    assert_eq!(fx.debt().await, charged);

    fx.db.close().await;
    remove_scratch(&path);
}

#[tokio::test]
async fn test_failed_waste_booking_keeps_distribution() {
    let fx = fixture().await;
    fx.load_with(10, Weight::from_kg(100)).await;

    sqlx::query("DROP TABLE daily_waste")
        .execute(fx.db.pool())
        .await
        .unwrap();

    // 5 birds short, and nowhere to book them
    let dist = fx
        .db
        .distributions()
        .create(fx.distribution(15, Weight::from_kg(150)))
        .await
        .unwrap();
    assert_eq!(dist.shortage_quantity, 5);

    let stored = fx.db.distributions().get_by_id(&dist.id).await.unwrap().unwrap();
    assert_eq!(stored.shortage_quantity, 5);
    assert_eq!(stored.allocated_quantity, 10);
    assert_eq!(fx.debt().await, dist.total_amount());
}
