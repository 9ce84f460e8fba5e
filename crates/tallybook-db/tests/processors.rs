//! End-to-end tests for the sale, purchase and production processors
//! against an in-memory database.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use tallybook_core::{
    DateRange, MaterialDetails, Money, NewCompositionLine, NewMaterial, NewPaymentMethod,
    NewProduct, NewProduction, NewPurchase, NewPurchaseLine, NewSale, NewSaleLine, ProductDetails,
    Quantity, Rate, StockKind, TransactionStatus, TransactionType, UnitOfMeasure, ValidationError,
};
use tallybook_db::{Database, DbConfig, DbError, ErrorCode, ProcessError};

// =============================================================================
// Fixtures
// =============================================================================

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn material(db: &Database, name: &str, cost_cents: i64, stock: Quantity) -> String {
    db.materials()
        .create(&NewMaterial {
            details: MaterialDetails {
                name: name.to_string(),
                unit: UnitOfMeasure::Unit,
                current_cost: Money::from_cents(cost_cents),
            },
            initial_stock: stock,
        })
        .await
        .unwrap()
        .id
}

async fn product(
    db: &Database,
    name: &str,
    price_cents: i64,
    stock: Quantity,
    composition: Vec<NewCompositionLine>,
) -> String {
    db.products()
        .create(&NewProduct {
            details: ProductDetails::named(name, Money::from_cents(price_cents)),
            initial_stock: stock,
            composition,
        })
        .await
        .unwrap()
        .id
}

async fn payment_method(db: &Database, name: &str, fee_bps: u32) -> String {
    db.payment_methods()
        .create(&NewPaymentMethod {
            name: name.to_string(),
            fee_rate: Rate::from_bps(fee_bps),
        })
        .await
        .unwrap()
        .id
}

async fn product_stock(db: &Database, id: &str) -> Quantity {
    db.products().get(id).await.unwrap().unwrap().stock()
}

async fn material_stock(db: &Database, id: &str) -> Quantity {
    db.materials().get(id).await.unwrap().unwrap().stock()
}

fn sale(method_id: &str, lines: &[(&str, i64, i64)]) -> NewSale {
    NewSale {
        payment_method_id: method_id.to_string(),
        customer_name: None,
        customer_phone: None,
        lines: lines
            .iter()
            .map(|(product_id, units, price_cents)| NewSaleLine {
                product_id: product_id.to_string(),
                quantity: Quantity::from_units(*units),
                unit_price: Money::from_cents(*price_cents),
            })
            .collect(),
    }
}

fn purchase(freight_cents: i64, lines: &[(&str, i64, i64)]) -> NewPurchase {
    NewPurchase {
        supplier: Some("Fabric & Co".to_string()),
        purchase_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        freight_cost: Money::from_cents(freight_cents),
        lines: lines
            .iter()
            .map(|(material_id, units, cost_cents)| NewPurchaseLine {
                material_id: material_id.to_string(),
                quantity: Quantity::from_units(*units),
                unit_cost: Money::from_cents(*cost_cents),
            })
            .collect(),
    }
}

fn composition(material_id: &str, per_unit: Quantity) -> NewCompositionLine {
    NewCompositionLine {
        material_id: material_id.to_string(),
        quantity: per_unit,
    }
}

fn units(n: i64) -> Quantity {
    Quantity::from_units(n)
}

// =============================================================================
// Purchases
// =============================================================================

#[tokio::test]
async fn test_purchase_freight_sets_effective_cost() {
    let db = setup().await;
    let thread = material(&db, "Blue Thread", 200, units(10)).await;

    let record = db
        .purchase_processor()
        .create_purchase(&purchase(1000, &[(&thread, 10, 200)]))
        .await
        .unwrap();

    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].freight_share_cents, 1000);
    assert_eq!(record.items[0].effective_unit_cost_cents, 300);
    assert_eq!(record.purchase.total_amount_cents, 3000);

    let thread_row = db.materials().get(&thread).await.unwrap().unwrap();
    assert_eq!(thread_row.current_cost_cents, 300);
    assert_eq!(thread_row.stock(), units(20));
}

#[tokio::test]
async fn test_purchase_freight_shares_sum_exactly() {
    let db = setup().await;
    let a = material(&db, "Screw", 15, units(0)).await;
    let b = material(&db, "Plank", 800, units(0)).await;
    let c = material(&db, "Glue", 1200, units(0)).await;

    // Subtotals 1.00 / 1.00 / 1.00, freight 1.00 → 34 + 33 + 33
    let record = db
        .purchase_processor()
        .create_purchase(&purchase(100, &[(&a, 1, 100), (&b, 1, 100), (&c, 1, 100)]))
        .await
        .unwrap();

    let shares: Vec<i64> = record.items.iter().map(|i| i.freight_share_cents).collect();
    assert_eq!(shares.iter().sum::<i64>(), 100);
    assert_eq!(shares, vec![34, 33, 33]);

    let line_costs: i64 = record
        .items
        .iter()
        .map(|i| i.subtotal().unwrap().cents() + i.freight_share_cents)
        .sum();
    assert_eq!(line_costs, record.purchase.total_amount_cents);
}

#[tokio::test]
async fn test_purchase_last_line_sets_cost() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(0)).await;

    db.purchase_processor()
        .create_purchase(&purchase(0, &[(&screw, 100, 10), (&screw, 50, 20)]))
        .await
        .unwrap();

    let row = db.materials().get(&screw).await.unwrap().unwrap();
    assert_eq!(row.stock(), units(150));
    assert_eq!(row.current_cost_cents, 20);
}

#[tokio::test]
async fn test_purchase_of_free_lines_is_not_prorated() {
    let db = setup().await;
    let sample = material(&db, "Sample Fabric", 0, units(0)).await;

    let record = db
        .purchase_processor()
        .create_purchase(&purchase(500, &[(&sample, 3, 0)]))
        .await
        .unwrap();

    assert_eq!(record.items[0].freight_share_cents, 0);
    assert_eq!(record.items[0].effective_unit_cost_cents, 0);
    assert_eq!(record.purchase.total_amount_cents, 500);
    assert_eq!(material_stock(&db, &sample).await, units(3));
}

#[tokio::test]
async fn test_purchase_unknown_material_rolls_back() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(5)).await;
    let ghost = Uuid::new_v4().to_string();

    let err = db
        .purchase_processor()
        .create_purchase(&purchase(100, &[(&screw, 10, 15), (&ghost, 1, 100)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(material_stock(&db, &screw).await, units(5));
    assert!(db.purchases().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_listing_and_lookup() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(0)).await;

    let mut older = purchase(0, &[(&screw, 1, 15)]);
    older.purchase_date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let older = db.purchase_processor().create_purchase(&older).await.unwrap();
    let newer = db
        .purchase_processor()
        .create_purchase(&purchase(0, &[(&screw, 2, 15), (&screw, 3, 16)]))
        .await
        .unwrap();

    let ids: Vec<String> = db.purchases().list().await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newer.purchase.id.clone(), older.purchase.id]);

    let fetched = db.purchases().get(&newer.purchase.id).await.unwrap().unwrap();
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.items[0].quantity(), units(2));
    assert_eq!(fetched.items[1].unit_cost_cents, 16);
    assert_eq!(fetched.purchase.supplier.as_deref(), Some("Fabric & Co"));
}

#[tokio::test]
async fn test_purchase_rejects_empty_lines() {
    let db = setup().await;
    let err = db
        .purchase_processor()
        .create_purchase(&purchase(100, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidInput(_)));
}

#[tokio::test]
async fn test_purchase_too_large_to_price_changes_nothing() {
    let db = setup().await;
    let thread = material(&db, "Blue Thread", 200, units(10)).await;

    // 1e9 units at 1e11 per unit does not fit in cents
    let err = db
        .purchase_processor()
        .create_purchase(&purchase(100, &[(&thread, 1_000_000_000, 10_000_000_000_000)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProcessError::InvalidInput(ValidationError::TooLarge { ref field }) if field == "lines[0].subtotal"
    ));
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let thread_row = db.materials().get(&thread).await.unwrap().unwrap();
    assert_eq!(thread_row.stock(), units(10));
    assert_eq!(thread_row.current_cost_cents, 200);
    assert!(db.purchases().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_past_stock_ceiling_changes_nothing() {
    let db = setup().await;
    let thread = material(&db, "Blue Thread", 200, Quantity::from_milli(i64::MAX - 500)).await;

    let err = db
        .purchase_processor()
        .create_purchase(&purchase(0, &[(&thread, 1, 200)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));

    assert_eq!(material_stock(&db, &thread).await, Quantity::from_milli(i64::MAX - 500));
    assert!(db.purchases().list().await.unwrap().is_empty());
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn test_sale_beyond_stock_is_rejected() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 6, 2000)]))
        .await
        .unwrap_err();

    match err {
        ProcessError::InsufficientStock {
            kind,
            id,
            name,
            available,
            requested,
        } => {
            assert_eq!(kind, StockKind::Product);
            assert_eq!(id, mug);
            assert_eq!(name, "Mug");
            assert_eq!(available, units(5));
            assert_eq!(requested, units(6));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(product_stock(&db, &mug).await, units(5));
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db.finance().list(DateRange::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_credit_sale_is_net_of_fee_and_pending() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let card = payment_method(&db, "Credit Card", 500).await;

    let receipt = db
        .sale_processor()
        .create_sale(&sale(&card, &[(&mug, 2, 2000)]))
        .await
        .unwrap();

    assert_eq!(receipt.sale.total_amount_cents, 4000);
    assert_eq!(receipt.items[0].subtotal_cents, 4000);
    assert_eq!(receipt.settlement.fee.cents(), 200);

    let entry = &receipt.transaction;
    assert_eq!(entry.amount_cents, 3800);
    assert_eq!(entry.transaction_type, TransactionType::Revenue);
    assert_eq!(entry.status, TransactionStatus::Pending);

    let sale_date = receipt.sale.created_at.date_naive();
    assert_eq!(entry.competence_date, sale_date);
    assert_eq!(entry.due_date, sale_date.checked_add_days(Days::new(30)).unwrap());
    assert!(entry.description.contains(&receipt.sale.id));
    assert!(entry.description.contains("Walk-in customer"));
    assert!(entry.description.contains("fee 5% (2.00)"));

    assert_eq!(product_stock(&db, &mug).await, units(3));

    let stored = db.finance().get_for_sale(&receipt.sale.id).await.unwrap().unwrap();
    assert_eq!(&stored, entry);
}

#[tokio::test]
async fn test_cash_sale_is_paid_on_the_day() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let mut new = sale(&cash, &[(&mug, 1, 2000)]);
    new.customer_name = Some("  Maria ".to_string());
    let receipt = db.sale_processor().create_sale(&new).await.unwrap();

    let entry = &receipt.transaction;
    assert_eq!(entry.status, TransactionStatus::Paid);
    assert_eq!(entry.due_date, entry.competence_date);
    assert_eq!(entry.amount_cents, 2000);
    assert_eq!(
        entry.description,
        format!("Sale #{} - Maria", receipt.sale.id)
    );
    assert_eq!(receipt.sale.customer_name.as_deref(), Some("Maria"));
}

#[tokio::test]
async fn test_revenue_is_total_minus_rounded_fee() {
    let db = setup().await;
    let vase = product(&db, "Vase", 3333, units(100), vec![]).await;

    for (i, bps) in [0u32, 199, 499, 1000, 3333, 10_000].into_iter().enumerate() {
        let method = payment_method(&db, &format!("Method {i}"), bps).await;
        let receipt = db
            .sale_processor()
            .create_sale(&sale(&method, &[(&vase, 3, 3333)]))
            .await
            .unwrap();

        let total = receipt.sale.total_amount();
        let fee = total.checked_percentage(Rate::from_bps(bps)).unwrap();
        assert_eq!(total.cents(), 9999);
        assert_eq!(receipt.transaction.amount(), total - fee, "rate {bps} bps");
        assert_eq!(receipt.settlement.fee + receipt.settlement.net, total);
    }
}

#[tokio::test]
async fn test_fractional_quantities_round_to_the_cent() {
    let db = setup().await;
    let fabric = product(&db, "Fabric by the meter", 1999, units(10), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let new = NewSale {
        payment_method_id: cash,
        customer_name: None,
        customer_phone: None,
        lines: vec![NewSaleLine {
            product_id: fabric.clone(),
            quantity: Quantity::from_milli(1_250),
            unit_price: Money::from_cents(1999),
        }],
    };
    let receipt = db.sale_processor().create_sale(&new).await.unwrap();

    // 1.25 × 19.99 = 24.9875 → 24.99
    assert_eq!(receipt.items[0].subtotal_cents, 2499);
    assert_eq!(product_stock(&db, &fabric).await, Quantity::from_milli(8_750));
}

#[tokio::test]
async fn test_sale_is_all_or_nothing() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let plate = product(&db, "Plate", 3500, units(1), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 2, 2000), (&plate, 2, 3500)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert_eq!(product_stock(&db, &mug).await, units(5));
    assert_eq!(product_stock(&db, &plate).await, units(1));
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_product_lines_are_summed() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 3, 2000), (&mug, 3, 1800)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InsufficientStock { requested, .. } if requested == units(6)));

    let receipt = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 3, 2000), (&mug, 2, 1800)]))
        .await
        .unwrap();
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.sale.total_amount_cents, 6000 + 3600);
    assert_eq!(product_stock(&db, &mug).await, units(0));
}

#[tokio::test]
async fn test_unknown_payment_method_rolls_back() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let ghost = Uuid::new_v4().to_string();

    let err = db
        .sale_processor()
        .create_sale(&sale(&ghost, &[(&mug, 1, 2000)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::NotFound { ref entity, .. } if entity == "PaymentMethod"));
    assert_eq!(product_stock(&db, &mug).await, units(5));
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let db = setup().await;
    let cash = payment_method(&db, "Cash", 0).await;
    let ghost = Uuid::new_v4().to_string();

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&ghost, 1, 100)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::NotFound { ref entity, .. } if entity == "Product"));
}

#[tokio::test]
async fn test_invalid_sale_payloads() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 0, 2000)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));

    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 1, -1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidInput(_)));

    let err = db.sale_processor().create_sale(&sale(&cash, &[])).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    assert_eq!(product_stock(&db, &mug).await, units(5));
}

#[tokio::test]
async fn test_identical_sales_are_recorded_twice() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;
    let new = sale(&cash, &[(&mug, 2, 2000)]);

    let first = db.sale_processor().create_sale(&new).await.unwrap();
    let second = db.sale_processor().create_sale(&new).await.unwrap();

    assert_ne!(first.sale.id, second.sale.id);
    assert_eq!(db.sales().count().await.unwrap(), 2);
    assert_eq!(product_stock(&db, &mug).await, units(1));
    assert_eq!(db.finance().list(DateRange::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_sale_lookup_and_delete_protection() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cup = product(&db, "Cup", 1500, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let receipt = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 1, 2000), (&cup, 2, 1500)]))
        .await
        .unwrap();

    let fetched = db.sales().get(&receipt.sale.id).await.unwrap().unwrap();
    assert_eq!(fetched.sale, receipt.sale);
    assert_eq!(fetched.items, receipt.items);
    assert_eq!(db.sales().list().await.unwrap().len(), 1);

    let err = db.products().delete(&mug).await.unwrap_err();
    assert!(matches!(err, DbError::DeleteProtected { .. }));
    assert_eq!(ProcessError::from(err).code(), ErrorCode::DeleteProtected);
}

#[tokio::test]
async fn test_sale_revenue_shows_in_cash_book_window() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let receipt = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 1, 2000)]))
        .await
        .unwrap();
    let today = receipt.transaction.competence_date;

    let same_day = DateRange {
        start: Some(today),
        end: Some(today),
    };
    let entries = db.finance().list(same_day).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sale_id.as_deref(), Some(receipt.sale.id.as_str()));

    let before = DateRange {
        start: None,
        end: today.checked_sub_days(Days::new(1)),
    };
    assert!(db.finance().list(before).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sale_demand_overflow_is_rejected() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    let half = Quantity::from_milli(i64::MAX / 2 + 1);
    let new = NewSale {
        payment_method_id: cash,
        customer_name: None,
        customer_phone: None,
        lines: vec![
            NewSaleLine {
                product_id: mug.clone(),
                quantity: half,
                unit_price: Money::zero(),
            },
            NewSaleLine {
                product_id: mug.clone(),
                quantity: half,
                unit_price: Money::zero(),
            },
        ],
    };

    let err = db.sale_processor().create_sale(&new).await.unwrap_err();
    assert!(matches!(
        err,
        ProcessError::InvalidQuantity { ref field, .. } if field == "lines[1].quantity"
    ));

    assert_eq!(product_stock(&db, &mug).await, units(5));
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db.finance().list(DateRange::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sale_amount_overflow_is_rejected() {
    let db = setup().await;
    let mug = product(&db, "Mug", 2000, units(5), vec![]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    // One line whose subtotal does not fit in cents
    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 1_000_000_000, 10_000_000_000_000)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProcessError::InvalidInput(ValidationError::TooLarge { ref field }) if field == "lines[0].subtotal"
    ));

    // Two lines that fit on their own but not summed
    let price = i64::MAX / 2 + 1;
    let err = db
        .sale_processor()
        .create_sale(&sale(&cash, &[(&mug, 1, price), (&mug, 1, price)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProcessError::InvalidInput(ValidationError::TooLarge { ref field }) if field == "total"
    ));
    assert_eq!(err.code(), ErrorCode::ValidationError);

    assert_eq!(product_stock(&db, &mug).await, units(5));
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db.finance().list(DateRange::default()).await.unwrap().is_empty());
}

// =============================================================================
// Production
// =============================================================================

#[tokio::test]
async fn test_production_short_on_material_changes_nothing() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(5)).await;
    let chair = product(&db, "Chair", 18_000, units(0), vec![composition(&screw, units(2))]).await;

    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: chair.clone(),
            quantity: units(3),
        })
        .await
        .unwrap_err();

    match err {
        ProcessError::InsufficientStock {
            kind,
            available,
            requested,
            ..
        } => {
            assert_eq!(kind, StockKind::Material);
            assert_eq!(available, units(5));
            assert_eq!(requested, units(6));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(material_stock(&db, &screw).await, units(5));
    assert_eq!(product_stock(&db, &chair).await, units(0));
}

#[tokio::test]
async fn test_production_consumes_bill_of_materials() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(5)).await;
    let plank = material(&db, "Plank", 800, units(10)).await;
    let chair = product(
        &db,
        "Chair",
        18_000,
        units(1),
        vec![
            composition(&screw, units(2)),
            composition(&plank, Quantity::from_milli(1_500)),
        ],
    )
    .await;

    let report = db
        .production_processor()
        .produce(&NewProduction {
            product_id: chair.clone(),
            quantity: units(2),
        })
        .await
        .unwrap();

    assert_eq!(report.produced, units(2));
    assert_eq!(report.new_stock, units(3));
    assert_eq!(report.consumption.len(), 2);

    assert_eq!(material_stock(&db, &screw).await, units(1));
    assert_eq!(material_stock(&db, &plank).await, units(7));
    assert_eq!(product_stock(&db, &chair).await, units(3));

    let screws = report
        .consumption
        .iter()
        .find(|c| c.material_id == screw)
        .unwrap();
    assert_eq!(screws.consumed, units(4));
    assert_eq!(screws.remaining, units(1));
}

#[tokio::test]
async fn test_fractional_production_from_text() {
    let db = setup().await;
    let clay = material(&db, "Clay", 1200, units(2)).await;
    let mug = product(&db, "Mug", 2000, units(0), vec![composition(&clay, Quantity::from_milli(400))]).await;

    let run = NewProduction::from_text(mug.clone(), "2.5").unwrap();
    let report = db.production_processor().produce(&run).await.unwrap();

    assert_eq!(report.new_stock, Quantity::from_milli(2_500));
    assert_eq!(material_stock(&db, &clay).await, Quantity::from_milli(1_000));

    let err = NewProduction::from_text(mug, "2.5001").map_err(ProcessError::from).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));
}

#[tokio::test]
async fn test_production_without_composition() {
    let db = setup().await;
    let spoon = product(&db, "Wooden Spoon", 900, units(4), vec![]).await;

    let report = db
        .production_processor()
        .produce(&NewProduction {
            product_id: spoon.clone(),
            quantity: units(6),
        })
        .await
        .unwrap();

    assert!(report.consumption.is_empty());
    assert_eq!(report.new_stock, units(10));
    assert_eq!(product_stock(&db, &spoon).await, units(10));
}

#[tokio::test]
async fn test_production_rejects_bad_input() {
    let db = setup().await;

    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: Uuid::new_v4().to_string(),
            quantity: units(1),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let spoon = product(&db, "Wooden Spoon", 900, units(4), vec![]).await;
    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: spoon,
            quantity: Quantity::from_milli(-500),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));
}

#[tokio::test]
async fn test_production_overflow_changes_nothing() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(5)).await;
    let chair = product(&db, "Chair", 18_000, units(0), vec![composition(&screw, units(2))]).await;

    // 2 screws per chair times i64::MAX milli chairs
    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: chair.clone(),
            quantity: Quantity::from_milli(i64::MAX),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));
    assert_eq!(material_stock(&db, &screw).await, units(5));
    assert_eq!(product_stock(&db, &chair).await, units(0));

    // A bill of materials of 1e9 screws per chair, 1e9 chairs
    let crate_of_screws = product(
        &db,
        "Screw Crate",
        100,
        units(0),
        vec![composition(&screw, units(1_000_000_000))],
    )
    .await;
    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: crate_of_screws.clone(),
            quantity: units(1_000_000_000),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));
    assert_eq!(material_stock(&db, &screw).await, units(5));
    assert_eq!(product_stock(&db, &crate_of_screws).await, units(0));
}

#[tokio::test]
async fn test_production_past_stock_ceiling_changes_nothing() {
    let db = setup().await;
    let spoon = product(&db, "Wooden Spoon", 900, Quantity::from_milli(i64::MAX - 500), vec![]).await;

    let err = db
        .production_processor()
        .produce(&NewProduction {
            product_id: spoon.clone(),
            quantity: units(1),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidQuantity { .. }));
    assert_eq!(product_stock(&db, &spoon).await, Quantity::from_milli(i64::MAX - 500));
}

#[tokio::test]
async fn test_requirement_rounding_to_zero_consumes_nothing() {
    let db = setup().await;
    let glue = material(&db, "Glue", 5, units(1)).await;
    let coaster = product(&db, "Coaster", 300, units(0), vec![composition(&glue, Quantity::from_milli(1))]).await;

    // 0.001 per coaster times 0.4 coasters rounds to 0.000
    let report = db
        .production_processor()
        .produce(&NewProduction {
            product_id: coaster.clone(),
            quantity: Quantity::from_milli(400),
        })
        .await
        .unwrap();

    assert_eq!(report.consumption.len(), 1);
    assert!(report.consumption[0].consumed.is_zero());
    assert_eq!(material_stock(&db, &glue).await, units(1));
    assert_eq!(product_stock(&db, &coaster).await, Quantity::from_milli(400));
}

#[tokio::test]
async fn test_stock_never_negative_across_operations() {
    let db = setup().await;
    let screw = material(&db, "Screw", 15, units(10)).await;
    let chair = product(&db, "Chair", 18_000, units(0), vec![composition(&screw, units(2))]).await;
    let cash = payment_method(&db, "Cash", 0).await;

    for _ in 0..8 {
        let _ = db
            .production_processor()
            .produce(&NewProduction {
                product_id: chair.clone(),
                quantity: units(2),
            })
            .await;
        let _ = db
            .sale_processor()
            .create_sale(&sale(&cash, &[(&chair, 3, 18_000)]))
            .await;
    }

    assert!(!material_stock(&db, &screw).await.is_negative());
    assert!(!product_stock(&db, &chair).await.is_negative());
    // 10 screws make 5 chairs
    assert_eq!(material_stock(&db, &screw).await, units(0));
}
