//! # Settlement Module
//!
//! Derives the cash-book entry a sale produces: the payment operator's fee
//! is deducted from the sale total, and the payment method decides whether
//! the money is already in hand or arrives later.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total T, method fee rate r                                             │
//! │     │                                                                   │
//! │     ├── fee = round(T × r / 100)        (half away from zero)           │
//! │     ├── net = T − fee                   → revenue amount                │
//! │     │                                                                   │
//! │     └── method name matches a deferred keyword ("credit", "crédito")?   │
//! │            ├── yes → pending, due = sale date + deferral days           │
//! │            └── no  → paid,    due = sale date                           │
//! │                                                                         │
//! │  sale date = sale timestamp in the business's UTC offset                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{Money, Rate};
use crate::types::{PaymentMethod, TransactionStatus};
use crate::validation::{validate_amount, validate_rate, ValidationResult};
use crate::WALK_IN_CUSTOMER;

/// Default keywords that mark a payment method as paid on credit terms.
pub const DEFAULT_DEFERRED_KEYWORDS: [&str; 2] = ["credit", "crédito"];

/// Default days between a credit sale and the money arriving.
pub const DEFAULT_DEFERRAL_DAYS: u32 = 30;

/// How sale proceeds are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPolicy {
    /// Lower-cased substrings; a payment method whose name contains any of
    /// them is deferred.
    pub deferred_keywords: Vec<String>,
    pub deferral_days: u32,
    /// Offset used to turn a sale timestamp into a calendar date.
    pub utc_offset: FixedOffset,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        SettlementPolicy {
            deferred_keywords: DEFAULT_DEFERRED_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            deferral_days: DEFAULT_DEFERRAL_DAYS,
            utc_offset: Utc.fix(),
        }
    }
}

impl SettlementPolicy {
    /// Replaces the keyword list. Keywords are trimmed and lower-cased;
    /// blank entries are dropped.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deferred_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn with_deferral_days(mut self, days: u32) -> Self {
        self.deferral_days = days;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Case-insensitive substring match of the method name against the
    /// deferred keywords.
    pub fn is_deferred(&self, method_name: &str) -> bool {
        let name = method_name.to_lowercase();
        self.deferred_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }

    /// Calendar date of `at` in the business's offset.
    pub fn business_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }
}

/// What a sale contributes to the cash-book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub total: Money,
    pub fee_rate: Rate,
    pub fee: Money,
    /// `total − fee`; the revenue amount recorded.
    pub net: Money,
    pub status: TransactionStatus,
    pub competence_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Settles a sale of `total` paid with `method` at `sold_at`.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tallybook_core::settlement::settle_sale;
/// use tallybook_core::{Money, PaymentMethod, SettlementPolicy, TransactionStatus};
///
/// let method = PaymentMethod {
///     id: "pm-1".into(),
///     name: "Credit Card".into(),
///     fee_rate_bps: 500,
///     created_at: Utc::now(),
/// };
/// let sold_at = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
/// let s = settle_sale(&SettlementPolicy::default(), Money::from_cents(4000), &method, sold_at)
///     .unwrap();
///
/// assert_eq!(s.fee.cents(), 200);
/// assert_eq!(s.net.cents(), 3800);
/// assert_eq!(s.status, TransactionStatus::Pending);
/// assert_eq!(s.due_date.to_string(), "2024-04-09");
/// ```
pub fn settle_sale(
    policy: &SettlementPolicy,
    total: Money,
    method: &PaymentMethod,
    sold_at: DateTime<Utc>,
) -> ValidationResult<Settlement> {
    validate_amount("total", total)?;
    let fee_rate = method.fee_rate();
    validate_rate("fee_rate", fee_rate)?;
    // 0 <= fee <= total for rates up to 100%
    let fee = total
        .checked_percentage(fee_rate)
        .ok_or_else(|| ValidationError::amount_too_large("fee"))?;
    let competence_date = policy.business_date(sold_at);

    let (status, due_date) = if policy.is_deferred(&method.name) {
        let due = competence_date
            .checked_add_days(Days::new(policy.deferral_days as u64))
            .unwrap_or(NaiveDate::MAX);
        (TransactionStatus::Pending, due)
    } else {
        (TransactionStatus::Paid, competence_date)
    };

    Ok(Settlement {
        total,
        fee_rate,
        fee,
        net: total - fee,
        status,
        competence_date,
        due_date,
    })
}

/// Cash-book description of a sale's revenue entry.
///
/// ```rust
/// use tallybook_core::settlement::describe_sale_revenue;
/// use tallybook_core::{Money, Rate};
///
/// assert_eq!(
///     describe_sale_revenue("abc", Some("Maria"), Rate::from_bps(500), Money::from_cents(200)),
///     "Sale #abc - Maria | fee 5% (2.00)"
/// );
/// assert_eq!(
///     describe_sale_revenue("abc", None, Rate::zero(), Money::zero()),
///     "Sale #abc - Walk-in customer"
/// );
/// ```
pub fn describe_sale_revenue(
    sale_id: &str,
    customer_name: Option<&str>,
    fee_rate: Rate,
    fee: Money,
) -> String {
    let customer = customer_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(WALK_IN_CUSTOMER);

    let mut description = format!("Sale #{} - {}", sale_id, customer);
    if fee.is_positive() {
        description.push_str(&format!(" | fee {} ({})", fee_rate, fee));
    }
    description
}

// =============================================================================
// Unit Tests
// =============================================================================
