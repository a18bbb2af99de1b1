use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use billbook_core::CustomerId;
use billbook_payments::PaymentReceived;
use billbook_sales::Sale;

/// Reporting window for a customer statement, resolved against an explicit
/// `now` so projections stay deterministic under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementWindow {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    AllTime,
}

impl StatementWindow {
    /// Inclusive start of the window, or `None` for the full history.
    ///
    /// Day boundaries are UTC midnight; weeks start on Monday.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let start_date = match self {
            StatementWindow::Today => Some(today),
            StatementWindow::ThisWeek => Some(today.week(Weekday::Mon).first_day()),
            StatementWindow::ThisMonth => today.with_day(1),
            StatementWindow::ThisYear => today.with_ordinal(1),
            StatementWindow::AllTime => None,
        };
        start_date.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }
}

/// One statement line: a sale (debit) or a received payment (credit), with
/// the running balance re-based onto the window's opening balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub occurred_at: DateTime<Utc>,
    /// Bill number for sales, method label for payments.
    pub reference: String,
    pub debit: i64,
    pub credit: i64,
    pub balance: i64,
}

/// A chronologically ordered statement for one customer and window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatement {
    /// Running balance carried into the window from prior history
    /// (0 when the window covers all time).
    pub opening_balance: i64,
    pub entries: Vec<LedgerEntry>,
    /// `opening_balance + Σdebit − Σcredit` over the window; equals the
    /// full-history running balance at the window's end.
    pub closing_balance: i64,
}

struct RawEvent {
    occurred_at: DateTime<Utc>,
    seq: u64,
    reference: String,
    debit: i64,
    credit: i64,
}

/// Project a customer's running-balance statement.
///
/// Two passes over one sorted event list: the full history establishes the
/// opening balance for the window, then entries at or after the window start
/// are re-accumulated from that opening balance. Filtering first and running
/// the recurrence from zero would silently drop prior debt.
pub fn project_statement(
    customer_id: CustomerId,
    sales: &[Sale],
    payments: &[PaymentReceived],
    window: StatementWindow,
    now: DateTime<Utc>,
) -> LedgerStatement {
    let mut events: Vec<RawEvent> = Vec::new();

    for sale in sales {
        if sale.customer_id() == Some(customer_id) {
            events.push(RawEvent {
                occurred_at: sale.occurred_at(),
                seq: sale.seq(),
                reference: sale.bill_no().to_string(),
                debit: sale.total_amount(),
                credit: 0,
            });
        }
    }
    for payment in payments {
        if payment.customer_id() == customer_id {
            events.push(RawEvent {
                occurred_at: payment.occurred_at(),
                seq: payment.seq(),
                reference: format!("Payment ({})", payment.method()),
                debit: 0,
                credit: payment.amount(),
            });
        }
    }

    // seq is the engine's insertion order: ties on identical timestamps
    // resolve the same way every time.
    events.sort_by_key(|e| (e.occurred_at, e.seq));

    let start = window.start(now);
    let mut full_balance: i64 = 0;
    let mut opening_balance: i64 = 0;
    let mut entries: Vec<LedgerEntry> = Vec::new();

    for event in events {
        full_balance += event.debit - event.credit;
        let in_window = start.is_none_or(|t| event.occurred_at >= t);
        if in_window {
            entries.push(LedgerEntry {
                occurred_at: event.occurred_at,
                reference: event.reference,
                debit: event.debit,
                credit: event.credit,
                balance: 0,
            });
        } else {
            opening_balance = full_balance;
        }
    }

    let mut balance = opening_balance;
    for entry in &mut entries {
        balance += entry.debit - entry.credit;
        entry.balance = balance;
    }

    LedgerStatement {
        opening_balance,
        entries,
        closing_balance: balance,
    }
}
