//! Human readable document numbers: `<PREFIX>-<YYYYMMDD>-<NNN>`.
//!
//! The counter lives in `document_sequences`, keyed by tenant, prefix and
//! calendar day, and is bumped inside the caller's transaction. Two requests
//! racing for the first number of a day collide on the primary key and the
//! loser is retried by the service.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::error::LifecycleError;
use super::store::LifecycleStore;

pub const PROCUREMENT_REQUEST_PREFIX: &str = "PR";
pub const PURCHASE_ORDER_PREFIX: &str = "PO";

/// Reserves the next number for `(tenant, prefix, day of now)`.
pub async fn next<S>(
    store: &S,
    tenant_id: Uuid,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<String, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let date = now.date_naive();
    let value = store
        .bump_sequence(tenant_id, prefix, &day_key(date), now)
        .await?;
    Ok(format_number(prefix, date, value))
}

/// Sequences below 1000 are zero padded to three digits; larger ones widen.
pub fn format_number(prefix: &str, date: NaiveDate, sequence: i64) -> String {
    format!("{prefix}-{}-{sequence:03}", day_key(date))
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pads_to_three_digits() {
        assert_eq!(format_number("PR", date(2024, 3, 7), 1), "PR-20240307-001");
        assert_eq!(format_number("PO", date(2024, 12, 31), 42), "PO-20241231-042");
    }

    #[test]
    fn widens_past_nine_hundred_ninety_nine() {
        assert_eq!(format_number("PR", date(2024, 3, 7), 999), "PR-20240307-999");
        assert_eq!(format_number("PR", date(2024, 3, 7), 1000), "PR-20240307-1000");
    }
}
