//! Structured logging helpers.
//!
//! Every grant event carries the same leading fields so the JSON output can
//! be filtered per grant:
//! - `component`: emitting component (service, handler, ledger)
//! - `grant_id`: grant the event refers to
//! - additional context fields

/// Log an event with a `component` field.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a grant-related event with standard fields.
#[macro_export]
macro_rules! log_grant_event {
    ($level:ident, $component:expr, $msg:expr, $grant_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            grant_id = %$grant_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a payment-related event with standard fields.
#[macro_export]
macro_rules! log_payment_event {
    ($level:ident, $component:expr, $msg:expr, $grant_id:expr, $payment_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            grant_id = %$grant_id,
            payment_id = %$payment_id,
            $($($field)*,)?
            $msg
        )
    };
}
