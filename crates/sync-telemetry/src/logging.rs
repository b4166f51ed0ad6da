//! Structured logging helpers.
//!
//! Every line carries a `component` field so that logs from the connection
//! manager, router, reconciler, dispatcher and sweeper can be filtered apart.

/// Log with a component field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an entity-related event with standard fields.
#[macro_export]
macro_rules! log_entity_event {
    ($level:ident, $component:expr, $msg:expr, $kind:expr, $entity_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            kind = %$kind,
            entity_id = %$entity_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a channel-related event with standard fields.
#[macro_export]
macro_rules! log_channel_event {
    ($level:ident, $component:expr, $msg:expr, $channel:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            channel = %$channel,
            $($($field)*,)?
            $msg
        )
    };
}
