//! ---
//! dt_section: "03-persistence-logging"
//! dt_subsection: "module"
//! dt_type: "source"
//! dt_scope: "code"
//! dt_description: "Structured logging adapters and sinks."
//! dt_version: "v0.0.0-prealpha"
//! dt_owner: "tbd"
//! ---
/// Shared expansion for the level-specific macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __dt_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = &$ctx;
        $crate::__tracing::event!(
            $level,
            actor = ctx.actor.unwrap_or(""),
            project = ctx.project.unwrap_or(""),
            defect = ctx.defect.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with tracker context.
#[macro_export]
macro_rules! dt_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with tracker context.
#[macro_export]
macro_rules! dt_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning log enriched with tracker context.
#[macro_export]
macro_rules! dt_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with tracker context.
#[macro_export]
macro_rules! dt_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__dt_event!($crate::__tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
