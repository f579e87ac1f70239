//! Tracing hooks for the per-frame detection path.
//!
//! The pipeline marks each frame with a span and reports stage counts as
//! events. Both compile away entirely unless the `tracing` feature is on,
//! so the hot path carries no instrumentation cost by default.

/// Span covering one frame of post-processing.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr) => {
        tracing::info_span!($name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr) => {
        $crate::trace::NoopSpan
    };
}

/// Per-stage measurement, reported as `name` plus `key = value` fields.
///
/// The disabled arm still evaluates the values so stage variables are not
/// flagged as unused under the default feature set.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in span guard for the disabled arm of `trace_span!`, letting call
/// sites keep the `let _guard = trace_span!(...).entered();` shape without
/// feature checks of their own.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
