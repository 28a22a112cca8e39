//! Crate-internal logging hooks.
//!
//! `trace_span!` opens an info span around a match or a correlation scan.
//! `trace_event!(level, name, key = value, ..)` records store writes,
//! candidate scores and skipped candidates at the given `tracing` level.
//! Without the `tracing` feature both expand to inert code.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($level:ident, $name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        tracing::$level!(name: $name, $($key = $value),+)
    };
}

// Field expressions still run so call sites see no unused bindings.
#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($level:ident, $name:expr $(, $key:ident = $value:expr)+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in for `tracing::Span` with the same `entered()` call shape.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
