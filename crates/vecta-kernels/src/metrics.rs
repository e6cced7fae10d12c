//! Per-morsel operator counters, emitted as trace events.

#[cfg(feature = "tracing")]
pub fn record_morsel(op: &'static str, rows_in: usize, rows_out: usize, bytes_out: usize) {
    let span = tracing::span!(tracing::Level::TRACE, "vecta", op);
    let _entered = span.enter();
    tracing::trace!(rows_in, rows_out, bytes_out, "morsel evaluated");
}

#[cfg(not(feature = "tracing"))]
pub fn record_morsel(_op: &'static str, _rows_in: usize, _rows_out: usize, _bytes_out: usize) {}
