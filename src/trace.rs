use std::cell::Cell;
use std::time::Instant;




thread_local! {
    static DEPTH: Cell<usize> = Cell::new(0);
}




/**
 * A labeled region of execution. Entering a span logs its label at the
 * debug level, indented by the number of spans already open on this thread;
 * dropping it logs the elapsed time at the trace level. Spans nest, and are
 * closed in reverse order of entry because they are ordinary scoped values.
 */
pub struct Span {
    label: &'static str,
    start: Instant,
}




// ============================================================================
impl Span {

    pub fn enter(label: &'static str) -> Self {
        let depth = DEPTH.with(|d| {
            let n = d.get();
            d.set(n + 1);
            n
        });
        log::debug!("{:indent$}{}", "", label, indent = 2 * depth);
        Self { label, start: Instant::now() }
    }

    /**
     * Return the number of spans currently open on the calling thread.
     */
    pub fn depth() -> usize {
        DEPTH.with(|d| d.get())
    }
}




// ============================================================================
impl Drop for Span {
    fn drop(&mut self) {
        let depth = DEPTH.with(|d| {
            let n = d.get().saturating_sub(1);
            d.set(n);
            n
        });
        log::trace!(
            "{:indent$}{} done in {:.3}ms",
            "",
            self.label,
            1e3 * self.start.elapsed().as_secs_f64(),
            indent = 2 * depth);
    }
}
