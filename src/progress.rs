use log::info;

/// Amount of progress lines a full run of a loop emits.
const REPORTS: usize = 10;

/// Logs the advance of a long running loop at `info` level, once every tenth of the way.
#[derive(Debug)]
pub struct Progress {
    label: &'static str,
    total: usize,
    every: usize,
    done: usize,
}

impl Progress {
    /// Creates a new `Progress`.
    ///
    /// # Arguments
    /// * `label` - What the loop is doing, prefixes every line.
    /// * `total` - The amount of units of work in the loop.
    pub fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            every: total.div_ceil(REPORTS).max(1),
            done: 0,
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    /// Marks `n` more units of work as done.
    ///
    /// # Returns
    /// Whether a progress line was logged.
    pub fn advance(&mut self, n: usize) -> bool {
        let before = self.done / self.every;
        self.done = (self.done + n).min(self.total);

        let crossed = self.done / self.every > before || (n > 0 && self.done == self.total);
        if crossed {
            let percent = self.done * 100 / self.total.max(1);
            info!(
                done = self.done, total = self.total;
                "{}: {}/{} ({percent}%)", self.label, self.done, self.total
            );
        }

        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reports(total: usize, step: usize) -> usize {
        let mut progress = Progress::new("test", total);
        let mut logged = 0;

        while progress.done() < total {
            logged += usize::from(progress.advance(step));
        }

        logged
    }

    #[test]
    fn reports_every_tenth() {
        assert_eq!(reports(100, 1), 10);
        assert_eq!(reports(100_000, 1), 10);
    }

    #[test]
    fn short_loops_report_every_unit() {
        assert_eq!(reports(3, 1), 3);
    }

    #[test]
    fn uneven_totals_report_the_end() {
        // every = 3, lines at 3, 6, ..., 24 and at 25
        assert_eq!(reports(25, 1), 9);
        assert_eq!(reports(10, 1), 10);

        let mut progress = Progress::new("test", 25);
        for _ in 0..24 {
            progress.advance(1);
        }
        assert!(progress.advance(1));
    }

    #[test]
    fn large_advances_report_once() {
        let mut progress = Progress::new("test", 100);

        assert!(progress.advance(55));
        assert!(!progress.advance(2));
        assert!(progress.advance(100));
        assert_eq!(progress.done(), 100);
    }

    #[test]
    fn empty_loop_never_reports() {
        let mut progress = Progress::new("test", 0);
        assert!(!progress.advance(0));
    }
}
