use tokio_util::sync::CancellationToken;

/// Cancellation state shared between the signal listener and a control loop.
///
/// `run` is cleared by the first interrupt: loops stop taking new work.
/// `abort` is set by a second interrupt: draining outstanding work stops too.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    run: CancellationToken,
    abort: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.run.is_cancelled()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }

    /// Ask the loop to stop at its next iteration boundary.
    pub fn shutdown(&self) {
        self.run.cancel();
    }

    /// First call shuts down, second call aborts.
    pub fn interrupt(&self) {
        if self.run.is_cancelled() {
            self.abort.cancel();
        } else {
            self.run.cancel();
        }
    }

    pub fn abort_token(&self) -> &CancellationToken {
        &self.abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_interrupt_aborts() {
        let ctx = RunContext::new();
        assert!(ctx.is_running());

        ctx.interrupt();
        assert!(!ctx.is_running());
        assert!(!ctx.is_aborted());

        ctx.clone().interrupt();
        assert!(ctx.is_aborted());
    }
}
