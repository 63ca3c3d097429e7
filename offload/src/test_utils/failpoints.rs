use fail::FailScenario;

/// Fail point configuration scoped to a test.
///
/// Every configured fail point is switched off again when the scenario is dropped.
pub struct ScopedFailScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<String>,
}

impl<'a> ScopedFailScenario<'a> {
    /// Configures each `(fail point, action)` pair, e.g. `("worker.before_handle", "return")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> ScopedFailScenario<'a> {
        let scenario = FailScenario::setup();

        for &(failpoint, action) in failpoints {
            fail::cfg(failpoint, action).unwrap();
        }

        Self {
            _scenario: scenario,
            failpoints: failpoints
                .iter()
                .map(|(failpoint, _)| failpoint.to_string())
                .collect(),
        }
    }

    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for ScopedFailScenario<'_> {
    fn drop(&mut self) {
        for failpoint in &self.failpoints {
            fail::cfg(failpoint, "off").unwrap();
        }
    }
}
