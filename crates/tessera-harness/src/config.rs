//! Scenario configuration

/// Settings of one [`Scenario`](crate::Scenario)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Name recorded on the scenario's tracing span
    pub name: String,
}

impl ScenarioConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scenario name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: String::from("scenario"),
        }
    }
}
