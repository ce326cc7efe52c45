use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "CAD".to_string()
}

/// Application-level configuration. Deliberately thin relative to the
/// teacher's `Config` (locale/theme/UI fields dropped — those belong to
/// the CLI/GUI layer, out of scope here). Consumed by `ledger-migrate`
/// as the default currency for budgets synthesized from a
/// categories.yml that has no currency field of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
        }
    }
}
