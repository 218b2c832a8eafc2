pub mod quote;
pub mod system;

use crate::metrics::Metrics;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("данные о памяти недоступны: система сообщила нулевой общий объём")]
    MemoryUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sample<T> {
    Measured(T),
    Fallback { value: T, reason: String },
}

impl<T> Sample<T> {
    pub fn resolve(self, name: &'static str, metrics: &Metrics) -> T {
        match self {
            Sample::Measured(value) => value,
            Sample::Fallback { value, reason } => {
                warn!(collector = name, reason = %reason, "зонд вернул запасное значение");
                metrics.inc_collector_fallback(name);
                value
            }
        }
    }
}
