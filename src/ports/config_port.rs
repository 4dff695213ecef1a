//! Configuration access port trait.

use crate::domain::error::SpitraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent; `ConfigInvalid` when present but not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SpitraderError>;

    /// `Ok(None)` when the key is absent; `ConfigInvalid` when present but not a number.
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SpitraderError>;

    /// Comma-separated values, trimmed, empties dropped.
    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get_string(section, key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
