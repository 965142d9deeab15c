//! Configuration access port trait.
//!
//! Analyzer settings, data source selection and strategy files are all read
//! through this trait. Missing or malformed numeric values fall back to the
//! caller's default; validation lives in `domain::config_validation`.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
}
