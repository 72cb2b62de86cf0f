//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Looks up `key` in `section`, then in `fallback_section`.
    fn get_string_or(&self, section: &str, fallback_section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .or_else(|| self.get_string(fallback_section, key))
    }
}
