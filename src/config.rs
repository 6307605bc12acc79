//! Layout configuration.

/// Enables debug mode: failed renders carry their error text.
pub const DEBUG_MODE_VAR: &str = "TIDELINE_DEBUG_MODE";
/// Enables schema validation of every rendered root fragment.
pub const CHECK_VDOM_SPEC_VAR: &str = "TIDELINE_CHECK_VDOM_SPEC";
/// Keys unkeyed children by their position.
pub const INDEX_AS_DEFAULT_KEY_VAR: &str = "TIDELINE_FEATURE_INDEX_AS_DEFAULT_KEY";

/// Flags consumed by a [`Layout`](crate::Layout).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Include the error text in the fragment of a failed render.
    pub debug_mode: bool,
    /// Validate the root fragment after every render.
    pub check_vdom_spec: bool,
    /// Key unkeyed children by position instead of a fresh marker.
    ///
    /// Unsafe when children are reordered or inserted: state follows the position, not
    /// the child.
    pub index_as_default_key: bool,
}

impl LayoutConfig {
    /// Creates a configuration with every flag off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debug_mode: false,
            check_vdom_spec: false,
            index_as_default_key: false,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// `TIDELINE_CHECK_VDOM_SPEC` defaults to the value of `TIDELINE_DEBUG_MODE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str, default: bool| {
            lookup(name).map_or(default, |value| parse_flag(name, &value, default))
        };

        let debug_mode = flag(DEBUG_MODE_VAR, false);
        Self {
            debug_mode,
            check_vdom_spec: flag(CHECK_VDOM_SPEC_VAR, debug_mode),
            index_as_default_key: flag(INDEX_AS_DEFAULT_KEY_VAR, false),
        }
    }

    /// Sets [`LayoutConfig::debug_mode`].
    #[must_use]
    pub const fn with_debug_mode(mut self, value: bool) -> Self {
        self.debug_mode = value;
        self
    }

    /// Sets [`LayoutConfig::check_vdom_spec`].
    #[must_use]
    pub const fn with_check_vdom_spec(mut self, value: bool) -> Self {
        self.check_vdom_spec = value;
        self
    }

    /// Sets [`LayoutConfig::index_as_default_key`].
    #[must_use]
    pub const fn with_index_as_default_key(mut self, value: bool) -> Self {
        self.index_as_default_key = value;
        self
    }
}

fn parse_flag(name: &str, value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(
                variable = name,
                value,
                "Invalid boolean value, falling back to {default}"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn everything_off_by_default() {
        assert_eq!(LayoutConfig::from_lookup(lookup(&[])), LayoutConfig::new());
    }

    #[test]
    fn check_vdom_spec_follows_debug_mode() {
        let config = LayoutConfig::from_lookup(lookup(&[(DEBUG_MODE_VAR, "true")]));
        assert!(config.debug_mode);
        assert!(config.check_vdom_spec);

        let config = LayoutConfig::from_lookup(lookup(&[
            (DEBUG_MODE_VAR, "1"),
            (CHECK_VDOM_SPEC_VAR, "off"),
        ]));
        assert!(config.debug_mode);
        assert!(!config.check_vdom_spec);
    }

    #[test]
    fn invalid_values_fall_back_to_default() {
        let config = LayoutConfig::from_lookup(lookup(&[
            (DEBUG_MODE_VAR, "maybe"),
            (INDEX_AS_DEFAULT_KEY_VAR, "YES"),
        ]));
        assert!(!config.debug_mode);
        assert!(config.index_as_default_key);
    }

    #[test]
    fn builder_sets_flags() {
        let config = LayoutConfig::new()
            .with_debug_mode(true)
            .with_index_as_default_key(true);
        assert!(config.debug_mode);
        assert!(!config.check_vdom_spec);
        assert!(config.index_as_default_key);
    }
}
