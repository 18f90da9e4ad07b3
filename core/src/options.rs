//! Build options

use serde::Deserialize;

/// Knobs that relax or tune the builder
///
/// ```toml
/// requireStringMaxLength = true
/// descriptorNameSuffix = "Descriptor"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Fail on string properties without `maxLength`
    pub require_string_max_length: bool,
    /// Property-name suffix used to infer descriptor paths from identity paths
    pub descriptor_name_suffix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            require_string_max_length: true,
            descriptor_name_suffix: "Descriptor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_missing_keys() {
        let opts: BuildOptions = serde_json::from_str(r#"{ "requireStringMaxLength": false }"#).unwrap();
        assert!(!opts.require_string_max_length);
        assert_eq!(opts.descriptor_name_suffix, "Descriptor");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_json::from_str::<BuildOptions>(r#"{ "maxLength": 1 }"#).is_err());
    }
}
