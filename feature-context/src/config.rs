use std::collections::HashMap;
use std::ops::Deref;
use std::str::FromStr;

use envconfig::Envconfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl FromStr for FlexBool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(FlexBool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(FlexBool(false)),
            _ => Err(format!("Invalid boolean value: {}", s)),
        }
    }
}

impl From<FlexBool> for bool {
    fn from(flex: FlexBool) -> Self {
        flex.0
    }
}

impl Deref for FlexBool {
    type Target = bool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    // Preview detection lives outside this crate, the deploy sets this switch
    #[envconfig(from = "PREVIEW_DEPLOYMENT", default = "false")]
    pub preview_deployment: FlexBool,

    #[envconfig(from = "FEATURE_OVERRIDES_COOKIE", default = "feature_flags")]
    pub overrides_cookie_name: String,

    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: FlexBool,

    #[envconfig(from = "API_URL", default = "http://localhost:3000")]
    pub api_url: String,

    #[envconfig(from = "WEBAPP_URL", default = "/")]
    pub webapp_url: String,
}

impl Config {
    pub fn default_test_config() -> Self {
        Self {
            preview_deployment: FlexBool(false),
            overrides_cookie_name: "feature_flags".to_string(),
            debug: FlexBool(false),
            api_url: "http://localhost:3000".to_string(),
            webapp_url: "/".to_string(),
        }
    }

    /// Builds a config from an explicit variable map instead of the process environment.
    pub fn from_vars<'a>(
        vars: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, envconfig::Error> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&vars)
    }

    pub fn is_preview(&self) -> bool {
        *self.preview_deployment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_VARS: [(&str, &str); 0] = [];

    #[test]
    fn test_default_config() {
        let config = Config::from_vars(NO_VARS).unwrap();
        assert!(!config.is_preview());
        assert_eq!(config.overrides_cookie_name, "feature_flags");
        assert!(!*config.debug);
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.webapp_url, "/");
    }

    #[test]
    fn test_preview_switch_accepts_flexible_booleans() {
        for raw in ["true", "1", "YES", " on "] {
            let config = Config::from_vars([("PREVIEW_DEPLOYMENT", raw)]).unwrap();
            assert!(config.is_preview(), "{raw} should enable preview");
        }
        for raw in ["false", "0", "no", "off", ""] {
            let config = Config::from_vars([("PREVIEW_DEPLOYMENT", raw)]).unwrap();
            assert!(!config.is_preview(), "{raw} should disable preview");
        }
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        assert!(Config::from_vars([("PREVIEW_DEPLOYMENT", "maybe")]).is_err());
        assert_eq!(
            "maybe".parse::<FlexBool>(),
            Err("Invalid boolean value: maybe".to_string())
        );
    }

    #[test]
    fn test_cookie_name_override() {
        let config = Config::from_vars([("FEATURE_OVERRIDES_COOKIE", "ff")]).unwrap();
        assert_eq!(config.overrides_cookie_name, "ff");
    }
}
