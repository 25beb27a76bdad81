//! Store and logging configuration
//!
//! `StoreOptions` are given once per store declaration; `LogConfig` is
//! process-wide. Both deserialize from JSON with defaults for every key.

use std::collections::HashSet;
use std::env;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, CodecKind};
use crate::error::{StoreError, StoreResult};
use crate::observability::{LogTarget, Logger, Severity};

/// Environment variable read by [`LogConfig::from_env`]
pub const LOG_ENV_VAR: &str = "TYPEDSTORE_LOG";

fn identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// Which fields get named accessors
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AccessorPolicyRepr", into = "AccessorPolicyRepr")]
pub enum AccessorPolicy {
    /// Every field declared with `accessor: true`
    #[default]
    Fields,
    /// No accessors at all
    None,
    /// Exactly these keys, declared or not
    Only(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AccessorPolicyRepr {
    Flag(bool),
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<AccessorPolicyRepr> for AccessorPolicy {
    type Error = String;

    fn try_from(repr: AccessorPolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            AccessorPolicyRepr::Flag(true) => Ok(AccessorPolicy::Fields),
            AccessorPolicyRepr::Flag(false) => Ok(AccessorPolicy::None),
            AccessorPolicyRepr::Keyword(word) => match word.as_str() {
                "fields" => Ok(AccessorPolicy::Fields),
                "none" => Ok(AccessorPolicy::None),
                other => Err(format!("unknown accessor policy '{}'", other)),
            },
            AccessorPolicyRepr::List(names) => Ok(AccessorPolicy::Only(names)),
        }
    }
}

impl From<AccessorPolicy> for AccessorPolicyRepr {
    fn from(policy: AccessorPolicy) -> Self {
        match policy {
            AccessorPolicy::Fields => AccessorPolicyRepr::Keyword("fields".into()),
            AccessorPolicy::None => AccessorPolicyRepr::Keyword("none".into()),
            AccessorPolicy::Only(names) => AccessorPolicyRepr::List(names),
        }
    }
}

/// Prefix or suffix applied to generated accessor names
///
/// In JSON: `false` (none), `true` (the store name) or a literal string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "AffixRepr", into = "AffixRepr")]
pub enum AccessorAffix {
    #[default]
    None,
    /// The store name
    Store,
    Literal(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AffixRepr {
    Flag(bool),
    Literal(String),
}

impl From<AffixRepr> for AccessorAffix {
    fn from(repr: AffixRepr) -> Self {
        match repr {
            AffixRepr::Flag(false) => AccessorAffix::None,
            AffixRepr::Flag(true) => AccessorAffix::Store,
            AffixRepr::Literal(text) => AccessorAffix::Literal(text),
        }
    }
}

impl From<AccessorAffix> for AffixRepr {
    fn from(affix: AccessorAffix) -> Self {
        match affix {
            AccessorAffix::None => AffixRepr::Flag(false),
            AccessorAffix::Store => AffixRepr::Flag(true),
            AccessorAffix::Literal(text) => AffixRepr::Literal(text),
        }
    }
}

impl AccessorAffix {
    fn resolve<'a>(&'a self, store: &'a str) -> Option<&'a str> {
        match self {
            AccessorAffix::None => None,
            AccessorAffix::Store => Some(store),
            AccessorAffix::Literal(text) => Some(text),
        }
    }
}

/// Options of one store declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Built-in codec (default: tagged)
    #[serde(default)]
    pub codec: Option<CodecKind>,

    /// Custom codec, takes precedence over `codec`
    #[serde(skip)]
    pub custom_codec: Option<Arc<dyn Codec>>,

    /// Accessor generation policy (default: per-field flag)
    #[serde(default)]
    pub accessors: AccessorPolicy,

    /// Accessor name prefix (default: none)
    #[serde(default)]
    pub prefix: AccessorAffix,

    /// Accessor name suffix (default: none)
    #[serde(default)]
    pub suffix: AccessorAffix,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn with_custom_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.custom_codec = Some(codec);
        self
    }

    pub fn with_accessors(mut self, policy: AccessorPolicy) -> Self {
        self.accessors = policy;
        self
    }

    pub fn with_prefix(mut self, prefix: AccessorAffix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_suffix(mut self, suffix: AccessorAffix) -> Self {
        self.suffix = suffix;
        self
    }

    /// The codec instance the store will use
    pub fn codec(&self) -> Arc<dyn Codec> {
        match &self.custom_codec {
            Some(codec) => Arc::clone(codec),
            None => self.codec.unwrap_or_default().build(),
        }
    }

    /// Whether a codec was given explicitly
    pub fn names_codec(&self) -> bool {
        self.codec.is_some() || self.custom_codec.is_some()
    }

    /// Accessor name generated for `field` on `store`
    pub fn accessor_key(&self, store: &str, field: &str) -> String {
        let mut key = String::with_capacity(field.len() + 16);
        if let Some(prefix) = self.prefix.resolve(store) {
            key.push_str(prefix);
            key.push('_');
        }
        key.push_str(field);
        if let Some(suffix) = self.suffix.resolve(store) {
            key.push('_');
            key.push_str(suffix);
        }
        key
    }

    /// Validate the options
    ///
    /// # Errors
    ///
    /// `InvalidDeclaration` for literal affixes that are not identifiers and
    /// for empty or duplicated names in an explicit accessor list.
    pub fn validate(&self) -> StoreResult<()> {
        for (position, affix) in [("prefix", &self.prefix), ("suffix", &self.suffix)] {
            if let AccessorAffix::Literal(text) = affix {
                if !identifier().is_match(text) {
                    return Err(StoreError::InvalidDeclaration(format!(
                        "accessor {} '{}' is not an identifier",
                        position, text
                    )));
                }
            }
        }

        if let AccessorPolicy::Only(names) = &self.accessors {
            let mut seen = HashSet::with_capacity(names.len());
            for name in names {
                if name.trim().is_empty() {
                    return Err(StoreError::InvalidDeclaration(
                        "empty name in accessor list".to_string(),
                    ));
                }
                if !seen.insert(name.as_str()) {
                    return Err(StoreError::InvalidDeclaration(format!(
                        "accessor '{}' listed twice",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Process-wide logging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum severity written (default: warn)
    #[serde(default = "default_level")]
    pub level: Severity,

    /// Output stream (default: stderr)
    #[serde(default)]
    pub target: LogTarget,
}

fn default_level() -> Severity {
    Severity::Warn
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            target: LogTarget::default(),
        }
    }
}

impl LogConfig {
    /// Reads `TYPEDSTORE_LOG`; unset or unparsable values give the default.
    pub fn from_env() -> Self {
        env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|raw| Self::parse(&raw))
            .unwrap_or_default()
    }

    /// Parses `level`, `level:target` or `off`.
    ///
    /// ```ignore
    /// LogConfig::parse("info:stdout");
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        if raw == "off" {
            return Some(Self {
                target: LogTarget::Off,
                ..Self::default()
            });
        }

        let (level, target) = match raw.split_once(':') {
            Some((level, target)) => (level, Some(target)),
            None => (raw.as_str(), None),
        };

        let level = match level {
            "trace" => Severity::Trace,
            "info" => Severity::Info,
            "warn" => Severity::Warn,
            "error" => Severity::Error,
            "fatal" => Severity::Fatal,
            _ => return None,
        };
        let target = match target {
            None => LogTarget::default(),
            Some("stdout") => LogTarget::Stdout,
            Some("stderr") => LogTarget::Stderr,
            Some("off") => LogTarget::Off,
            Some(_) => return None,
        };

        Some(Self { level, target })
    }

    /// Apply to the process-wide logger
    pub fn install(&self) {
        Logger::configure(self.level, self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_options() {
        let options = StoreOptions::default();
        assert_eq!(options.codec, None);
        assert!(!options.names_codec());
        assert_eq!(options.accessors, AccessorPolicy::Fields);
        assert_eq!(options.codec().name(), "tagged_json");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_store_options_from_json() {
        let options: StoreOptions = serde_json::from_str(
            r#"{"codec": "json", "accessors": ["age", "name"], "prefix": true, "suffix": "cfg"}"#,
        )
        .unwrap();
        assert_eq!(options.codec, Some(CodecKind::Json));
        assert_eq!(
            options.accessors,
            AccessorPolicy::Only(vec!["age".into(), "name".into()])
        );
        assert_eq!(options.prefix, AccessorAffix::Store);
        assert_eq!(options.suffix, AccessorAffix::Literal("cfg".into()));
    }

    #[test]
    fn test_accessors_false_disables_accessors() {
        let options: StoreOptions = serde_json::from_str(r#"{"accessors": false}"#).unwrap();
        assert_eq!(options.accessors, AccessorPolicy::None);

        let err = serde_json::from_str::<StoreOptions>(r#"{"accessors": "some"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_accessor_key() {
        let plain = StoreOptions::default();
        assert_eq!(plain.accessor_key("settings", "age"), "age");

        let prefixed = StoreOptions::default().with_prefix(AccessorAffix::Store);
        assert_eq!(prefixed.accessor_key("settings", "age"), "settings_age");

        let both = StoreOptions::default()
            .with_prefix(AccessorAffix::Literal("user".into()))
            .with_suffix(AccessorAffix::Store);
        assert_eq!(both.accessor_key("settings", "age"), "user_age_settings");
    }

    #[test]
    fn test_validate_rejects_bad_affix() {
        let options = StoreOptions::default().with_prefix(AccessorAffix::Literal("1st".into()));
        assert!(matches!(
            options.validate(),
            Err(StoreError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_accessors() {
        let options = StoreOptions::default()
            .with_accessors(AccessorPolicy::Only(vec!["age".into(), "age".into()]));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_log_config_parse() {
        assert_eq!(LogConfig::parse("info"), Some(LogConfig {
            level: Severity::Info,
            target: LogTarget::Stderr,
        }));
        assert_eq!(LogConfig::parse("TRACE:stdout"), Some(LogConfig {
            level: Severity::Trace,
            target: LogTarget::Stdout,
        }));
        assert_eq!(LogConfig::parse("off").map(|c| c.target), Some(LogTarget::Off));
        assert_eq!(LogConfig::parse("loud"), None);
        assert_eq!(LogConfig::parse("info:syslog"), None);
    }

    #[test]
    fn test_log_config_defaults() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.level, Severity::Warn);
    }
}
