use crate::data::Proctor;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::env;

/// Tunables of the assignment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Proctor type subject to the minimum non-casual rule, compared case-insensitively.
    pub casual_type: String,
    /// Quota used when neither the session record nor `type_quotas` provides one.
    pub default_quota: u32,
    /// Default quota per proctor type, keyed by lower-cased type.
    pub type_quotas: HashMap<String, u32>,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            casual_type: "jobiste".to_string(),
            default_quota: 6,
            type_quotas: [("assistant", 6), ("pat", 6), ("jobiste", 4)]
                .into_iter()
                .map(|(kind, quota)| (kind.to_string(), quota))
                .collect(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("PROCTOR_CASUAL_TYPE") {
            config.casual_type = value.trim().to_lowercase();
        }
        if let Some(value) = lookup("PROCTOR_DEFAULT_QUOTA") {
            config.default_quota = parse_number("PROCTOR_DEFAULT_QUOTA", &value)?;
        }
        if let Some(value) = lookup("PROCTOR_TYPE_QUOTAS") {
            config.type_quotas = parse_type_quotas(&value)?;
        }
        if let Some(value) = lookup("PROCTOR_LOG_LEVEL") {
            config.log_level = value;
        }

        Ok(config)
    }

    pub fn is_casual(&self, proctor_type: &str) -> bool {
        proctor_type.trim().eq_ignore_ascii_case(&self.casual_type)
    }

    /// Session quota, then the type default, then the global default.
    pub fn quota_for(&self, proctor: &Proctor) -> u32 {
        proctor.session.quota.unwrap_or_else(|| {
            self.type_quotas
                .get(&proctor.proctor_type.trim().to_lowercase())
                .copied()
                .unwrap_or(self.default_quota)
        })
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

// "assistant=6,pat=6,jobiste=4"
fn parse_type_quotas(value: &str) -> Result<HashMap<String, u32>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kind, quota) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidQuota(entry.to_string()))?;
            let quota = quota
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidQuota(entry.to_string()))?;
            Ok((kind.trim().to_lowercase(), quota))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SessionRecord;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    fn proctor(kind: &str, quota: Option<u32>) -> Proctor {
        Proctor {
            id: 1,
            last_name: "Dupont".to_string(),
            first_name: String::new(),
            email: String::new(),
            proctor_type: kind.to_string(),
            prohibited_faculty: None,
            session: SessionRecord {
                quota,
                ..SessionRecord::default()
            },
            sessions: Default::default(),
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let config = EngineConfig::from_lookup(lookup(&[])).expect("defaults load");
        assert_eq!(config.casual_type, "jobiste");
        assert_eq!(config.default_quota, 6);
        assert_eq!(config.log_level, "info");
        assert!(config.is_casual("Jobiste"));
        assert!(!config.is_casual("Assistant"));
    }

    #[test]
    fn parses_type_quotas() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("PROCTOR_TYPE_QUOTAS", "Assistant=8, PAT=3"),
            ("PROCTOR_DEFAULT_QUOTA", "2"),
        ]))
        .expect("config loads");
        assert_eq!(config.quota_for(&proctor("assistant", None)), 8);
        assert_eq!(config.quota_for(&proctor("pat", None)), 3);
        assert_eq!(config.quota_for(&proctor("jobiste", None)), 2);
    }

    #[test]
    fn session_quota_wins() {
        let config = EngineConfig::default();
        assert_eq!(config.quota_for(&proctor("assistant", Some(1))), 1);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = EngineConfig::from_lookup(lookup(&[("PROCTOR_DEFAULT_QUOTA", "many")]))
            .expect_err("quota must be numeric");
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = EngineConfig::from_lookup(lookup(&[("PROCTOR_TYPE_QUOTAS", "assistant")]))
            .expect_err("entry needs a quota");
        assert!(matches!(err, ConfigError::InvalidQuota(_)));
    }
}
