use crate::error::ConfigError;
use crate::types::{ConfigDocument, QuotaCheckerConfig};

/// Validates a parsed document before it is ever written to disk or
/// published as a snapshot. Returning `Err` aborts the replace before the
/// atomic rename happens.
pub fn validate(doc: &ConfigDocument) -> Result<(), ConfigError> {
    for (provider_id, checker) in &doc.quotas {
        if let QuotaCheckerConfig::Minimax { groupid, hertz_session } = checker {
            if groupid.trim().is_empty() && hertz_session.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "quota checker for provider {provider_id}: MiniMax groupid is required"
                )));
            }
        }
    }

    for (alias_id, alias) in &doc.models {
        if alias.targets.is_empty() {
            return Err(ConfigError::Validation(format!(
                "model alias {alias_id} declares no targets"
            )));
        }
        for target in &alias.targets {
            if !doc.providers.contains_key(&target.provider_id) {
                return Err(ConfigError::Validation(format!(
                    "model alias {alias_id} references unknown provider {}",
                    target.provider_id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdminConfig, QuotaCheckerConfig};
    use plexus_common::Secret;
    use std::collections::HashMap;

    fn base_doc() -> ConfigDocument {
        ConfigDocument {
            providers: HashMap::new(),
            models: HashMap::new(),
            keys: HashMap::new(),
            admin: AdminConfig { api_key: Secret::new("admin") },
            quotas: HashMap::new(),
            port: 8080,
            log_level: "info".into(),
        }
    }

    #[test]
    fn rejects_blank_minimax_fields() {
        let mut doc = base_doc();
        doc.quotas.insert(
            "p1".into(),
            QuotaCheckerConfig::Minimax { groupid: String::new(), hertz_session: String::new() },
        );
        let err = validate(&doc).unwrap_err();
        assert!(err.to_string().contains("MiniMax groupid is required"));
    }
}
