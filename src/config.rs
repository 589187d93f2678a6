use std::env;
use std::path::PathBuf;

use crate::models::PatientSchema;
use crate::services::CriticalRules;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("STORE_BACKEND=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Failed to read critical rules from {path}: {source}")]
    RulesFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse critical rules in {path}: {source}")]
    RulesParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub patient_schema: PatientSchema,
    pub critical_rules_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: database_url.ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "STORE_BACKEND",
                    reason: format!("expected 'postgres' or 'memory', got '{}'", other),
                })
            }
            None => match database_url {
                Some(database_url) => StoreBackend::Postgres { database_url },
                None => StoreBackend::Memory,
            },
        };

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "DATABASE_MAX_CONNECTIONS",
                reason: format!("{}", e),
            })?;

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = lookup("SERVER_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                name: "SERVER_PORT",
                reason: format!("{}", e),
            })?;

        let patient_schema = match lookup("PATIENT_SCHEMA") {
            Some(raw) => raw.parse::<PatientSchema>().map_err(|reason| ConfigError::InvalidValue {
                name: "PATIENT_SCHEMA",
                reason,
            })?,
            None => PatientSchema::default(),
        };

        let critical_rules_path = lookup("CRITICAL_RULES_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            store_backend,
            max_connections,
            server_host,
            server_port,
            patient_schema,
            critical_rules_path,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Loads the critical rule table, falling back to the built-in defaults.
    pub fn critical_rules(&self) -> Result<CriticalRules, ConfigError> {
        let Some(path) = &self.critical_rules_path else {
            return Ok(CriticalRules::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::RulesFile {
            path: path.clone(),
            source,
        })?;

        CriticalRules::from_json(&raw).map_err(|source| ConfigError::RulesParse {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.server_addr(), "127.0.0.1:5000");
        assert_eq!(config.patient_schema, PatientSchema::Clinical);
        assert_eq!(config.max_connections, 5);
        assert!(config.critical_rules_path.is_none());
        assert_eq!(config.critical_rules().unwrap(), CriticalRules::default());
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/patients")]).unwrap();
        assert_eq!(
            config.store_backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/patients".to_string()
            }
        );

        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/patients"),
            ("STORE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        assert!(matches!(
            config_from(&[("STORE_BACKEND", "postgres")]),
            Err(ConfigError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn test_port_fallback() {
        let config = config_from(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.server_port, 8080);

        let config = config_from(&[("PORT", "8080"), ("SERVER_PORT", "9090")]).unwrap();
        assert_eq!(config.server_port, 9090);

        assert!(config_from(&[("SERVER_PORT", "http")]).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PATIENT_SCHEMA", "fhir")]).is_err());
        assert!(config_from(&[("STORE_BACKEND", "mongo")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
    }

    #[test]
    fn test_critical_rules_file() {
        let path = std::env::temp_dir().join(format!(
            "critical-rules-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            r#"[{"vitalType": "Temperature", "comparison": "gt", "threshold": 39}]"#,
        )
        .unwrap();

        let config = config_from(&[("CRITICAL_RULES_PATH", path.to_str().unwrap())]).unwrap();
        let rules = config.critical_rules().unwrap();
        assert_eq!(rules.rules().len(), 1);
        assert_eq!(rules.rules()[0].vital_type, "Temperature");

        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            config.critical_rules(),
            Err(ConfigError::RulesFile { .. })
        ));
    }
}
