/// Environment variable containing the items table name
pub const DYNAMODB_TABLE: &str = "DYNAMODB_TABLE";
/// Environment variable naming the service, used in logs and as a metric dimension
pub const SERVICE_NAME: &str = "POWERTOOLS_SERVICE_NAME";
/// Environment variable containing the metrics namespace
pub const METRICS_NAMESPACE: &str = "POWERTOOLS_METRICS_NAMESPACE";

pub const DEFAULT_TABLE_NAME: &str = "COE-AWS-OBS-DynamoDB-Table";
pub const DEFAULT_SERVICE_NAME: &str = "coe-aws-obs-lambda";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    pub table_name: String,
    pub service_name: String,
    pub metrics_namespace: String,
}

impl HandlerConfig {
    /// Read from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let service_name: String =
            non_empty(SERVICE_NAME).unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

        HandlerConfig {
            table_name: non_empty(DYNAMODB_TABLE).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            metrics_namespace: non_empty(METRICS_NAMESPACE).unwrap_or_else(|| service_name.clone()),
            service_name,
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let config: HandlerConfig = HandlerConfig::default();

        assert_eq!(DEFAULT_TABLE_NAME, config.table_name);
        assert_eq!(DEFAULT_SERVICE_NAME, config.service_name);
        assert_eq!(DEFAULT_SERVICE_NAME, config.metrics_namespace);
    }

    #[test]
    fn namespace_follows_service_name() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(SERVICE_NAME, "orders"), (DYNAMODB_TABLE, "orders-table")]);

        let config: HandlerConfig =
            HandlerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!("orders-table", config.table_name);
        assert_eq!("orders", config.metrics_namespace);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config: HandlerConfig = HandlerConfig::from_lookup(|key| match key {
            DYNAMODB_TABLE => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(DEFAULT_TABLE_NAME, config.table_name);
    }
}
