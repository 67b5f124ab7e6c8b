//! Configuration types for the repository clients.

use std::fmt;

/// Connection descriptor for the relational source store.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl SourceConnection {
    /// Create a new connection descriptor.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for SourceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Configuration for the search index client.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of documents allowed in a single bulk request.
    /// Set to None to disable the limit (not recommended for production).
    pub max_batch_size: Option<usize>,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl SearchIndexConfig {
    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let conn = SourceConnection::new("postgres", 5432, "airflow", "hunter2", "airflow");
        let rendered = format!("{:?}", conn);

        assert!(rendered.contains("postgres"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_search_index_config_limits() {
        assert_eq!(SearchIndexConfig::default().max_batch_size, Some(1000));
        assert_eq!(SearchIndexConfig::with_max_batch_size(50).max_batch_size, Some(50));
    }
}
