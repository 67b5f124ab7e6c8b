//! PostgreSQL source store client.
//!
//! Opens one connection per fetch, reads the column list from the prepared
//! statement description and the values through the simple query protocol,
//! which returns every value in its text form.

use async_trait::async_trait;
use tokio_postgres::{Config, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info, instrument};

use crate::config::SourceConnection;
use crate::errors::SourceError;
use crate::interfaces::SourceStore;
use inspection_indexer_shared::RawDataset;

/// Source store backed by a PostgreSQL database.
///
/// # Example
///
/// ```ignore
/// let source = PostgresSource::new(SourceConnection::new(
///     "postgres", 5432, "airflow", "airflow", "airflow",
/// ));
/// let dataset = source.fetch_table("table_m3").await?;
/// println!("Fetched {} rows", dataset.row_count());
/// ```
pub struct PostgresSource {
    connection: SourceConnection,
}

impl PostgresSource {
    /// Create a new source for the given connection descriptor.
    ///
    /// No connection is opened until [`SourceStore::fetch_table`] is called.
    pub fn new(connection: SourceConnection) -> Self {
        Self { connection }
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.connection.host)
            .port(self.connection.port)
            .user(&self.connection.user)
            .password(&self.connection.password)
            .dbname(&self.connection.database);
        config
    }
}

/// Build the full-scan query for `table`.
///
/// The table name is interpolated into SQL, so it must be a plain identifier,
/// optionally schema-qualified (`schema.table`).
pub fn select_all_query(table: &str) -> Result<String, SourceError> {
    let valid = !table.is_empty()
        && table.split('.').count() <= 2
        && table.split('.').all(is_plain_identifier);

    if !valid {
        return Err(SourceError::query(format!("Invalid table name: {:?}", table)));
    }

    Ok(format!("SELECT * FROM {}", table))
}

fn is_plain_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[async_trait]
impl SourceStore for PostgresSource {
    #[instrument(skip(self), fields(host = %self.connection.host, database = %self.connection.database))]
    async fn fetch_table(&self, table: &str) -> Result<RawDataset, SourceError> {
        let sql = select_all_query(table)?;

        let (client, connection) = self
            .config()
            .connect(NoTls)
            .await
            .map_err(|e| SourceError::connection(e.to_string()))?;

        // The connection object drives the socket and must be polled on its own task.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        debug!(sql = %sql, "Connected to source store");

        let statement = client
            .prepare(&sql)
            .await
            .map_err(|e| SourceError::query(e.to_string()))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let messages = client
            .simple_query(&sql)
            .await
            .map_err(|e| SourceError::query(e.to_string()))?;

        let mut dataset = RawDataset::new(columns);

        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if row.len() != dataset.columns.len() {
                    return Err(SourceError::query(format!(
                        "Row has {} values but the query described {} columns",
                        row.len(),
                        dataset.columns.len()
                    )));
                }

                let values = (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect();
                dataset.push_row(values);
            }
        }

        info!(
            table = %table,
            rows = dataset.row_count(),
            columns = dataset.columns.len(),
            "Fetched source table"
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_query() {
        assert_eq!(select_all_query("table_m3").unwrap(), "SELECT * FROM table_m3");
        assert_eq!(
            select_all_query("public.table_m3").unwrap(),
            "SELECT * FROM public.table_m3"
        );
    }

    #[test]
    fn test_select_all_query_rejects_injection() {
        for table in [
            "",
            "table_m3; DROP TABLE table_m3",
            "1table",
            "a.b.c",
            "table m3",
            "\"quoted\"",
            "public.",
        ] {
            let result = select_all_query(table);
            assert!(
                matches!(result, Err(SourceError::QueryError(_))),
                "expected {:?} to be rejected",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_table_before_connecting() {
        // Port 1 on localhost is never a PostgreSQL server, so reaching the
        // connect step would surface as a connection error instead.
        let source = PostgresSource::new(SourceConnection::new("127.0.0.1", 1, "u", "p", "db"));

        let result = source.fetch_table("bad name").await;

        assert!(matches!(result, Err(SourceError::QueryError(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_connection_error() {
        let source = PostgresSource::new(SourceConnection::new("127.0.0.1", 1, "u", "p", "db"));

        let result = source.fetch_table("table_m3").await;

        assert!(matches!(result, Err(SourceError::ConnectionError(_))));
    }
}
