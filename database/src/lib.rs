pub mod export;

pub use export::{CsvExport, TrendExport, CSV_HEADER};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use trendwatch_core::{CoreError, DatabaseError, TrendRecord};

const TREND_TABLE: &str = "sentiment_trend";

/// Append-only store of trend records, read back in timestamp order.
pub trait TrendStore {
    async fn append(&self, record: &TrendRecord) -> Result<(), CoreError>;
    async fn history(&self) -> Result<Vec<TrendRecord>, CoreError>;
}

impl<T: TrendStore + ?Sized> TrendStore for &T {
    async fn append(&self, record: &TrendRecord) -> Result<(), CoreError> {
        (**self).append(record).await
    }

    async fn history(&self) -> Result<Vec<TrendRecord>, CoreError> {
        (**self).history().await
    }
}

/// SQLite-backed trend store.
///
/// The pool holds a single connection, so writes are serialized even if two
/// callers share one `Database`.
pub struct Database {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    /// Connect and migrate in one step.
    pub async fn open(connection_string: String) -> Result<Self, CoreError> {
        let mut db = Self::new(connection_string);
        db.connect().await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: format!("{}: {}", self.connection_string, e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to trend database {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        sqlx::migrate!("./migrations")
            .run(self.pool()?)
            .await
            .map_err(|e| DatabaseError::MigrationFailed {
                migration: e.to_string(),
            })?;
        debug!("Trend database migrations applied");
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool, CoreError> {
        self.pool.as_ref().ok_or_else(|| {
            CoreError::Database(DatabaseError::ConnectionFailed {
                reason: "database not connected".to_string(),
            })
        })
    }

    pub async fn save_trend(&self, record: &TrendRecord) -> Result<i64, CoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO sentiment_trend (date, positive, neutral, negative)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.formatted_timestamp())
        .bind(i64::from(record.positive))
        .bind(i64::from(record.neutral))
        .bind(i64::from(record.negative))
        .execute(self.pool()?)
        .await
        .map_err(map_sql_error)?;

        let id = result.last_insert_rowid();
        debug!("Saved trend record {} at {}", id, record.formatted_timestamp());
        Ok(id)
    }

    pub async fn get_trends(&self) -> Result<Vec<TrendRecord>, CoreError> {
        let rows = sqlx::query(
            "SELECT date, positive, neutral, negative FROM sentiment_trend ORDER BY date, id",
        )
        .fetch_all(self.pool()?)
        .await
        .map_err(map_sql_error)?;

        rows.iter().map(row_to_record).collect()
    }

    pub async fn latest_trend(&self) -> Result<Option<TrendRecord>, CoreError> {
        let row = sqlx::query(
            "SELECT date, positive, neutral, negative FROM sentiment_trend ORDER BY date DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool()?)
        .await
        .map_err(map_sql_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

impl TrendStore for Database {
    async fn append(&self, record: &TrendRecord) -> Result<(), CoreError> {
        self.save_trend(record).await.map(|_| ())
    }

    async fn history(&self) -> Result<Vec<TrendRecord>, CoreError> {
        self.get_trends().await
    }
}

fn map_sql_error(error: sqlx::Error) -> DatabaseError {
    let locked = error
        .as_database_error()
        .map(|db| db.message().contains("database is locked"))
        .unwrap_or(false);
    if locked {
        DatabaseError::DatabaseLocked
    } else {
        DatabaseError::Sql(error)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TrendRecord, CoreError> {
    let corrupt = |details: String| {
        CoreError::Database(DatabaseError::CorruptRow {
            table: TREND_TABLE.to_string(),
            details,
        })
    };

    let date: String = row.try_get("date").map_err(DatabaseError::Sql)?;
    let timestamp = TrendRecord::parse_timestamp(&date)
        .ok_or_else(|| corrupt(format!("unparseable date '{}'", date)))?;

    let count = |column: &str| -> Result<u32, CoreError> {
        let value: i64 = row.try_get(column).map_err(DatabaseError::Sql)?;
        u32::try_from(value).map_err(|_| corrupt(format!("{} = {}", column, value)))
    };

    Ok(TrendRecord::new(
        timestamp,
        count("positive")?,
        count("neutral")?,
        count("negative")?,
    ))
}
