// polyglot-store/src/postgres_store.rs
// ============================================================================
// Module: Postgres Store
// Description: SqlExecutor backed by pooled Postgres connections.
// Purpose: Run migrations and authorization against a Postgres server.
// Dependencies: polyglot-core, postgres, postgres-types, r2d2, bytes, tracing
// ============================================================================

//! ## Overview
//! [`PostgresDatabase`] owns an r2d2 pool with a per-connection statement
//! timeout. Each executor checks out one connection and keeps it for its
//! lifetime, so a transaction never spans two connections. Parameters go
//! through a small adapter that encodes text for `uuid` and integer columns
//! and narrows integers to the column width.

use std::error::Error as StdError;
use std::time::Duration;

use bytes::BytesMut;
use polyglot_core::Dialect;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlRow;
use polyglot_core::SqlValue;
use postgres::NoTls;
use postgres::error::SqlState;
use postgres_types::FromSql;
use postgres_types::IsNull;
use postgres_types::ToSql;
use postgres_types::Type;
use postgres_types::to_sql_checked;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;

use crate::Database;
use crate::StoreError;
use crate::config::PostgresStoreConfig;

/// Boxed conversion error used by the postgres-types traits.
type ConversionError = Box<dyn StdError + Sync + Send>;
/// Pooled connection manager.
type Manager = PostgresConnectionManager<NoTls>;
/// Milliseconds between the Unix epoch and the Postgres epoch (2000-01-01).
const POSTGRES_EPOCH_UNIX_MS: i64 = 946_684_800_000;

/// Postgres database reached through a connection pool.
pub struct PostgresDatabase {
    /// Connection pool.
    pool: Pool<Manager>,
}

impl PostgresDatabase {
    /// Builds the pool and verifies a connection can be made.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the connection string is invalid or
    /// the server is unreachable.
    pub fn open(config: &PostgresStoreConfig) -> Result<Self, StoreError> {
        let mut pg_config = config
            .connection
            .parse::<postgres::Config>()
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        pg_config.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
        let options = format!("-c statement_timeout={}", config.statement_timeout_ms);
        pg_config.options(&options);
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .build(manager)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        tracing::debug!(max_connections = config.max_connections, "postgres pool ready");
        Ok(Self {
            pool,
        })
    }

    /// Checks out a dedicated executor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when no connection frees up in time.
    pub fn connect(&self) -> Result<PostgresExecutor, StoreError> {
        let client = self.pool.get().map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(PostgresExecutor {
            client,
        })
    }
}

impl Database for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn executor(&self) -> Result<Box<dyn SqlExecutor>, StoreError> {
        Ok(Box::new(self.connect()?))
    }
}

/// Executor over one pooled Postgres connection.
pub struct PostgresExecutor {
    /// Checked-out connection, returned to the pool on drop.
    client: PooledConnection<Manager>,
}

impl SqlExecutor for PostgresExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, ExecutorError> {
        let params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();
        self.client.execute(sql, &refs).map_err(statement_error)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, ExecutorError> {
        let params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();
        let rows = self.client.query(sql, &refs).map_err(statement_error)?;
        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|index| {
                        row.try_get::<_, PgValue>(index)
                            .map(|value| value.0)
                            .map_err(|err| ExecutorError::Decode(err.to_string()))
                    })
                    .collect()
            })
            .collect()
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        self.client.batch_execute("BEGIN").map_err(|err| ExecutorError::Transaction(err.to_string()))
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.client.batch_execute("COMMIT").map_err(|err| ExecutorError::Transaction(err.to_string()))
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.client
            .batch_execute("ROLLBACK")
            .map_err(|err| ExecutorError::Transaction(err.to_string()))
    }
}

/// Maps driver errors; closed connections and serialization conflicts are retryable.
fn statement_error(err: postgres::Error) -> ExecutorError {
    let retryable = err.is_closed()
        || err.code().is_some_and(|code| {
            *code == SqlState::T_R_SERIALIZATION_FAILURE || *code == SqlState::T_R_DEADLOCK_DETECTED
        });
    if retryable {
        ExecutorError::Connection(err.to_string())
    } else {
        ExecutorError::Statement(err.to_string())
    }
}

/// Parameter adapter encoding a [`SqlValue`] for the inferred column type.
#[derive(Debug)]
struct PgParam<'a>(&'a SqlValue);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, ConversionError> {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(value) => encode_integer(*value, ty, out),
            SqlValue::Text(value) => match *ty {
                Type::UUID => {
                    out.extend_from_slice(&parse_uuid(value)?);
                    Ok(IsNull::No)
                }
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    encode_integer(value.trim().parse::<i64>()?, ty, out)
                }
                _ => value.as_str().to_sql(ty, out),
            },
            SqlValue::Blob(value) => value.as_slice().to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Encodes an integer at the width the column expects.
fn encode_integer(value: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, ConversionError> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql(ty, out),
        Type::BOOL => (value != 0).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => value.to_string().to_sql(ty, out),
        _ => value.to_sql(ty, out),
    }
}

/// Column adapter decoding any supported type into a [`SqlValue`].
struct PgValue(SqlValue);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, ConversionError> {
        let value = match *ty {
            Type::INT2 => SqlValue::Integer(i64::from(i16::from_sql(ty, raw)?)),
            Type::INT4 => SqlValue::Integer(i64::from(i32::from_sql(ty, raw)?)),
            Type::INT8 => SqlValue::Integer(i64::from_sql(ty, raw)?),
            Type::BOOL => SqlValue::Integer(i64::from(bool::from_sql(ty, raw)?)),
            Type::BYTEA => SqlValue::Blob(raw.to_vec()),
            Type::UUID => SqlValue::Text(format_uuid(raw)?),
            Type::TIMESTAMP | Type::TIMESTAMPTZ => {
                let micros = i64::from_be_bytes(<[u8; 8]>::try_from(raw)?);
                SqlValue::Integer(POSTGRES_EPOCH_UNIX_MS + micros.div_euclid(1_000))
            }
            _ => SqlValue::Text(String::from_utf8(raw.to_vec())?),
        };
        Ok(Self(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, ConversionError> {
        Ok(Self(SqlValue::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Parses the canonical or compact hex form of a UUID.
fn parse_uuid(text: &str) -> Result<[u8; 16], ConversionError> {
    let digits: Vec<u8> = text.trim().bytes().filter(|byte| *byte != b'-').collect();
    if digits.len() != 32 {
        return Err(format!("invalid uuid: {text}").into());
    }
    let mut bytes = [0_u8; 16];
    for (slot, pair) in bytes.iter_mut().zip(digits.chunks(2)) {
        *slot = u8::from_str_radix(std::str::from_utf8(pair)?, 16)?;
    }
    Ok(bytes)
}

/// Formats 16 raw bytes as a hyphenated UUID.
fn format_uuid(raw: &[u8]) -> Result<String, ConversionError> {
    if raw.len() != 16 {
        return Err(format!("invalid uuid length: {}", raw.len()).into());
    }
    let mut out = String::with_capacity(36);
    for (index, byte) in raw.iter().enumerate() {
        if matches!(index, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

/// Wire-format checks for the uuid adapter.
#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::format_uuid;
    use super::parse_uuid;

    #[test]
    fn uuid_text_round_trips_through_wire_bytes() {
        let text = "6f1c2a9e-0b4d-4e8a-9c3f-5d7e1b2a4c6d";
        let bytes = parse_uuid(text).unwrap();
        assert_eq!(format_uuid(&bytes).unwrap(), text);
        assert!(parse_uuid("not-a-uuid").is_err());
    }
}
