// polyglot-store/src/mysql_store.rs
// ============================================================================
// Module: MySQL Store
// Description: SqlExecutor backed by pooled MySQL connections.
// Purpose: Run migrations and authorization against a MySQL server.
// Dependencies: polyglot-core, mysql, tracing
// ============================================================================

//! ## Overview
//! Compiled with the `mysql` feature. [`MysqlDatabase`] holds a `mysql`
//! connection pool; each executor pins one pooled connection so `BEGIN` and
//! `COMMIT` reach the same session.

use std::time::Duration;

use mysql::Opts;
use mysql::OptsBuilder;
use mysql::Params;
use mysql::Pool;
use mysql::PoolConstraints;
use mysql::PoolOpts;
use mysql::PooledConn;
use mysql::Row;
use mysql::Value;
use mysql::prelude::Queryable;
use polyglot_core::Dialect;
use polyglot_core::ExecutorError;
use polyglot_core::SqlExecutor;
use polyglot_core::SqlRow;
use polyglot_core::SqlValue;

use crate::Database;
use crate::StoreError;
use crate::config::MysqlStoreConfig;

/// Server error code for a detected deadlock.
const ER_LOCK_DEADLOCK: u16 = 1213;
/// Server error code for a lock wait timeout.
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;

/// MySQL database reached through a connection pool.
pub struct MysqlDatabase {
    /// Connection pool.
    pool: Pool,
}

impl MysqlDatabase {
    /// Builds the pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the URL is invalid or the server is unreachable.
    pub fn open(config: &MysqlStoreConfig) -> Result<Self, StoreError> {
        let opts =
            Opts::from_url(&config.connection).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let max = usize::try_from(config.max_connections.max(1))
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let constraints = PoolConstraints::new(1, max)
            .ok_or_else(|| StoreError::Invalid("invalid mysql pool bounds".to_string()))?;
        let builder = OptsBuilder::from_opts(opts)
            .tcp_connect_timeout(Some(Duration::from_millis(config.connect_timeout_ms)))
            .pool_opts(PoolOpts::default().with_constraints(constraints));
        let pool = Pool::new(builder).map_err(|err| StoreError::Db(err.to_string()))?;
        tracing::debug!(max_connections = config.max_connections, "mysql pool ready");
        Ok(Self {
            pool,
        })
    }

    /// Checks out a dedicated executor.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when no connection is available.
    pub fn connect(&self) -> Result<MysqlExecutor, StoreError> {
        let conn = self.pool.get_conn().map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(MysqlExecutor {
            conn,
        })
    }
}

impl Database for MysqlDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn executor(&self) -> Result<Box<dyn SqlExecutor>, StoreError> {
        Ok(Box::new(self.connect()?))
    }
}

/// Executor over one pooled MySQL connection.
///
/// DDL commits implicitly on MySQL, so `rollback` only undoes row changes.
pub struct MysqlExecutor {
    /// Checked-out connection.
    conn: PooledConn,
}

impl MysqlExecutor {
    /// Runs a text-protocol control statement.
    fn control(&mut self, sql: &str) -> Result<(), ExecutorError> {
        self.conn.query_drop(sql).map_err(|err| ExecutorError::Transaction(err.to_string()))
    }
}

impl SqlExecutor for MysqlExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, ExecutorError> {
        if params.is_empty() {
            self.conn.query_drop(sql).map_err(statement_error)?;
        } else {
            self.conn.exec_drop(sql, to_params(params)).map_err(statement_error)?;
        }
        Ok(self.conn.affected_rows())
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>, ExecutorError> {
        let rows: Vec<Row> = if params.is_empty() {
            self.conn.query(sql).map_err(statement_error)?
        } else {
            self.conn.exec(sql, to_params(params)).map_err(statement_error)?
        };
        Ok(rows
            .iter()
            .map(|row| (0..row.len()).map(|index| from_mysql_value(row.as_ref(index))).collect())
            .collect())
    }

    fn begin(&mut self) -> Result<(), ExecutorError> {
        self.control("START TRANSACTION")
    }

    fn commit(&mut self) -> Result<(), ExecutorError> {
        self.control("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), ExecutorError> {
        self.control("ROLLBACK")
    }
}

/// Builds positional parameters.
fn to_params(params: &[SqlValue]) -> Params {
    Params::Positional(
        params
            .iter()
            .map(|value| match value {
                SqlValue::Null => Value::NULL,
                SqlValue::Integer(value) => Value::Int(*value),
                SqlValue::Text(value) => Value::Bytes(value.clone().into_bytes()),
                SqlValue::Blob(value) => Value::Bytes(value.clone()),
            })
            .collect(),
    )
}

/// Converts a column value; the text protocol returns numbers as bytes.
fn from_mysql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::NULL) => SqlValue::Null,
        Some(Value::Int(value)) => SqlValue::Integer(*value),
        Some(Value::UInt(value)) => {
            i64::try_from(*value).map_or_else(|_| SqlValue::Text(value.to_string()), SqlValue::Integer)
        }
        Some(Value::Bytes(bytes)) => String::from_utf8(bytes.clone())
            .map_or_else(|_| SqlValue::Blob(bytes.clone()), SqlValue::Text),
        Some(Value::Float(value)) => SqlValue::Text(value.to_string()),
        Some(Value::Double(value)) => SqlValue::Text(value.to_string()),
        Some(Value::Date(year, month, day, hour, minute, second, micros)) => SqlValue::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        )),
        Some(Value::Time(negative, days, hours, minutes, seconds, micros)) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            SqlValue::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"))
        }
    }
}

/// Maps driver errors; lock conflicts and lost connections are retryable.
fn statement_error(err: mysql::Error) -> ExecutorError {
    match &err {
        mysql::Error::MySqlError(server)
            if server.code == ER_LOCK_DEADLOCK || server.code == ER_LOCK_WAIT_TIMEOUT =>
        {
            ExecutorError::Connection(err.to_string())
        }
        mysql::Error::IoError(_) | mysql::Error::DriverError(_) => {
            ExecutorError::Connection(err.to_string())
        }
        _ => ExecutorError::Statement(err.to_string()),
    }
}
