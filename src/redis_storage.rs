use crate::command::{BitCommand, BitOp};
use crate::config::ConnectionConfig;
use crate::error::StoreError;
use crate::storage::{BitStore, StoreResult};
use redis::{
    Client, Connection, ConnectionAddr, ConnectionInfo, ErrorKind, RedisError,
    RedisConnectionInfo,
};
use tracing::{debug, info};

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        let message = e.to_string();
        match e.code() {
            Some("WRONGTYPE") => return StoreError::WrongType(message),
            Some("NOAUTH") | Some("WRONGPASS") => {
                return StoreError::Connection(message);
            }
            _ => {}
        }
        if e.is_timeout() {
            StoreError::Timeout(message)
        } else if e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_io_error()
            || matches!(
                e.kind(),
                ErrorKind::AuthenticationFailed | ErrorKind::InvalidClientConfig
            )
        {
            StoreError::Connection(message)
        } else {
            StoreError::Protocol(message)
        }
    }
}

/// Failures while establishing the connection all mean the store is
/// unreachable, including a connect or `PING` that timed out.
fn connect_error(e: impl Into<StoreError>) -> StoreError {
    match e.into() {
        StoreError::Timeout(message) => StoreError::Connection(message),
        other => other,
    }
}

/// A single synchronous connection to a Redis server.
pub struct RedisStore {
    conn: Connection,
}

impl RedisStore {
    /// Connects, authenticates, checks the server answers `PING` and selects
    /// the configured database.
    pub fn connect(config: &ConnectionConfig) -> StoreResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = Client::open(info).map_err(connect_error)?;
        let conn = client
            .get_connection_with_timeout(config.timeout)
            .map_err(connect_error)?;
        conn.set_read_timeout(Some(config.timeout))
            .map_err(connect_error)?;
        conn.set_write_timeout(Some(config.timeout))
            .map_err(connect_error)?;

        let mut store = Self { conn };
        let _: String = redis::cmd("PING")
            .query(&mut store.conn)
            .map_err(connect_error)?;
        if config.db != 0 {
            store.select_database(config.db).map_err(connect_error)?;
        }

        info!(
            host = %config.host,
            port = config.port,
            db = config.db,
            "Connected to Redis"
        );
        Ok(store)
    }

    /// Wraps an already established connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

fn to_cmd(cmd: &BitCommand<'_>) -> redis::Cmd {
    let mut c = match cmd.op {
        BitOp::Set => redis::cmd("SETBIT"),
        BitOp::Get => redis::cmd("GETBIT"),
    };
    c.arg(cmd.key).arg(cmd.offset);
    if cmd.op == BitOp::Set {
        c.arg(1);
    }
    c
}

impl BitStore for RedisStore {
    fn execute(&mut self, cmd: &BitCommand<'_>) -> StoreResult<bool> {
        let reply: i64 = to_cmd(cmd).query(&mut self.conn)?;
        Ok(reply == 1)
    }

    fn execute_batch(&mut self, cmds: &[BitCommand<'_>]) -> StoreResult<Vec<bool>> {
        if cmds.is_empty() {
            return Ok(Vec::new());
        }

        // No MULTI: replies keep submission order, shards are not updated atomically
        let mut pipe = redis::pipe();
        for cmd in cmds {
            pipe.add_command(to_cmd(cmd));
        }

        let replies: Vec<i64> = pipe.query(&mut self.conn)?;
        if replies.len() != cmds.len() {
            return Err(StoreError::Protocol(format!(
                "Expected {} replies, got {}",
                cmds.len(),
                replies.len()
            )));
        }
        debug!(commands = cmds.len(), "Pipeline executed");
        Ok(replies.into_iter().map(|bit| bit == 1).collect())
    }

    fn delete(&mut self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: u64 = redis::cmd("DEL").arg(keys).query(&mut self.conn)?;
        Ok(removed)
    }

    fn select_database(&mut self, index: i64) -> StoreResult<()> {
        let _: () = redis::cmd("SELECT").arg(index).query(&mut self.conn)?;
        Ok(())
    }
}
