use crate::command::{BitCommand, BitOp};
use crate::error::StoreError;
use bitvec::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The capabilities a filter needs from the store holding its bits.
///
/// Every call is one round trip. Implementations must return batch replies
/// in submission order and must fail the whole batch if any command fails.
pub trait BitStore {
    /// Runs a single command. Returns the previous bit for `Set`, the
    /// current bit for `Get`.
    fn execute(&mut self, cmd: &BitCommand<'_>) -> StoreResult<bool>;
    /// Pipelines `cmds` and returns one reply per command
    fn execute_batch(&mut self, cmds: &[BitCommand<'_>]) -> StoreResult<Vec<bool>>;
    /// Removes `keys`, returns how many existed
    fn delete(&mut self, keys: &[String]) -> StoreResult<u64>;
    /// Switches the logical database used by subsequent calls
    fn select_database(&mut self, index: i64) -> StoreResult<()>;

    fn set_bit(&mut self, key: &str, offset: u64) -> StoreResult<bool> {
        self.execute(&BitCommand::set(key, offset))
    }

    fn get_bit(&mut self, key: &str, offset: u64) -> StoreResult<bool> {
        self.execute(&BitCommand::get(key, offset))
    }
}

#[derive(Debug, Clone)]
enum Value {
    /// Sparse byte pages of a Redis string, bits addressed MSB first
    Bits(BTreeMap<u64, u8>),
    Hash(HashMap<String, String>),
}

type Database = HashMap<String, Value>;

#[derive(Debug, Default)]
struct Shared {
    databases: Mutex<HashMap<i64, Database>>,
    round_trips: AtomicUsize,
}

/// A store kept in process memory that behaves like Redis for the commands
/// a filter issues.
///
/// Clones share the same data, the way two connections share one server,
/// while the selected database belongs to each handle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
    db: i64,
}

const WRONGTYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a hash at `key`, so bit commands against it fail with
    /// `WRONGTYPE`.
    pub fn insert_hash(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.with_db(|db| {
            match db
                .entry(key.to_string())
                .or_insert_with(|| Value::Hash(HashMap::new()))
            {
                Value::Hash(fields) => {
                    fields.insert(field.to_string(), value.to_string());
                    Ok(())
                }
                Value::Bits(_) => Err(StoreError::WrongType(WRONGTYPE.into())),
            }
        })
    }

    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        self.with_db(|db| Ok(db.contains_key(key)))
    }

    /// The string Redis would return for `GET key`, or `None` when the key
    /// is missing or is not a string.
    pub fn raw_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.with_db(|db| {
            Ok(match db.get(key) {
                Some(Value::Bits(pages)) => {
                    let len = pages.keys().next_back().map_or(0, |&last| last + 1);
                    let mut bytes = vec![0u8; len as usize];
                    for (&idx, &byte) in pages {
                        bytes[idx as usize] = byte;
                    }
                    Some(bytes)
                }
                _ => None,
            })
        })
    }

    /// Number of `execute`/`execute_batch`/`delete` calls served so far,
    /// across all handles.
    pub fn round_trips(&self) -> usize {
        self.shared.round_trips.load(Ordering::Relaxed)
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&mut Database) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut databases = self.shared.databases.lock().map_err(|e| {
            StoreError::Protocol(format!("In-memory store lock error: {e}"))
        })?;
        f(databases.entry(self.db).or_default())
    }

    fn apply(db: &mut Database, cmd: &BitCommand<'_>) -> StoreResult<bool> {
        let byte_idx = cmd.offset / 8;
        let bit_idx = (cmd.offset % 8) as usize;

        match cmd.op {
            BitOp::Set => {
                let value = db
                    .entry(cmd.key.to_string())
                    .or_insert_with(|| Value::Bits(BTreeMap::new()));
                let Value::Bits(pages) = value else {
                    return Err(StoreError::WrongType(WRONGTYPE.into()));
                };
                let bits = pages.entry(byte_idx).or_insert(0).view_bits_mut::<Msb0>();
                let previous = bits[bit_idx];
                bits.set(bit_idx, true);
                Ok(previous)
            }
            BitOp::Get => match db.get(cmd.key) {
                None => Ok(false),
                Some(Value::Bits(pages)) => Ok(pages
                    .get(&byte_idx)
                    .is_some_and(|byte| byte.view_bits::<Msb0>()[bit_idx])),
                Some(Value::Hash(_)) => {
                    Err(StoreError::WrongType(WRONGTYPE.into()))
                }
            },
        }
    }
}

impl BitStore for InMemoryStore {
    fn execute(&mut self, cmd: &BitCommand<'_>) -> StoreResult<bool> {
        self.shared.round_trips.fetch_add(1, Ordering::Relaxed);
        self.with_db(|db| Self::apply(db, cmd))
    }

    fn execute_batch(&mut self, cmds: &[BitCommand<'_>]) -> StoreResult<Vec<bool>> {
        if cmds.is_empty() {
            return Ok(Vec::new());
        }
        self.shared.round_trips.fetch_add(1, Ordering::Relaxed);
        self.with_db(|db| {
            // Like a Redis pipeline, every command runs even after an error;
            // the first error is what the caller sees.
            let mut first_err = None;
            let mut replies = Vec::with_capacity(cmds.len());
            for cmd in cmds {
                match Self::apply(db, cmd) {
                    Ok(bit) => replies.push(bit),
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
            match first_err {
                Some(e) => Err(e),
                None => Ok(replies),
            }
        })
    }

    fn delete(&mut self, keys: &[String]) -> StoreResult<u64> {
        self.shared.round_trips.fetch_add(1, Ordering::Relaxed);
        self.with_db(|db| {
            Ok(keys.iter().filter(|key| db.remove(*key).is_some()).count() as u64)
        })
    }

    fn select_database(&mut self, index: i64) -> StoreResult<()> {
        if index < 0 {
            return Err(StoreError::Protocol(
                "ERR DB index is out of range".into(),
            ));
        }
        self.db = index;
        Ok(())
    }
}
