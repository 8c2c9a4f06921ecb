use indexmap::IndexMap;

use crate::error::EntityResult;
use crate::value::Value;

/// One row returned by [`Connection::fetch`]: an ordered column-name to
/// [`Value`] map, already decoded from whatever wire representation the
/// underlying driver used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new(columns: impl IntoIterator<Item = (String, Value)>) -> Self {
        Row {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn into_values(self) -> IndexMap<String, Value> {
        self.columns
    }
}

/// The minimal capability surface the core requires of an external database
/// client (§1 "OUT OF SCOPE... a minimal `Connection` capability", §4.5, §7).
/// Every suspension point in the core funnels through one of these three
/// methods; building queries, compiling SQL, diffing registries, and
/// producing DDL never suspend (§5).
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Run a statement with no expected result rows (DDL, or a DML
    /// statement the caller doesn't need row data back from), returning the
    /// affected row count where the underlying driver reports one.
    async fn execute(&self, sql: &str, params: &[Value]) -> EntityResult<u64>;

    /// Run a statement and decode its result set.
    async fn fetch(&self, sql: &str, params: &[Value]) -> EntityResult<Vec<Row>>;

    /// Open a transaction. The core never opens one implicitly (§5
    /// "Ordering guarantees"); callers that need atomicity across several
    /// `save`/`execute` calls open one explicitly and commit or roll it back
    /// themselves.
    async fn transaction<'a>(&'a self) -> EntityResult<Box<dyn Transaction + 'a>>;
}

/// A `Connection` additionally capable of being committed or rolled back.
/// Dropping a `Transaction` without calling either is equivalent to
/// `rollback` on every driver this surface has been modeled against.
#[async_trait::async_trait]
pub trait Transaction: Connection {
    async fn commit(self: Box<Self>) -> EntityResult<()>;
    async fn rollback(self: Box<Self>) -> EntityResult<()>;
}
