use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

mod access;
mod balances;
mod categories;
mod entries;
mod holders;
mod money_flows;
mod reports;
mod transfers;

pub use entries::EntryFilter;
pub use money_flows::MoneyFlowFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// How cached holder balances follow entry writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Re-derive every touched holder from its entries.
    #[default]
    Recompute,
    /// Add the reconciler's deltas to the cached balance.
    Incremental,
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    reconcile_mode: ReconcileMode,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    reconcile_mode: ReconcileMode,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn reconcile_mode(mut self, mode: ReconcileMode) -> EngineBuilder {
        self.reconcile_mode = mode;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        tracing::debug!(mode = ?self.reconcile_mode, "engine ready");
        Ok(Engine {
            database: self.database,
            reconcile_mode: self.reconcile_mode,
        })
    }
}
