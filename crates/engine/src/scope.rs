//! Tenant isolation context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `(tenant, owner)` pair every engine call runs under.
///
/// Every row carries both ids and every query filters on both. Rows outside
/// the scope are reported as missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
}

impl TenantScope {
    #[must_use]
    pub fn new(tenant_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            tenant_id,
            owner_id,
        }
    }

    pub(crate) fn tenant_key(&self) -> String {
        self.tenant_id.to_string()
    }

    pub(crate) fn owner_key(&self) -> String {
        self.owner_id.to_string()
    }
}
