//! API-side authorization guard for operations.
//!
//! This enforces authorization at the operation boundary (before dispatch),
//! while keeping domain types and infra auth-agnostic.

use tradebook_auth::{
    AuthzError, CommandAuthorization, Permission, Principal, TenantMembership, authorize,
};

use crate::context::{PrincipalContext, TenantContext};

/// Permission requirement for one API operation.
pub struct OperationAuth {
    required: Vec<Permission>,
}

impl OperationAuth {
    pub fn require(permission: &'static str) -> Self {
        Self {
            required: vec![Permission::new(permission)],
        }
    }
}

impl CommandAuthorization for OperationAuth {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Check authorization for an operation in the current request context.
///
/// This is intended to be called **before** touching any store.
pub fn authorize_operation<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    operation: &C,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    for perm in operation.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Minimal role→permission mapping.
///
/// This is intentionally simple until a real policy source exists (e.g.
/// DB-backed). Convention: "admin" grants all permissions in the current
/// tenant; "clerk" covers the day-to-day selling operations.
fn permissions_from_roles(roles: &[tradebook_auth::Role]) -> Vec<Permission> {
    let mut perms = Vec::new();
    for role in roles {
        match role.as_str() {
            "admin" => return vec![Permission::new("*")],
            "clerk" => perms.extend(
                [
                    "stock.items.read",
                    "customers.read",
                    "customers.manage",
                    "invoices.read",
                    "invoices.issue",
                    "invoices.collect",
                ]
                .map(Permission::new),
            ),
            _ => {}
        }
    }
    perms
}
