//! First-boot seeding
//!
//! On an empty database, create the admin account, the ADMIN role and a
//! baseline permission tree so the instance is usable immediately.

use super::{PermissionService, ServiceResult};
use crate::auth::Crypter;
use crate::db::models::{Permission, Role, User, STATUS_ACTIVE};
use crate::db::{DbContext, Repo};
use std::sync::Arc;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_DEFAULT_PASSWORD: &str = "123456";

pub struct InitService {
    user_repo: Repo<User>,
    role_repo: Repo<Role>,
    permission_repo: Repo<Permission>,
    permissions: Arc<PermissionService>,
    crypter: Arc<Crypter>,
}

impl InitService {
    pub fn new(
        user_repo: Repo<User>,
        role_repo: Repo<Role>,
        permission_repo: Repo<Permission>,
        permissions: Arc<PermissionService>,
        crypter: Arc<Crypter>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            permission_repo,
            permissions,
            crypter,
        }
    }

    /// Seed the admin account and baseline RBAC data when the user table is
    /// empty; a no-op otherwise.
    pub async fn seed_if_empty(&self, ctx: &DbContext) -> ServiceResult<()> {
        let users = self.user_repo.query_builder().count(ctx).await?;
        if users > 0 {
            return Ok(());
        }

        tracing::info!("Empty database, seeding admin account and baseline permissions");

        self.user_repo
            .transaction::<_, super::ServiceError, _, _>(ctx, |tx_ctx| async move {
                let mut admin = User {
                    username: ADMIN_USERNAME.to_string(),
                    password: self.crypter.fingerprint(ADMIN_DEFAULT_PASSWORD),
                    email: "admin@example.com".to_string(),
                    status: STATUS_ACTIVE,
                    ..Default::default()
                };
                self.user_repo.create(&tx_ctx, &mut admin).await?;

                let mut role = Role {
                    name: "Administrator".to_string(),
                    code: "ADMIN".to_string(),
                    description: "Full access".to_string(),
                    status: STATUS_ACTIVE,
                    ..Default::default()
                };
                self.role_repo.create(&tx_ctx, &mut role).await?;

                let mut root = Permission {
                    name: "System".to_string(),
                    code: "system".to_string(),
                    kind: 1,
                    status: STATUS_ACTIVE,
                    ..Default::default()
                };
                self.permission_repo.create(&tx_ctx, &mut root).await?;

                let mut api = Permission {
                    name: "All protected APIs".to_string(),
                    code: "api.all".to_string(),
                    parent_id: root.id,
                    kind: 3,
                    path: "/api/protected/*".to_string(),
                    method: "*".to_string(),
                    status: STATUS_ACTIVE,
                    ..Default::default()
                };
                self.permission_repo.create(&tx_ctx, &mut api).await?;

                self.permissions
                    .assign_role_permissions(&tx_ctx, role.id, &[root.id, api.id])
                    .await?;
                self.permissions
                    .assign_user_roles(&tx_ctx, admin.id, &[role.id])
                    .await?;

                tracing::info!(user_id = admin.id, role_id = role.id, "Seed complete");
                Ok(())
            })
            .await
    }
}
