//! RBAC permission engine
//!
//! Role/permission lifecycle, link-table re-sync, recursive permission
//! expansion and the authorization check, with per-user caches.
//!
//! Cache discipline: user-scoped writes (assignments) invalidate that user
//! only; role/permission edits clear wholesale. Invalidation happens as soon
//! as the write succeeds; a cache fill after commit may briefly observe the
//! previous state, which is acceptable.

use super::{ServiceError, ServiceResult};
use crate::db::models::{Permission, Role, RolePermission, User, UserRole};
use crate::db::{DbContext, Repo};
use shared::params::{
    flags, CreatePermissionRequest, CreatePermissionsRequest, CreateRoleRequest,
    GetPermissionListRequest, GetRoleListRequest, ResponseFlags, UpdatePermissionRequest,
    UpdateRoleRequest,
};
use shared::query::{Filterable, Value};
use shared::vo::{PermissionVo, RoleVo, UserVo};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

pub struct PermissionService {
    user_repo: Repo<User>,
    role_repo: Repo<Role>,
    permission_repo: Repo<Permission>,
    user_role_repo: Repo<UserRole>,
    role_perm_repo: Repo<RolePermission>,

    /// user id -> `method:path` -> allowed
    permission_cache: RwLock<HashMap<i64, HashMap<String, bool>>>,
    /// user id -> fully expanded permission list
    permission_tree_cache: RwLock<HashMap<i64, Vec<PermissionVo>>>,
}

impl PermissionService {
    pub fn new(
        user_repo: Repo<User>,
        role_repo: Repo<Role>,
        permission_repo: Repo<Permission>,
        user_role_repo: Repo<UserRole>,
        role_perm_repo: Repo<RolePermission>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            permission_repo,
            user_role_repo,
            role_perm_repo,
            permission_cache: RwLock::new(HashMap::new()),
            permission_tree_cache: RwLock::new(HashMap::new()),
        }
    }

    // Cache locks are held for map operations only, never across awaits.
    // A poisoned lock just means a panicked reader; the data is still usable.
    fn path_cache_read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<i64, HashMap<String, bool>>> {
        self.permission_cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn path_cache_write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<i64, HashMap<String, bool>>> {
        self.permission_cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn tree_cache_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<i64, Vec<PermissionVo>>> {
        self.permission_tree_cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn tree_cache_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<i64, Vec<PermissionVo>>> {
        self.permission_tree_cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }

    // --------------------------- Role lifecycle ---------------------------

    pub async fn create_role(
        &self,
        ctx: &DbContext,
        req: &CreateRoleRequest,
    ) -> ServiceResult<RoleVo> {
        let mut role = Role {
            name: req.name.clone(),
            code: req.code.clone(),
            description: req.description.clone(),
            status: req.status,
            ..Default::default()
        };

        let result = self
            .role_repo
            .transaction::<_, ServiceError, _, _>(ctx, |tx_ctx| {
                let role = &mut role;
                async move {
                    self.role_repo.create(&tx_ctx, role).await.map_err(|e| {
                        if e.is_unique_violation() {
                            ServiceError::Conflict("role name or code already exists".into())
                        } else {
                            e.into()
                        }
                    })?;
                    if !req.permission_ids.is_empty() {
                        self.assign_role_permissions(&tx_ctx, role.id, &req.permission_ids)
                            .await?;
                    }
                    let permissions = self
                        .retrieve_permissions_by_role_id(&tx_ctx, role.id)
                        .await?;
                    let mut vo = RoleVo::from(&*role);
                    vo.permissions =
                        Some(permissions.iter().map(PermissionVo::from).collect());
                    Ok(vo)
                }
            })
            .await?;

        self.clear_all_permission_cache();
        Ok(result)
    }

    pub async fn update_role(
        &self,
        ctx: &DbContext,
        req: &UpdateRoleRequest,
    ) -> ServiceResult<RoleVo> {
        let mut role = self.role_repo.find_by_id(ctx, req.id).await?;
        if !req.name.is_empty() {
            role.name = req.name.clone();
        }
        if !req.code.is_empty() {
            role.code = req.code.clone();
        }
        if !req.description.is_empty() {
            role.description = req.description.clone();
        }
        if req.status != 0 {
            role.status = req.status;
        }
        self.role_repo.update(ctx, &role).await?;

        if let Some(permission_ids) = &req.permission_ids {
            self.assign_role_permissions(ctx, role.id, permission_ids)
                .await?;
        }

        let permissions = self.retrieve_permissions_by_role_id(ctx, role.id).await?;
        let mut vo = RoleVo::from(&role);
        vo.permissions = Some(permissions.iter().map(PermissionVo::from).collect());

        self.clear_all_permission_cache();
        Ok(vo)
    }

    /// Delete a role, removing its permission links first
    pub async fn delete_role(&self, ctx: &DbContext, id: i64) -> ServiceResult<()> {
        self.role_repo.find_by_id(ctx, id).await?;

        self.role_repo
            .transaction::<_, ServiceError, _, _>(ctx, |tx_ctx| async move {
                self.role_perm_repo
                    .query_builder()
                    .eq("role_id", id)
                    .delete(&tx_ctx)
                    .await?;
                self.role_repo.delete_by_id(&tx_ctx, id).await?;
                Ok(())
            })
            .await?;

        self.clear_all_permission_cache();
        Ok(())
    }

    pub async fn delete_role_batch(&self, ctx: &DbContext, ids: &[i64]) -> ServiceResult<()> {
        let mut failures = Vec::new();
        for &id in ids {
            if let Err(e) = self.delete_role(ctx, id).await {
                failures.push(format!("role {id}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Business(failures.join("; ")))
        }
    }

    pub async fn get_role(&self, ctx: &DbContext, id: i64) -> ServiceResult<RoleVo> {
        let role = self.role_repo.find_by_id(ctx, id).await?;
        let permissions = self.retrieve_permissions_by_role_id(ctx, role.id).await?;
        let mut vo = RoleVo::from(&role);
        vo.permissions = Some(permissions.iter().map(PermissionVo::from).collect());
        Ok(vo)
    }

    pub async fn get_role_list(
        &self,
        ctx: &DbContext,
        req: &GetRoleListRequest,
    ) -> ServiceResult<(Vec<RoleVo>, i64)> {
        let (roles, total) = self
            .role_repo
            .find_page(ctx, req.filters(), req.limit, req.offset)
            .await?;
        let mut vos: Vec<RoleVo> = roles.iter().map(RoleVo::from).collect();

        if ResponseFlags::new(req.flags).has(flags::INCLUDE_PERMISSION) {
            for (vo, role) in vos.iter_mut().zip(&roles) {
                let permissions = self.retrieve_permissions_by_role_id(ctx, role.id).await?;
                vo.permissions = Some(permissions.iter().map(PermissionVo::from).collect());
            }
        }

        Ok((vos, total))
    }

    pub async fn get_role_permissions(
        &self,
        ctx: &DbContext,
        role_id: i64,
    ) -> ServiceResult<Vec<PermissionVo>> {
        let permissions = self.retrieve_permissions_by_role_id(ctx, role_id).await?;
        Ok(permissions.iter().map(PermissionVo::from).collect())
    }

    // --------------------------- Permission lifecycle ---------------------------

    pub async fn create_permission(
        &self,
        ctx: &DbContext,
        req: &CreatePermissionRequest,
    ) -> ServiceResult<PermissionVo> {
        let mut permission = Permission {
            name: req.name.clone(),
            code: req.code.clone(),
            description: req.description.clone(),
            parent_id: req.parent_id,
            kind: req.r#type,
            path: req.path.clone(),
            method: req.method.clone(),
            status: req.status,
            ..Default::default()
        };
        self.permission_repo
            .create(ctx, &mut permission)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    ServiceError::Conflict("permission name or code already exists".into())
                } else {
                    ServiceError::from(e)
                }
            })?;

        self.clear_all_permission_cache();
        Ok(PermissionVo::from(&permission))
    }

    pub async fn create_permissions(
        &self,
        ctx: &DbContext,
        req: &CreatePermissionsRequest,
    ) -> ServiceResult<()> {
        let mut permissions: Vec<Permission> = req
            .permissions
            .iter()
            .map(|p| Permission {
                name: p.name.clone(),
                code: p.code.clone(),
                description: p.description.clone(),
                parent_id: p.parent_id,
                kind: p.r#type,
                path: p.path.clone(),
                method: p.method.clone(),
                status: p.status,
                ..Default::default()
            })
            .collect();
        self.permission_repo
            .batch_create(ctx, &mut permissions)
            .await?;

        self.clear_all_permission_cache();
        Ok(())
    }

    pub async fn update_permission(
        &self,
        ctx: &DbContext,
        req: &UpdatePermissionRequest,
    ) -> ServiceResult<PermissionVo> {
        let mut permission = self.permission_repo.find_by_id(ctx, req.id).await?;
        if !req.name.is_empty() {
            permission.name = req.name.clone();
        }
        if !req.code.is_empty() {
            permission.code = req.code.clone();
        }
        if !req.description.is_empty() {
            permission.description = req.description.clone();
        }
        if let Some(parent_id) = req.parent_id {
            permission.parent_id = parent_id;
        }
        if req.r#type != 0 {
            permission.kind = req.r#type;
        }
        if !req.path.is_empty() {
            permission.path = req.path.clone();
        }
        if !req.method.is_empty() {
            permission.method = req.method.clone();
        }
        if req.status != 0 {
            permission.status = req.status;
        }
        self.permission_repo.update(ctx, &permission).await?;

        self.clear_all_permission_cache();
        Ok(PermissionVo::from(&permission))
    }

    /// Delete a permission. Children keep their `parent_id` and drop out of
    /// the reachable tree; removing them is the caller's decision.
    pub async fn delete_permission(&self, ctx: &DbContext, id: i64) -> ServiceResult<()> {
        self.permission_repo.find_by_id(ctx, id).await?;
        self.permission_repo.delete_by_id(ctx, id).await?;
        self.clear_all_permission_cache();
        Ok(())
    }

    pub async fn delete_permission_batch(&self, ctx: &DbContext, ids: &[i64]) -> ServiceResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders: Vec<String> = (1..=ids.len()).map(|n| format!("${n}")).collect();
        let sql = format!(
            "DELETE FROM \"permission\" WHERE \"id\" IN ({})",
            placeholders.join(", ")
        );
        let args: Vec<Value> = ids.iter().map(|&id| Value::I64(id)).collect();
        self.permission_repo.exec(ctx, &sql, &args).await?;

        self.clear_all_permission_cache();
        Ok(())
    }

    pub async fn get_permission(&self, ctx: &DbContext, id: i64) -> ServiceResult<PermissionVo> {
        let permission = self.permission_repo.find_by_id(ctx, id).await?;
        Ok(PermissionVo::from(&permission))
    }

    pub async fn get_permission_list(
        &self,
        ctx: &DbContext,
        req: &GetPermissionListRequest,
    ) -> ServiceResult<(Vec<PermissionVo>, i64)> {
        let (permissions, total) = self
            .permission_repo
            .find_page(ctx, req.filters(), req.limit, req.offset)
            .await?;
        Ok((permissions.iter().map(PermissionVo::from).collect(), total))
    }

    // --------------------------- Assignment ---------------------------

    /// Re-sync a user's roles to exactly `role_ids`
    pub async fn assign_roles(
        &self,
        ctx: &DbContext,
        user_id: i64,
        role_ids: &[i64],
    ) -> ServiceResult<()> {
        self.user_repo.find_by_id(ctx, user_id).await?;
        self.assign_user_roles(ctx, user_id, role_ids).await
    }

    /// Diff existing links against the requested set and apply both halves
    /// in one transaction.
    pub async fn assign_user_roles(
        &self,
        ctx: &DbContext,
        user_id: i64,
        role_ids: &[i64],
    ) -> ServiceResult<()> {
        let existing = self
            .user_role_repo
            .find_all(
                ctx,
                &UserRole {
                    user_id,
                    ..Default::default()
                },
            )
            .await?;

        let existing_ids: HashSet<i64> = existing.iter().map(|link| link.role_id).collect();
        let requested: HashSet<i64> = role_ids.iter().copied().collect();
        let to_remove: Vec<i64> = existing_ids.difference(&requested).copied().collect();
        let to_add: Vec<i64> = requested.difference(&existing_ids).copied().collect();

        self.user_role_repo
            .transaction::<_, ServiceError, _, _>(ctx, |tx_ctx| {
                let to_remove = to_remove.clone();
                let to_add = to_add.clone();
                async move {
                    if !to_remove.is_empty() {
                        self.user_role_repo
                            .query_builder()
                            .eq("user_id", user_id)
                            .is_in("role_id", to_remove)
                            .delete(&tx_ctx)
                            .await?;
                    }
                    if !to_add.is_empty() {
                        let mut links: Vec<UserRole> = to_add
                            .into_iter()
                            .map(|role_id| UserRole {
                                user_id,
                                role_id,
                                ..Default::default()
                            })
                            .collect();
                        self.user_role_repo.batch_create(&tx_ctx, &mut links).await?;
                    }
                    Ok(())
                }
            })
            .await?;

        self.clear_user_permission_cache(user_id);
        Ok(())
    }

    /// Re-sync a role's permissions to exactly `permission_ids`
    pub async fn assign_role_permissions(
        &self,
        ctx: &DbContext,
        role_id: i64,
        permission_ids: &[i64],
    ) -> ServiceResult<()> {
        let existing = self
            .role_perm_repo
            .find_all(
                ctx,
                &RolePermission {
                    role_id,
                    ..Default::default()
                },
            )
            .await?;

        let existing_ids: HashSet<i64> = existing.iter().map(|link| link.permission_id).collect();
        let requested: HashSet<i64> = permission_ids.iter().copied().collect();
        let to_remove: Vec<i64> = existing_ids.difference(&requested).copied().collect();
        let to_add: Vec<i64> = requested.difference(&existing_ids).copied().collect();

        self.role_perm_repo
            .transaction::<_, ServiceError, _, _>(ctx, |tx_ctx| {
                let to_remove = to_remove.clone();
                let to_add = to_add.clone();
                async move {
                    if !to_remove.is_empty() {
                        self.role_perm_repo
                            .query_builder()
                            .eq("role_id", role_id)
                            .is_in("permission_id", to_remove)
                            .delete(&tx_ctx)
                            .await?;
                    }
                    if !to_add.is_empty() {
                        let mut links: Vec<RolePermission> = to_add
                            .into_iter()
                            .map(|permission_id| RolePermission {
                                role_id,
                                permission_id,
                                ..Default::default()
                            })
                            .collect();
                        self.role_perm_repo.batch_create(&tx_ctx, &mut links).await?;
                    }
                    Ok(())
                }
            })
            .await?;

        self.clear_all_permission_cache();
        Ok(())
    }

    // --------------------------- User-facing lookups ---------------------------

    pub async fn get_user_roles(&self, ctx: &DbContext, user_id: i64) -> ServiceResult<UserVo> {
        self.get_user_roles_by_flags(ctx, user_id, flags::ALL_AUTH_FLAGS)
            .await
    }

    pub async fn get_user_roles_by_flags(
        &self,
        ctx: &DbContext,
        user_id: i64,
        flag_bits: i32,
    ) -> ServiceResult<UserVo> {
        let user = self.user_repo.find_by_id(ctx, user_id).await?;
        let mut vo = UserVo::from(&user);

        if ResponseFlags::new(flag_bits).has(flags::INCLUDE_ROLE) {
            vo.roles = Some(
                self.retrieve_role_vos_by_user_id_by_flags(ctx, user_id, flag_bits)
                    .await?,
            );
        }
        Ok(vo)
    }

    pub async fn retrieve_role_vos_by_user_id(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<RoleVo>> {
        self.retrieve_role_vos_by_user_id_by_flags(ctx, user_id, flags::ALL_AUTH_FLAGS)
            .await
    }

    pub async fn retrieve_role_vos_by_user_id_by_flags(
        &self,
        ctx: &DbContext,
        user_id: i64,
        flag_bits: i32,
    ) -> ServiceResult<Vec<RoleVo>> {
        let roles = self.retrieve_roles_by_user_id(ctx, user_id).await?;
        let mut vos: Vec<RoleVo> = roles.iter().map(RoleVo::from).collect();

        if ResponseFlags::new(flag_bits).has(flags::INCLUDE_PERMISSION) {
            for (vo, role) in vos.iter_mut().zip(&roles) {
                let permissions = self.retrieve_permissions_by_role_id(ctx, role.id).await?;
                vo.permissions = Some(permissions.iter().map(PermissionVo::from).collect());
            }
        }
        Ok(vos)
    }

    pub async fn retrieve_roles_by_user_id(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<Role>> {
        let links = self
            .user_role_repo
            .query_builder()
            .eq("user_id", user_id)
            .find(ctx)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<i64> = links.iter().map(|link| link.role_id).collect();
        Ok(self
            .role_repo
            .query_builder()
            .is_in("id", role_ids)
            .find(ctx)
            .await?)
    }

    pub async fn retrieve_permissions_by_role_id(
        &self,
        ctx: &DbContext,
        role_id: i64,
    ) -> ServiceResult<Vec<Permission>> {
        let links = self
            .role_perm_repo
            .query_builder()
            .eq("role_id", role_id)
            .find(ctx)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let permission_ids: Vec<i64> = links.iter().map(|link| link.permission_id).collect();
        Ok(self
            .permission_repo
            .query_builder()
            .is_in("id", permission_ids)
            .find(ctx)
            .await?)
    }

    /// Directly-linked permissions across all of a user's roles (no tree
    /// expansion, no cache)
    pub async fn get_user_permissions(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<PermissionVo>> {
        self.user_repo.find_by_id(ctx, user_id).await?;
        let roles = self.retrieve_roles_by_user_id(ctx, user_id).await?;

        let mut permissions = Vec::new();
        for role in &roles {
            permissions.extend(self.retrieve_permissions_by_role_id(ctx, role.id).await?);
        }
        Ok(permissions.iter().map(PermissionVo::from).collect())
    }

    // --------------------------- Tree expansion & cache ---------------------------

    /// All permissions of a user including transitive descendants, cached.
    pub async fn get_user_all_permissions(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<PermissionVo>> {
        if let Some(cached) = self.tree_cache_read().get(&user_id) {
            return Ok(cached.clone());
        }

        let permissions = self.expand_user_permissions(ctx, user_id).await?;

        self.tree_cache_write().insert(user_id, permissions.clone());
        Ok(permissions)
    }

    /// roles -> direct permissions -> recursive descendants, de-duplicated
    async fn expand_user_permissions(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<PermissionVo>> {
        let roles = self.retrieve_roles_by_user_id(ctx, user_id).await?;
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<i64> = roles.iter().map(|role| role.id).collect();
        let links = self
            .role_perm_repo
            .query_builder()
            .is_in("role_id", role_ids)
            .find(ctx)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let permission_ids: Vec<i64> = links.iter().map(|link| link.permission_id).collect();
        let expanded = self
            .get_child_permissions_cte(ctx, &permission_ids)
            .await?;

        // De-duplicate by id, preserving first occurrence
        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(expanded.len());
        for permission in &expanded {
            if seen.insert(permission.id) {
                result.push(PermissionVo::from(permission));
            }
        }
        Ok(result)
    }

    /// Transitive closure over `parent_id`, seeds included, as one recursive
    /// CTE round-trip.
    pub async fn get_child_permissions_cte(
        &self,
        ctx: &DbContext,
        parent_ids: &[i64],
    ) -> ServiceResult<Vec<Permission>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (1..=parent_ids.len()).map(|n| format!("${n}")).collect();
        let sql = format!(
            "WITH RECURSIVE permission_tree AS ( \
                SELECT id, parent_id FROM \"permission\" WHERE id IN ({}) \
                UNION ALL \
                SELECT p.id, p.parent_id FROM \"permission\" p \
                JOIN permission_tree pt ON p.parent_id = pt.id \
            ) \
            SELECT p.* FROM \"permission\" p \
            JOIN permission_tree pt ON p.id = pt.id",
            placeholders.join(", ")
        );
        let args: Vec<Value> = parent_ids.iter().map(|&id| Value::I64(id)).collect();
        Ok(self.permission_repo.query(ctx, &sql, &args).await?)
    }

    /// `method:path` strings for every non-grouping permission of the user
    pub async fn get_user_permission_paths(
        &self,
        ctx: &DbContext,
        user_id: i64,
    ) -> ServiceResult<Vec<String>> {
        let permissions = self.get_user_all_permissions(ctx, user_id).await?;
        Ok(permissions
            .iter()
            .filter(|p| !p.method.is_empty() && !p.path.is_empty())
            .map(|p| format!("{}:{}", p.method, p.path))
            .collect())
    }

    // --------------------------- Authorization ---------------------------

    /// Authorization check with cache fill on miss
    pub async fn has_permission(
        &self,
        ctx: &DbContext,
        user_id: i64,
        method: &str,
        path: &str,
    ) -> ServiceResult<bool> {
        if let Some(map) = self.path_cache_read().get(&user_id) {
            return Ok(Self::check_path_permission(map, method, path));
        }

        let permissions = self.get_user_all_permissions(ctx, user_id).await?;

        let mut map = HashMap::new();
        for permission in &permissions {
            if !permission.method.is_empty() && !permission.path.is_empty() {
                map.insert(format!("{}:{}", permission.method, permission.path), true);
            }
        }

        let allowed = Self::check_path_permission(&map, method, path);
        self.path_cache_write().insert(user_id, map);
        Ok(allowed)
    }

    /// Match `method:path` against a permission map.
    ///
    /// Exact `method:path` wins; otherwise each entry may match with a `*`
    /// method, a `/*` tail path wildcard, or exact path equality. Entries
    /// without a `:` separator are skipped.
    pub fn check_path_permission(
        permission_map: &HashMap<String, bool>,
        method: &str,
        path: &str,
    ) -> bool {
        if permission_map
            .get(&format!("{method}:{path}"))
            .copied()
            .unwrap_or(false)
        {
            return true;
        }

        for key in permission_map.keys() {
            let Some((perm_method, perm_path)) = key.split_once(':') else {
                continue;
            };
            if perm_method != method && perm_method != "*" {
                continue;
            }
            if let Some(prefix) = perm_path.strip_suffix("/*") {
                if path.starts_with(prefix) {
                    return true;
                }
            } else if perm_path == path {
                return true;
            }
        }
        false
    }

    /// Highest-priority role: numerically smallest id wins
    pub fn highest_priority_role<'a>(roles: &'a [RoleVo]) -> Option<&'a RoleVo> {
        roles.iter().min_by_key(|role| role.id)
    }

    // --------------------------- Cache management ---------------------------

    pub fn clear_user_permission_cache(&self, user_id: i64) {
        self.path_cache_write().remove(&user_id);
        self.tree_cache_write().remove(&user_id);
    }

    pub fn clear_all_permission_cache(&self) {
        self.path_cache_write().clear();
        self.tree_cache_write().clear();
    }

    /// Test hook: whether a user currently has a cached permission map
    pub fn has_cached_permissions(&self, user_id: i64) -> bool {
        self.path_cache_read().contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[&str]) -> HashMap<String, bool> {
        entries.iter().map(|e| (e.to_string(), true)).collect()
    }

    #[test]
    fn test_exact_match_allows() {
        let m = map(&["GET:/api/protected/profile"]);
        assert!(PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/profile"
        ));
    }

    #[test]
    fn test_exact_match_is_method_sensitive() {
        let m = map(&["GET:/api/protected/profile"]);
        assert!(!PermissionService::check_path_permission(
            &m,
            "DELETE",
            "/api/protected/profile"
        ));
    }

    #[test]
    fn test_tail_wildcard_allows_prefix() {
        let m = map(&["GET:/api/protected/user/*"]);
        assert!(PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/user/list"
        ));
        assert!(PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/user"
        ));
        assert!(!PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/role/list"
        ));
    }

    #[test]
    fn test_method_wildcard_allows_any_method() {
        let m = map(&["*:/api/protected/user"]);
        assert!(PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/user"
        ));
        assert!(PermissionService::check_path_permission(
            &m,
            "DELETE",
            "/api/protected/user"
        ));
        assert!(!PermissionService::check_path_permission(
            &m,
            "GET",
            "/api/protected/user/7"
        ));
    }

    #[test]
    fn test_wildcard_method_and_path() {
        let m = map(&["*:/api/protected/*"]);
        assert!(PermissionService::check_path_permission(
            &m,
            "PUT",
            "/api/protected/anything"
        ));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let m = map(&["no-colon-here", "GET:/ok"]);
        assert!(!PermissionService::check_path_permission(&m, "GET", "/nope"));
        assert!(PermissionService::check_path_permission(&m, "GET", "/ok"));
    }

    #[test]
    fn test_deny_by_default() {
        let m = HashMap::new();
        assert!(!PermissionService::check_path_permission(&m, "GET", "/api"));
    }

    #[test]
    fn test_highest_priority_role_is_smallest_id() {
        let roles: Vec<RoleVo> = [3, 1, 2]
            .iter()
            .map(|&id| RoleVo {
                id,
                name: format!("r{id}"),
                code: format!("R{id}"),
                description: String::new(),
                status: 1,
                create_time: None,
                update_time: None,
                permissions: None,
            })
            .collect();
        assert_eq!(PermissionService::highest_priority_role(&roles).unwrap().id, 1);
        assert!(PermissionService::highest_priority_role(&[]).is_none());
    }
}
