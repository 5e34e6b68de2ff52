//! Permission Definitions
//!
//! 角色 → 权限映射。权限写入 JWT，接口按权限字符串授权。

use shared::models::UserRole;

/// 超级权限
pub const ALL: &str = "all";
/// 订单管理 (列表、状态、支付状态、取消任意订单)
pub const ORDERS_MANAGE: &str = "orders:manage";
/// 统计查看
pub const REPORTS_VIEW: &str = "reports:view";
/// 菜单管理 (增删改、上下架)
pub const MENU_MANAGE: &str = "menu:manage";
/// 用户管理
pub const USERS_MANAGE: &str = "users:manage";

pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &[ALL];

pub const DEFAULT_STAFF_PERMISSIONS: &[&str] = &[ORDERS_MANAGE, REPORTS_VIEW];

/// Permissions carried in the token for a role
pub fn permissions_for_role(role: UserRole) -> Vec<String> {
    let permissions: &[&str] = match role {
        UserRole::Admin => DEFAULT_ADMIN_PERMISSIONS,
        UserRole::Staff => DEFAULT_STAFF_PERMISSIONS,
        UserRole::Customer => &[],
    };
    permissions.iter().map(|p| p.to_string()).collect()
}
