//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// 无需登录的 API 路由
///
/// - `GET /api/menu` 及其子路径
/// - `POST /api/orders` (游客下单)
/// - `GET /api/orders/{id}` (单段路径)
/// - `POST /api/users/register`, `POST /api/users/login`
pub fn is_public_route(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');

    if *method == Method::GET {
        if path == "/api/menu" || path.starts_with("/api/menu/") {
            return true;
        }
        if let Some(rest) = path.strip_prefix("/api/orders/") {
            return !rest.is_empty() && !rest.contains('/');
        }
        return false;
    }

    if *method == Method::POST {
        return matches!(
            path,
            "/api/orders" | "/api/users/register" | "/api/users/login"
        );
    }

    false
}

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - [`is_public_route`] 列出的公共接口
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == Method::OPTIONS
        || !path.starts_with("/api/")
        || is_public_route(req.method(), path)
    {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    let user = authenticate(state.get_jwt_service(), token, &req.uri().to_string())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 校验令牌并解析当前用户
pub(crate) fn authenticate(
    jwt_service: &JwtService,
    token: &str,
    uri: &str,
) -> Result<CurrentUser, AppError> {
    let result = jwt_service
        .validate_token(token)
        .and_then(CurrentUser::try_from);

    result.map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = uri.to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })
}

/// 权限检查中间件 - 要求特定权限
///
/// ```ignore
/// Router::new()
///     .route("/api/orders", get(handler::list))
///     .layer(middleware::from_fn(require_permission("orders:manage")));
/// ```
///
/// 无权限返回 403 Forbidden
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id.clone(),
                    role = user.role.as_str(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!(
                    "Permission denied: {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}
