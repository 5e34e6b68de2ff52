use thiserror::Error;

use crate::auth::JwtError;
use crate::utils::AppError;

/// 启动 / 运行期错误 (请求级错误使用 [`AppError`])
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        ServerError::Database(err.message)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
