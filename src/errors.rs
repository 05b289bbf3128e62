use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum FoodgramError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    AllocationExhausted(String),
    Serialization(String),
    PasswordHash(String),
}

impl FoodgramError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            FoodgramError::DatabaseConfig(_) => "E001",
            FoodgramError::DatabaseConnection(_) => "E002",
            FoodgramError::DatabaseOperation(_) => "E003",
            FoodgramError::FileOperation(_) => "E004",
            FoodgramError::Validation(_) => "E005",
            FoodgramError::NotFound(_) => "E006",
            FoodgramError::Conflict(_) => "E007",
            FoodgramError::Unauthorized(_) => "E008",
            FoodgramError::Forbidden(_) => "E009",
            FoodgramError::AllocationExhausted(_) => "E010",
            FoodgramError::Serialization(_) => "E011",
            FoodgramError::PasswordHash(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            FoodgramError::DatabaseConfig(_) => "Database Configuration Error",
            FoodgramError::DatabaseConnection(_) => "Database Connection Error",
            FoodgramError::DatabaseOperation(_) => "Database Operation Error",
            FoodgramError::FileOperation(_) => "File Operation Error",
            FoodgramError::Validation(_) => "Validation Error",
            FoodgramError::NotFound(_) => "Resource Not Found",
            FoodgramError::Conflict(_) => "Conflict",
            FoodgramError::Unauthorized(_) => "Unauthorized",
            FoodgramError::Forbidden(_) => "Forbidden",
            FoodgramError::AllocationExhausted(_) => "Short Code Allocation Exhausted",
            FoodgramError::Serialization(_) => "Serialization Error",
            FoodgramError::PasswordHash(_) => "Password Hash Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            FoodgramError::DatabaseConfig(msg)
            | FoodgramError::DatabaseConnection(msg)
            | FoodgramError::DatabaseOperation(msg)
            | FoodgramError::FileOperation(msg)
            | FoodgramError::Validation(msg)
            | FoodgramError::NotFound(msg)
            | FoodgramError::Conflict(msg)
            | FoodgramError::Unauthorized(msg)
            | FoodgramError::Forbidden(msg)
            | FoodgramError::AllocationExhausted(msg)
            | FoodgramError::Serialization(msg)
            | FoodgramError::PasswordHash(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            FoodgramError::Validation(_) | FoodgramError::Conflict(_) => StatusCode::BAD_REQUEST,
            FoodgramError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FoodgramError::Forbidden(_) => StatusCode::FORBIDDEN,
            FoodgramError::NotFound(_) => StatusCode::NOT_FOUND,
            FoodgramError::AllocationExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            FoodgramError::DatabaseConfig(_)
            | FoodgramError::DatabaseConnection(_)
            | FoodgramError::DatabaseOperation(_)
            | FoodgramError::FileOperation(_)
            | FoodgramError::Serialization(_)
            | FoodgramError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为服务端内部错误（响应中不暴露细节）
    pub fn is_internal(&self) -> bool {
        self.http_status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for FoodgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for FoodgramError {}

// 便捷的构造函数
impl FoodgramError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        FoodgramError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        FoodgramError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        FoodgramError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        FoodgramError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        FoodgramError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        FoodgramError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        FoodgramError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        FoodgramError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        FoodgramError::Forbidden(msg.into())
    }

    pub fn allocation_exhausted<T: Into<String>>(msg: T) -> Self {
        FoodgramError::AllocationExhausted(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        FoodgramError::Serialization(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        FoodgramError::PasswordHash(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for FoodgramError {
    fn from(err: sea_orm::DbErr) -> Self {
        FoodgramError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for FoodgramError {
    fn from(err: std::io::Error) -> Self {
        FoodgramError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for FoodgramError {
    fn from(err: serde_json::Error) -> Self {
        FoodgramError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FoodgramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            FoodgramError::validation("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FoodgramError::conflict("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FoodgramError::unauthorized("x").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            FoodgramError::forbidden("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            FoodgramError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FoodgramError::allocation_exhausted("x").http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(FoodgramError::database_operation("x").is_internal());
    }

    #[test]
    fn test_format_simple() {
        let err = FoodgramError::not_found("recipe 7");
        assert_eq!(err.format_simple(), "Resource Not Found: recipe 7");
        assert_eq!(err.to_string(), err.format_simple());
        assert_eq!(err.message(), "recipe 7");
        assert_eq!(err.code(), "E006");
    }

    #[test]
    fn test_from_db_err() {
        let err: FoodgramError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, FoodgramError::DatabaseOperation(_)));
    }
}
