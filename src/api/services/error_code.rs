//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::FoodgramError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 短链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    ServiceUnavailable = 1030,

    // 短链接错误 3000-3099
    LinkAllocationExhausted = 3001,
}

impl From<&FoodgramError> for ErrorCode {
    fn from(err: &FoodgramError) -> Self {
        match err {
            FoodgramError::Validation(_) => ErrorCode::BadRequest,
            FoodgramError::Conflict(_) => ErrorCode::Conflict,
            FoodgramError::Unauthorized(_) => ErrorCode::Unauthorized,
            FoodgramError::Forbidden(_) => ErrorCode::Forbidden,
            FoodgramError::NotFound(_) => ErrorCode::NotFound,
            FoodgramError::AllocationExhausted(_) => ErrorCode::LinkAllocationExhausted,
            FoodgramError::DatabaseConfig(_)
            | FoodgramError::DatabaseConnection(_)
            | FoodgramError::DatabaseOperation(_)
            | FoodgramError::FileOperation(_)
            | FoodgramError::Serialization(_)
            | FoodgramError::PasswordHash(_) => ErrorCode::InternalServerError,
        }
    }
}
