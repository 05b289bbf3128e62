pub mod password;

/// 从给定字符集中均匀随机生成指定长度的字符串
pub fn generate_random_code(length: usize, alphabet: &[char]) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    std::iter::repeat_with(|| alphabet[rand::random_range(0..alphabet.len())])
        .take(length)
        .collect()
}

/// 新的 API 令牌：40 位十六进制
pub fn generate_token_key() -> String {
    let first = uuid::Uuid::new_v4().simple().to_string();
    let second = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", first, &second[..8])
}

/// 用户名只允许字母、数字和 `.@+-_`
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
}
