use crate::error::{AppError, AppResult};
use regex::Regex;

/// 验证国内手机号格式
pub fn validate_cn_phone(phone: &str) -> AppResult<()> {
    let phone_regex = Regex::new(r"^1[3-9]\d{9}$").unwrap();

    if !phone_regex.is_match(phone) {
        return Err(AppError::InvalidParam("手机号格式不正确".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cn_phone() {
        assert!(validate_cn_phone("13800001111").is_ok());
        assert!(validate_cn_phone("19912345678").is_ok());
        assert!(validate_cn_phone("12345678901").is_err()); // 第二位非法
        assert!(validate_cn_phone("1380000111").is_err()); // 位数不足
        assert!(validate_cn_phone("138000011112").is_err()); // 位数过多
        assert!(validate_cn_phone("+8613800001111").is_err());
    }
}
