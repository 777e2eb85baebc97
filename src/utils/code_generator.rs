use chrono::Utc;
use rand::Rng;

/// 生成6位数字验证码
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// 生成随机十六进制串
pub fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..len / 2 + 1).map(|_| rng.r#gen()).collect();
    hex::encode(bytes)[..len].to_string()
}

/// 下载令牌：32位不透明随机串
pub fn generate_download_token() -> String {
    random_hex(32)
}

/// 邀请码：INV + 8位随机串
pub fn generate_invite_code() -> String {
    format!("INV{}", random_hex(8).to_uppercase())
}

/// 订单号：ORD + 毫秒时间戳 + 6位随机串
pub fn generate_order_no() -> String {
    format!("ORD{}{}", Utc::now().timestamp_millis(), random_hex(6))
}

/// 首次登录自动注册时的随机用户名
pub fn generate_username() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("user_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_download_token() {
        let token = generate_download_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_invite_code() {
        let code = generate_invite_code();
        assert!(code.starts_with("INV"));
        assert_eq!(code.len(), 11);
    }

    #[test]
    fn test_generate_order_no() {
        let no = generate_order_no();
        assert!(no.starts_with("ORD"));
        assert!(no.len() > 10);
    }

    #[test]
    fn test_generate_username() {
        let name = generate_username();
        assert!(name.starts_with("user_"));
        assert_eq!(name.len(), 13);
    }
}
