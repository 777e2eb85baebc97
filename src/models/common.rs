use serde::{Deserialize, Serialize};

/// 统一响应信封，code=0 表示成功
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::ok(serde_json::json!({"id": 1}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["code"], 0);
        assert_eq!(value["message"], "success");
        assert_eq!(value["data"]["id"], 1);
    }
}
