use crate::config::SmsConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SmsApiResponse {
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct SmsService {
    client: Client,
    config: SmsConfig,
}

impl SmsService {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 未配置凭据（开发环境）时降级为日志输出，不真正下发短信
    pub async fn send_verification_code(&self, phone: &str, code: &str) -> AppResult<()> {
        if self.config.access_key.is_empty() || self.config.endpoint.is_empty() {
            log::info!("[dev] verification code for {phone}: {code}");
            return Ok(());
        }

        let params = [
            ("access_key", self.config.access_key.as_str()),
            ("secret_key", self.config.secret_key.as_str()),
            ("sign_name", self.config.sign_name.as_str()),
            ("template_id", self.config.template_id.as_str()),
            ("phone", phone),
            ("code", code),
        ];

        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("SMS delivery failed for {phone}: {error_text}");
            return Err(AppError::ExternalApiError(format!(
                "SMS sending failed: {error_text}"
            )));
        }

        let body: SmsApiResponse = response.json().await?;
        if body.code != 0 {
            log::error!("SMS provider rejected {phone}: {} {}", body.code, body.message);
            return Err(AppError::ExternalApiError(format!(
                "SMS provider error: {}",
                body.message
            )));
        }

        log::info!("Verification code SMS sent: {phone}");
        Ok(())
    }
}
