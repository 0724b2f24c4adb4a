//! 结果通知 - 业务能力层
//!
//! 只负责"把一条有意义的结果发出去"，发送结果以文字形式原样记录到 SearchOutcome。

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::SearchRequest;

/// 一次通知的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyStatus {
    pub success: bool,
    pub message: String,
}

impl NotifyStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// 通知渠道
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> NotifyStatus;
}

/// 通知的主题和正文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// 根据请求和结果生成通知内容
pub fn build_notification(request: &SearchRequest, result: &str) -> Notification {
    let subject = format!(
        "ΣΟΛΩΝ • {} • {} • ΓΑΚ {}/{}",
        request.client, request.court, request.case_number, request.case_year
    );
    let body = format!(
        "Πελάτης: {}\nΔικαστήριο: {}\nΓ.Α.Κ.: {}\nΈτος: {}\n\nΑριθμός Απόφασης/Έτος - Είδος Διατακτικού:\n{}\n",
        request.client, request.court, request.case_number, request.case_year, result
    );
    Notification { subject, body }
}

/// 以 JSON POST 到 webhook 的通知渠道
///
/// 每个请求都有超时：webhook 不回应时通知失败，而不是让 worker 一直等下去。
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> NotifyStatus {
        debug!("发送通知: {}", subject);
        let payload = Notification {
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let resp = match self.client.post(&self.url).json(&payload).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("⚠️ 通知发送失败: {}", e);
                return NotifyStatus::failed(format!("notification failed: {}", e));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("⚠️ 通知被拒绝: {} {}", status.as_u16(), body);
            return NotifyStatus::failed(format!(
                "notification failed: {} {}",
                status.as_u16(),
                body.trim()
            ));
        }

        info!("📨 通知已发送: {}", subject);
        NotifyStatus::ok("notification ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        let request = SearchRequest::new("ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ", "70927", "2025").with_client("Παπαδόπουλος");
        let n = build_notification(&request, "ΑΠΟΡΡΙΠΤΙΚΗ 123/2025");

        assert_eq!(
            n.subject,
            "ΣΟΛΩΝ • Παπαδόπουλος • ΠΡΩΤΟΔΙΚΕΙΟ ΑΘΗΝΩΝ • ΓΑΚ 70927/2025"
        );
        assert!(n.body.starts_with("Πελάτης: Παπαδόπουλος\n"));
        assert!(n
            .body
            .ends_with("Αριθμός Απόφασης/Έτος - Είδος Διατακτικού:\nΑΠΟΡΡΙΠΤΙΚΗ 123/2025\n"));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_reports_failure() {
        // 端口 9 (discard) 上通常没有 HTTP 服务
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:9/hook", Duration::from_secs(2)).unwrap();
        let status = notifier.notify("s", "b").await;
        assert!(!status.success);
        assert!(status.message.starts_with("notification failed"));
    }

    #[tokio::test]
    async fn test_silent_webhook_times_out() {
        // 接受连接但从不回应
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let notifier =
            WebhookNotifier::new(format!("http://{}/hook", addr), Duration::from_millis(200))
                .unwrap();
        let status = tokio::time::timeout(Duration::from_secs(5), notifier.notify("s", "b"))
            .await
            .expect("通知应在超时内返回");

        assert!(!status.success);
        assert!(status.message.starts_with("notification failed"));
        server.abort();
    }
}
