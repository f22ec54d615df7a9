//! Bark push transport

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::notify::notifier::{Notification, Notifier};
use crate::version::error::NotifyError;

/// JSON body accepted by `POST {server}/{key}`
#[derive(Debug, Serialize)]
struct BarkPayload<'a> {
    title: &'a str,
    body: &'a str,
    group: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

pub struct BarkNotifier {
    client: Client,
    server: String,
    key: String,
}

impl BarkNotifier {
    pub fn new(client: Client, server: &str, key: &str) -> Self {
        Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for BarkNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{}/{}", self.server, self.key);
        let payload = BarkPayload {
            title: &notification.title,
            body: &notification.body,
            group: &notification.archive_group,
            icon: notification.icon.as_deref(),
            image: notification.image.as_deref(),
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Push receipt: {} - {}", status, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn notification(image: Option<&str>) -> Notification {
        Notification {
            title: "Games".to_string(),
            body: "Azur Lane JP (Android): 8.1.2".to_string(),
            archive_group: "Game".to_string(),
            icon: Some("https://icons/game.gif".to_string()),
            image: image.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn send_posts_json_payload_to_key_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/device-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "title": "Games",
                "body": "Azur Lane JP (Android): 8.1.2",
                "group": "Game",
                "icon": "https://icons/game.gif",
                "image": "https://img/azur.png"
            })))
            .with_status(200)
            .with_body(r#"{"code":200,"message":"success"}"#)
            .create_async()
            .await;

        let notifier = BarkNotifier::new(Client::new(), &server.url(), "device-key");
        notifier
            .send(&notification(Some("https://img/azur.png")))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_omits_missing_image() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/device-key")
            .match_body(Matcher::Json(json!({
                "title": "Games",
                "body": "Azur Lane JP (Android): 8.1.2",
                "group": "Game",
                "icon": "https://icons/game.gif"
            })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = BarkNotifier::new(Client::new(), &server.url(), "device-key");
        notifier.send(&notification(None)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_reports_rejection_with_status_and_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/bad-key")
            .with_status(400)
            .with_body(r#"{"code":400,"message":"failed to get device token"}"#)
            .create_async()
            .await;

        let notifier = BarkNotifier::new(Client::new(), &server.url(), "bad-key");
        let result = notifier.send(&notification(None)).await;

        assert!(matches!(
            result,
            Err(NotifyError::Rejected { status: 400, ref body }) if body.contains("device token")
        ));
    }
}
