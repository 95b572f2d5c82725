/// 下流Webhookへの公報レコード配送クライアント。
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{model::Publication, util::retry::RetryPolicy};

#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: Url,
    retry: RetryPolicy,
    pacing: Duration,
}

impl WebhookClient {
    /// 配送クライアントを構築する。
    ///
    /// # Errors
    /// HTTPクライアントの構築、またはWebhook URLのパースに失敗した場合は
    /// エラーを返す。
    pub fn new(url: &str, timeout: Duration, retry: RetryPolicy, pacing: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook client")?;
        let url = Url::parse(url).context("invalid webhook URL")?;

        Ok(Self {
            client,
            url,
            retry,
            pacing,
        })
    }

    /// 1件のレコードを配送する。成功は2xxステータスのみ。
    ///
    /// 失敗時は再試行ポリシーに従って待機と再送を繰り返し、予算を
    /// 使い切ったら `false` を返す。配送失敗はデータであって例外ではない。
    pub async fn relay_one(&self, publication: &Publication) -> bool {
        for attempt in 1..=self.retry.max_attempts() {
            match self
                .client
                .post(self.url.clone())
                .json(publication)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        case = %publication.case_number,
                        attempt,
                        "publication relayed"
                    );
                    return true;
                }
                Ok(response) => {
                    warn!(
                        status = %response.status(),
                        case = %publication.case_number,
                        attempt,
                        "webhook returned non-success status"
                    );
                }
                Err(error) => {
                    warn!(
                        %error,
                        case = %publication.case_number,
                        attempt,
                        "webhook request failed"
                    );
                }
            }

            if self.retry.can_retry(attempt) {
                sleep(self.retry.delay_after_attempt(attempt)).await;
            }
        }

        warn!(
            case = %publication.case_number,
            attempts = self.retry.max_attempts(),
            "delivery failed after exhausting retry budget"
        );
        false
    }

    /// バッチ全件をベストエフォートで配送する。
    ///
    /// 個々の失敗があっても残りのレコードは中断しない。すべての配送が
    /// 成功し、かつバッチが空でなかった場合にのみ `true` を返す。
    /// 各レコードの後には成否を問わず固定のポーズを挟み、下流のレート
    /// 制限として作用させる。
    pub async fn relay_batch(&self, batch: &[Publication]) -> bool {
        if batch.is_empty() {
            return false;
        }

        let mut all_succeeded = true;
        for publication in batch {
            if !self.relay_one(publication).await {
                all_succeeded = false;
            }
            sleep(self.pacing).await;
        }
        all_succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::PublicationType;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publication(case: &str) -> Publication {
        Publication {
            case_number: case.to_string(),
            publication_type: PublicationType::Intimation,
            court_body: "2ª Vara Cível".to_string(),
            publication_date: "2025-03-10".to_string(),
            instance_level: "G1".to_string(),
            case_class: "Procedimento Comum".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> WebhookClient {
        // テストでは待機を潰すためbackoffとpacingをゼロにする。
        WebhookClient::new(
            &format!("{}/hook", server.uri()),
            Duration::from_secs(5),
            RetryPolicy::new(3, 0),
            Duration::from_millis(0),
        )
        .expect("client should build")
    }

    #[tokio::test]
    async fn relay_one_succeeds_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        assert!(client.relay_one(&publication("case-a")).await);
    }

    #[tokio::test]
    async fn relay_one_attempts_exactly_three_times_then_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);

        assert!(!client.relay_one(&publication("case-a")).await);
    }

    #[tokio::test]
    async fn relay_batch_attempts_every_record_despite_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({ "caseNumber": "case-a" })))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({ "caseNumber": "case-b" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let batch = vec![publication("case-a"), publication("case-b")];

        assert!(!client.relay_batch(&batch).await);
    }

    #[tokio::test]
    async fn relay_batch_reports_true_only_for_full_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let batch = vec![publication("case-a"), publication("case-b")];

        assert!(client.relay_batch(&batch).await);
    }

    #[tokio::test]
    async fn empty_batch_is_not_a_success() {
        let client = WebhookClient::new(
            "http://localhost:9/hook",
            Duration::from_secs(1),
            RetryPolicy::new(3, 0),
            Duration::from_millis(0),
        )
        .expect("client should build");

        assert!(!client.relay_batch(&[]).await);
    }
}
