/// 法務公報検索APIに対するページネーション実行クライアント。
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    classify::classify,
    model::{Publication, UNKNOWN, UNKNOWN_CLASS},
};

/// `_source` 射影で要求するフィールド。Publicationの構築に必要な分のみ。
const SOURCE_FIELDS: [&str; 6] = [
    "numeroProcesso",
    "movimento",
    "dataPublicacao",
    "orgaoJulgador",
    "grau",
    "classe",
];

/// ページネーションが停止した理由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStop {
    /// ページサイズ未満のヒット数が返った（結果セットの終端）。
    ShortPage,
    /// 安全上限のページ数に到達した。
    PageLimit,
    /// 非成功ステータスまたはトランスポート障害。蓄積済みの部分結果を返す。
    UpstreamError,
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    search_url: Url,
    api_key: String,
    page_size: usize,
    max_pages: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: HitsEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitSource {
    numero_processo: Option<String>,
    movimento: Option<String>,
    data_publicacao: Option<String>,
    orgao_julgador: Option<String>,
    grau: Option<String>,
    classe: Option<String>,
}

impl SearchClient {
    /// 検索クライアントを構築する。
    ///
    /// # Errors
    /// HTTPクライアントの構築、またはベースURLのパースに失敗した場合は
    /// エラーを返す。
    pub fn new(
        base_url: &str,
        tribunal_alias: &str,
        api_key: String,
        timeout: Duration,
        page_size: usize,
        max_pages: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build search client")?;

        let mut search_url = Url::parse(base_url).context("invalid search base URL")?;
        search_url
            .path_segments_mut()
            .map_err(|()| anyhow!("search base URL must be absolute"))?
            .extend([tribunal_alias, "_search"]);

        Ok(Self {
            client,
            search_url,
            api_key,
            page_size,
            max_pages,
        })
    }

    /// 対象日の公報を全ページ取得し、正規化済みレコードの一覧を返す。
    ///
    /// ページサイズ未満のページが返るか、安全上限のページ数に達するまで
    /// オフセットを進めながら取得する。非成功ステータスやトランスポート
    /// 障害ではその場で打ち切り、取得済みの部分結果をそのまま返す
    /// （全損よりも部分配送を優先する）。この層では再試行しない。
    pub async fn fetch_day(&self, date: NaiveDate, advocate: &str) -> (Vec<Publication>, FetchStop) {
        let day = date.format("%Y-%m-%d").to_string();
        let mut collected = Vec::new();

        for page in 0..self.max_pages {
            let from = page * self.page_size;
            let body = build_page_request(&day, advocate, from, self.page_size);

            let response = match self
                .client
                .post(self.search_url.clone())
                .header("Authorization", format!("APIKey {}", self.api_key))
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    warn!(%error, page, "search request failed, returning partial results");
                    return (collected, FetchStop::UpstreamError);
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                warn!(%status, page, "search endpoint returned error status, returning partial results");
                return (collected, FetchStop::UpstreamError);
            }

            let parsed: SearchResponse = match response.json().await {
                Ok(parsed) => parsed,
                Err(error) => {
                    warn!(%error, page, "failed to decode search response, returning partial results");
                    return (collected, FetchStop::UpstreamError);
                }
            };

            let hit_count = parsed.hits.hits.len();
            debug!(page, hit_count, "search page fetched");
            collected.extend(
                parsed
                    .hits
                    .hits
                    .into_iter()
                    .map(|hit| build_publication(hit.source)),
            );

            if hit_count < self.page_size {
                return (collected, FetchStop::ShortPage);
            }
        }

        (collected, FetchStop::PageLimit)
    }
}

/// 1ページ分の検索リクエストボディを構築する。
///
/// `dataPublicacao` を対象日1日に固定するboolフィルタと、引用符で括った
/// 弁護士名の全文一致を組み合わせる。引用はトークン分割による部分一致を
/// 防ぐため。
fn build_page_request(day: &str, advocate: &str, from: usize, size: usize) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": [
                    { "range": { "dataPublicacao": { "gte": day, "lte": day } } }
                ],
                "must": [
                    {
                        "query_string": {
                            "query": format!("\"{advocate}\""),
                            "default_field": "texto"
                        }
                    }
                ]
            }
        },
        "from": from,
        "size": size,
        "_source": SOURCE_FIELDS,
    })
}

fn build_publication(source: HitSource) -> Publication {
    let publication_type = classify(source.movimento.as_deref());
    Publication {
        case_number: source.numero_processo.unwrap_or_else(|| UNKNOWN.to_string()),
        publication_type,
        court_body: source.orgao_julgador.unwrap_or_else(|| UNKNOWN.to_string()),
        publication_date: source
            .data_publicacao
            .unwrap_or_else(|| UNKNOWN.to_string()),
        instance_level: source.grau.unwrap_or_else(|| UNKNOWN.to_string()),
        case_class: source.classe.unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
    }
}
