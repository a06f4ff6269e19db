//! 图片下载服务 - 业务能力层
//!
//! 只负责"按 URL 下载并编码"，带固定间隔的有限重试

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::error::{FetchError, TransportError};

/// 单次 GET 请求
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// 基于 reqwest 的传输层
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &NetworkConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;
        let bytes = response.bytes().await.map_err(classify)?;
        Ok(bytes.to_vec())
    }
}

/// 图片下载器
#[derive(Clone)]
pub struct ImageFetcher {
    transport: Arc<dyn Transport>,
    max_retries: usize,
    retry_delay: std::time::Duration,
}

impl ImageFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: &NetworkConfig) -> Self {
        Self {
            transport,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }

    /// 使用 reqwest 创建下载器
    pub fn http(config: &NetworkConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config).map_err(|cause| FetchError {
            url: String::new(),
            attempts: 0,
            cause,
        })?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// 下载原始字节
    ///
    /// 最多尝试 `1 + max_retries` 次，不可重试的错误立即返回。
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let total_attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("下载图片 (尝试 {}/{}): {}", attempt, total_attempts, url);

            match self.transport.get(url).await {
                Ok(bytes) => {
                    debug!("下载完成 {} 字节: {}", bytes.len(), url);
                    return Ok(bytes);
                }
                Err(cause) if cause.is_retryable() && attempt < total_attempts => {
                    warn!(
                        "下载失败 (尝试 {}/{}) {}: {}，{}ms 后重试",
                        attempt,
                        total_attempts,
                        url,
                        cause,
                        self.retry_delay.as_millis()
                    );
                    sleep(self.retry_delay).await;
                }
                Err(cause) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }

    /// 下载并编码为 base64
    pub async fn fetch_base64(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.fetch(url).await?;
        Ok(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 依次返回预设结果的传输层
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<Vec<u8>, TransportError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<Result<Vec<u8>, TransportError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(TransportError::Network("exhausted".into())))
        }
    }

    fn network(max_retries: usize) -> NetworkConfig {
        NetworkConfig {
            max_retries,
            retry_delay_ms: 0,
            ..NetworkConfig::default()
        }
    }

    #[tokio::test]
    async fn succeeds_after_max_retries_transient_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Status(503)),
            Err(TransportError::Network("reset".into())),
            Ok(b"png".to_vec()),
        ]);
        let fetcher = ImageFetcher::new(transport.clone(), &network(3));

        let bytes = fetcher.fetch("https://img.test/a.png").await.unwrap();

        assert_eq!(bytes, b"png");
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn fails_with_url_after_max_retries_plus_one() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Timeout); 4]);
        let fetcher = ImageFetcher::new(transport.clone(), &network(3));

        let err = fetcher.fetch("https://img.test/b.png").await.unwrap_err();

        assert_eq!(err.url, "https://img.test/b.png");
        assert_eq!(err.attempts, 4);
        assert_eq!(err.cause, TransportError::Timeout);
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::InvalidUrl("not a url".into())), Ok(vec![1])]);
        let fetcher = ImageFetcher::new(transport.clone(), &network(3));

        let err = fetcher.fetch("https://img.test/c.png").await.unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn encodes_payload_as_base64() {
        let transport = ScriptedTransport::new(vec![Ok(b"hello".to_vec())]);
        let fetcher = ImageFetcher::new(transport, &network(0));

        let encoded = fetcher.fetch_base64("https://img.test/d.png").await;

        tokio_test::assert_ok!(&encoded);
        assert_eq!(encoded.unwrap(), "aGVsbG8=");
    }
}
