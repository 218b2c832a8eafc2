use crate::collectors::Sample;
use crate::config::QuoteConfig;
use crate::snapshot::Word;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const FALLBACK_CONTENT: &str = "Talk is cheap, show me your code";
pub const FALLBACK_AUTHOR: &str = "Linus Torvalds";

#[derive(Debug, Default, Deserialize)]
struct HitokotoPayload {
    #[serde(default)]
    hitokoto: Option<String>,
    #[serde(default)]
    from_who: Option<String>,
    #[serde(default)]
    from: Option<String>,
}

pub async fn fetch_word(client: &Client, cfg: &QuoteConfig) -> Sample<Word> {
    let request = client
        .get(&cfg.url)
        .timeout(Duration::from_millis(cfg.timeout_ms));

    let response = match request.send().await {
        Ok(resp) => resp,
        Err(err) => {
            return fallback_word(format!("запрос к {} не выполнен: {err}", cfg.url));
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        return fallback_word(format!("сервис цитат ответил статусом {status}"));
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            return fallback_word(format!("не удалось прочитать тело ответа: {err}"));
        }
    };

    match serde_json::from_slice::<HitokotoPayload>(&body) {
        Ok(payload) => Sample::Measured(word_from_payload(payload)),
        Err(err) => fallback_word(format!("не удалось разобрать JSON цитаты: {err}")),
    }
}

fn fallback_word(reason: String) -> Sample<Word> {
    Sample::Fallback {
        value: Word {
            content: FALLBACK_CONTENT.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
        },
        reason,
    }
}

fn word_from_payload(payload: HitokotoPayload) -> Word {
    let content = payload
        .hitokoto
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_CONTENT.to_string());
    let author = payload
        .from_who
        .filter(|v| !v.trim().is_empty())
        .or_else(|| payload.from.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_AUTHOR.to_string());
    Word { content, author }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn quote_cfg(url: String) -> QuoteConfig {
        QuoteConfig {
            url,
            timeout_ms: 1_000,
        }
    }

    fn payload(
        hitokoto: Option<&str>,
        from_who: Option<&str>,
        from: Option<&str>,
    ) -> HitokotoPayload {
        HitokotoPayload {
            hitokoto: hitokoto.map(str::to_string),
            from_who: from_who.map(str::to_string),
            from: from.map(str::to_string),
        }
    }

    async fn serve_once(response: String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0_u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        addr
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn author_prefers_from_who() {
        let word = word_from_payload(payload(Some("X"), Some("Y"), Some("Z")));
        assert_eq!(word.content, "X");
        assert_eq!(word.author, "Y");
    }

    #[test]
    fn author_falls_back_to_from() {
        let word = word_from_payload(payload(Some("X"), None, Some("Z")));
        assert_eq!(word.author, "Z");

        let word = word_from_payload(payload(Some("X"), Some("  "), Some("Z")));
        assert_eq!(word.author, "Z");
    }

    #[test]
    fn missing_fields_use_fallback_literals() {
        let word = word_from_payload(payload(None, None, None));
        assert_eq!(word.content, FALLBACK_CONTENT);
        assert_eq!(word.author, FALLBACK_AUTHOR);

        let word = word_from_payload(payload(Some(""), None, None));
        assert_eq!(word.content, FALLBACK_CONTENT);
    }

    #[tokio::test]
    async fn refused_connection_returns_fallback_pair() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new();
        match fetch_word(&client, &quote_cfg(format!("http://{addr}"))).await {
            Sample::Fallback { value, .. } => {
                assert_eq!(value.content, FALLBACK_CONTENT);
                assert_eq!(value.author, FALLBACK_AUTHOR);
            }
            Sample::Measured(_) => panic!("ожидалось запасное значение"),
        }
    }

    #[tokio::test]
    async fn non_200_status_returns_fallback_pair() {
        let addr = serve_once(http_response("500 Internal Server Error", "{}")).await;

        let client = Client::new();
        match fetch_word(&client, &quote_cfg(format!("http://{addr}"))).await {
            Sample::Fallback { value, reason } => {
                assert_eq!(value.content, FALLBACK_CONTENT);
                assert_eq!(value.author, FALLBACK_AUTHOR);
                assert!(reason.contains("500"));
            }
            Sample::Measured(_) => panic!("ожидалось запасное значение"),
        }
    }

    #[tokio::test]
    async fn unparseable_body_returns_fallback_pair() {
        let addr = serve_once(http_response("200 OK", "не json")).await;

        let client = Client::new();
        match fetch_word(&client, &quote_cfg(format!("http://{addr}"))).await {
            Sample::Fallback { value, .. } => {
                assert_eq!(value.content, FALLBACK_CONTENT);
                assert_eq!(value.author, FALLBACK_AUTHOR);
            }
            Sample::Measured(_) => panic!("ожидалось запасное значение"),
        }
    }

    #[tokio::test]
    async fn successful_response_is_measured() {
        let body = "{\"hitokoto\":\"X\",\"from_who\":\"Y\",\"from\":\"Z\"}";
        let addr = serve_once(http_response("200 OK", body)).await;

        let client = Client::new();
        match fetch_word(&client, &quote_cfg(format!("http://{addr}"))).await {
            Sample::Measured(word) => {
                assert_eq!(word.content, "X");
                assert_eq!(word.author, "Y");
            }
            Sample::Fallback { reason, .. } => {
                panic!("ожидалось измеренное значение, причина запасного: {reason}")
            }
        }
    }
}
