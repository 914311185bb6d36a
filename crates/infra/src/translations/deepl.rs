//! DeepL API Free client used to pre-translate new locales

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::error::{TranslationError, TranslationResult};
use crate::http::HttpClient;

/// DeepL target language for a Kimai locale.
pub fn deepl_language(locale: &str) -> Option<&'static str> {
    let language = match locale {
        "de" => "DE",
        "en" => "EN-US",
        "fr" => "FR",
        "it" => "IT",
        "ja" => "JA",
        "es" => "ES",
        "nl" => "NL",
        "pl" => "PL",
        "pt" => "PT-PT",
        "pt_BR" => "PT-BR",
        "ru" => "RU",
        "zh_CN" => "ZH",
        _ => return None,
    };
    Some(language)
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

pub struct DeeplClient {
    client: HttpClient,
    url: String,
    auth_key: String,
}

impl DeeplClient {
    pub fn new(url: impl Into<String>, auth_key: impl Into<String>) -> TranslationResult<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranslationError::Request(e.message().to_string()))?;
        Ok(Self { client, url: url.into(), auth_key: auth_key.into() })
    }

    /// Translate english `text` into `target_lang` (a DeepL language code).
    pub async fn translate(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let params = [
            ("auth_key", self.auth_key.as_str()),
            ("formality", "default"),
            ("text", text),
            ("source_lang", "en"),
            ("target_lang", target_lang),
        ];
        let request = self.client.request(Method::POST, &self.url).form(&params);
        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| TranslationError::Request(e.message().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TranslationError::Request(format!("DeepL returned HTTP {status}")));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Request(format!("invalid DeepL response: {e}")))?;
        let translated = body
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| TranslationError::Request("DeepL returned no translation".into()))?;

        debug!(target_lang, chars = text.len(), "translated with DeepL");
        Ok(translated)
    }
}
