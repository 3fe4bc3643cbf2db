use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Reads a `.json` file from `path`.
///
/// ```rust,ignore
/// let output: DesiredType = newsdesk_common::read_json(path).await?;
/// ```
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let file = tokio::fs::read(path).await.map_err(|e| {
        log::error!("failed to read {path}: {e}");
        e
    })?;
    let data: T = serde_json::from_slice(&file)?;
    Ok(data)
}

/// Initial selections for a session, optionally loaded from a `.json` profile:
///
/// ```json
/// {
///     "api_url": "http://localhost:8000",
///     "ticker": "MBG.DE",
///     "sector": "Automotive",
///     "language": "English",
///     "chart_period": "3m"
/// }
/// ```
///
/// Every field is optional.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub api_url: Option<String>,
    pub ticker: String,
    pub sector: String,
    pub language: String,
    pub chart_period: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: None,
            ticker: "ABSI".to_string(),
            sector: "Biotechnology".to_string(),
            language: "German".to_string(),
            chart_period: "1y".to_string(),
        }
    }
}

impl Profile {
    /// Load a profile from `path`, or the defaults when no path is given.
    pub async fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let profile: Profile = read_json(path).await?;
                log::debug!("profile loaded from {path}: {profile:?}");
                Ok(profile)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_keeps_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"ticker": "NVDA"}"#).unwrap();
        assert_eq!(profile.ticker, "NVDA");
        assert_eq!(profile.sector, "Biotechnology");
        assert_eq!(profile.chart_period, "1y");
        assert!(profile.api_url.is_none());
    }

    #[tokio::test]
    async fn load_from_file() {
        let path = std::env::temp_dir().join(format!("newsdesk-profile-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"language": "English", "api_url": "http://10.0.0.2:8000"}"#)
            .await
            .unwrap();

        let profile = Profile::load(path.to_str()).await.unwrap();
        assert_eq!(profile.language, "English");
        assert_eq!(profile.api_url.as_deref(), Some("http://10.0.0.2:8000"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        assert!(Profile::load(Some("/nonexistent/newsdesk.json")).await.is_err());
    }
}
