//! Settings resolved from the environment

use crate::engine::Palette;
use crate::error::AnalyticsError;
use once_cell::sync::Lazy;
use regex_lite::Regex;

pub const ENDPOINT_VAR: &str = "APIUSAGE_ENDPOINT";
pub const TOKEN_VAR: &str = "APIUSAGE_TOKEN";
pub const EMAIL_VAR: &str = "APIUSAGE_EMAIL";
pub const PALETTE_VAR: &str = "APIUSAGE_PALETTE";

/// rgb(...), rgba(...) or #rgb / #rrggbb / #rrggbbaa
static COLOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*(?:,\s*(?:0|1|0?\.\d+)\s*)?\)|#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8}))$",
    )
    .expect("colour pattern is valid")
});

#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// GraphQL endpoint; when unset, metrics are read from a local export
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub palette: Palette,
}

impl Settings {
    pub fn from_env() -> Result<Self, AnalyticsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalyticsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = match non_empty(ENDPOINT_VAR) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Some(url),
            Some(url) => {
                return Err(AnalyticsError::Config {
                    field: ENDPOINT_VAR,
                    reason: format!("'{}' is not an http(s) URL", url),
                })
            }
            None => None,
        };

        let palette = match non_empty(PALETTE_VAR) {
            Some(raw) => parse_palette(&raw)?,
            None => Palette::default(),
        };

        Ok(Self {
            endpoint,
            token: non_empty(TOKEN_VAR),
            palette,
        })
    }
}

/// Parse a comma-separated colour list. Commas inside `rgb(...)` are kept.
pub fn parse_palette(raw: &str) -> Result<Palette, AnalyticsError> {
    let mut colours = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                colours.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    colours.push(current);

    let colours: Vec<String> = colours
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if let Some(bad) = colours.iter().find(|c| !COLOUR.is_match(c)) {
        return Err(AnalyticsError::Config {
            field: PALETTE_VAR,
            reason: format!("'{}' is not a colour", bad),
        });
    }

    Palette::new(colours).ok_or_else(|| AnalyticsError::Config {
        field: PALETTE_VAR,
        reason: "palette is empty".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AnalyticsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let settings = settings(&[]).unwrap();
        assert!(settings.endpoint.is_none());
        assert!(settings.token.is_none());
        assert_eq!(settings.palette, Palette::default());
    }

    #[test]
    fn test_endpoint_must_be_http() {
        assert!(settings(&[(ENDPOINT_VAR, "https://metrics.example.com/graphql")]).is_ok());
        assert!(matches!(
            settings(&[(ENDPOINT_VAR, "metrics.example.com")]),
            Err(AnalyticsError::Config { field: ENDPOINT_VAR, .. })
        ));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings = settings(&[(TOKEN_VAR, "  "), (PALETTE_VAR, "")]).unwrap();
        assert!(settings.token.is_none());
        assert_eq!(settings.palette, Palette::default());
    }

    #[test]
    fn test_parse_palette_keeps_rgb_commas() {
        let palette = parse_palette("rgb(1, 2, 3), #ff8800 ,rgba(4,5,6,0.5)").unwrap();
        assert_eq!(palette.colours(), &["rgb(1, 2, 3)", "#ff8800", "rgba(4,5,6,0.5)"]);
    }

    #[test]
    fn test_parse_palette_rejects_junk() {
        assert!(parse_palette("red").is_err());
        assert!(parse_palette(" , ").is_err());
    }
}
