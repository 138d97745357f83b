//! Display settings stored as a single row.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default catalog refresh cadence for the player.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;
/// The player never polls faster than this.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 5_000;
/// Nor slower than once a day.
pub const MAX_REFRESH_INTERVAL_MS: u64 = 86_400_000;

const DEFAULT_MARQUEE_TEXT: &str = "PARATECH SOLUÇÕES E SISTEMAS - Sistema de Mídia Digital";
const DEFAULT_NEWS_FEED: &str = "https://feeds.feedburner.com/g1/economia";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Unknown values render dark.
    pub fn parse_or_dark(s: &str) -> Self {
        match s {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }

    pub fn parse_or_landscape(s: &str) -> Self {
        match s {
            "portrait" => Orientation::Portrait,
            _ => Orientation::Landscape,
        }
    }
}

/// Visual chrome and player cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,
    pub show_marquee: bool,
    pub marquee_text: String,
    pub show_footer: bool,
    pub show_widgets: bool,
    pub show_lottery: bool,
    pub show_weather: bool,
    pub show_news: bool,
    pub lottery_api_key: String,
    pub weather_api_key: String,
    pub news_rss_feed: String,
    pub mute_videos: bool,
    pub player_refresh_interval_ms: u64,
    pub player_orientation: Orientation,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            show_marquee: true,
            marquee_text: DEFAULT_MARQUEE_TEXT.to_string(),
            show_footer: true,
            show_widgets: true,
            show_lottery: true,
            show_weather: true,
            show_news: true,
            lottery_api_key: String::new(),
            weather_api_key: String::new(),
            news_rss_feed: DEFAULT_NEWS_FEED.to_string(),
            mute_videos: false,
            player_refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            player_orientation: Orientation::Landscape,
        }
    }
}

impl AppSettings {
    /// Refresh cadence with the floor applied.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(clamp_refresh_interval(self.player_refresh_interval_ms))
    }

    /// Merge a partial update into these settings.
    pub fn apply(&mut self, update: &UpdateSettingsRequest) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(v) = update.show_marquee {
            self.show_marquee = v;
        }
        if let Some(v) = &update.marquee_text {
            self.marquee_text = v.clone();
        }
        if let Some(v) = update.show_footer {
            self.show_footer = v;
        }
        if let Some(v) = update.show_widgets {
            self.show_widgets = v;
        }
        if let Some(v) = update.show_lottery {
            self.show_lottery = v;
        }
        if let Some(v) = update.show_weather {
            self.show_weather = v;
        }
        if let Some(v) = update.show_news {
            self.show_news = v;
        }
        if let Some(v) = &update.lottery_api_key {
            self.lottery_api_key = v.clone();
        }
        if let Some(v) = &update.weather_api_key {
            self.weather_api_key = v.clone();
        }
        if let Some(v) = &update.news_rss_feed {
            self.news_rss_feed = v.clone();
        }
        if let Some(v) = update.mute_videos {
            self.mute_videos = v;
        }
        if let Some(v) = update.player_refresh_interval_ms {
            self.player_refresh_interval_ms = clamp_refresh_interval(v);
        }
        if let Some(v) = update.player_orientation {
            self.player_orientation = v;
        }
    }
}

/// Request body for a partial settings update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub show_marquee: Option<bool>,
    #[serde(default)]
    pub marquee_text: Option<String>,
    #[serde(default)]
    pub show_footer: Option<bool>,
    #[serde(default)]
    pub show_widgets: Option<bool>,
    #[serde(default)]
    pub show_lottery: Option<bool>,
    #[serde(default)]
    pub show_weather: Option<bool>,
    #[serde(default)]
    pub show_news: Option<bool>,
    #[serde(default)]
    pub lottery_api_key: Option<String>,
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub news_rss_feed: Option<String>,
    #[serde(default)]
    pub mute_videos: Option<bool>,
    #[serde(default)]
    pub player_refresh_interval_ms: Option<u64>,
    #[serde(default)]
    pub player_orientation: Option<Orientation>,
}

pub fn clamp_refresh_interval(ms: u64) -> u64 {
    ms.clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS)
}
