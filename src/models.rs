use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which widget family a record configures.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Reviews,
    Chat,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Reviews => "reviews",
            WidgetKind::Chat => "chat",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl WidgetSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetSize::Small => "small",
            WidgetSize::Medium => "medium",
            WidgetSize::Large => "large",
        }
    }
}

impl FromStr for WidgetSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(WidgetSize::Small),
            "medium" => Ok(WidgetSize::Medium),
            "large" => Ok(WidgetSize::Large),
            _ => Err(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
        }
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Position::TopRight | Position::BottomRight)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Position::BottomLeft | Position::BottomRight)
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(Position::TopLeft),
            "top-right" => Ok(Position::TopRight),
            "bottom-left" => Ok(Position::BottomLeft),
            "bottom-right" => Ok(Position::BottomRight),
            _ => Err(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSettings {
    pub place_id: String,
    pub place_name: String,
    pub theme_color: String,
    pub widget_size: WidgetSize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub phone_number: String,
    pub theme_color: String,
    pub widget_size: WidgetSize,
    pub position: Position,
    pub agent_name: String,
    pub reply_time: String,
    pub welcome_message: String,
    pub greeting_message: String,
    /// External `http(s)` URL or an owned `/uploads/...` reference.
    pub greeting_image: Option<String>,
}

/// Mutable part of a record. The tag doubles as the record's `kind`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WidgetSettings {
    Reviews(ReviewsSettings),
    Chat(ChatSettings),
}

impl WidgetSettings {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetSettings::Reviews(_) => WidgetKind::Reviews,
            WidgetSettings::Chat(_) => WidgetKind::Chat,
        }
    }

    pub fn greeting_image(&self) -> Option<&str> {
        match self {
            WidgetSettings::Chat(chat) => chat.greeting_image.as_deref(),
            WidgetSettings::Reviews(_) => None,
        }
    }
}

/// The persisted unit. `id` and `created_at` are owned by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub id: String,
    #[serde(flatten)]
    pub settings: WidgetSettings,
    pub created_at: DateTime<Utc>,
}

impl WidgetConfig {
    pub fn kind(&self) -> WidgetKind {
        self.settings.kind()
    }

    /// Copy of the record with owned asset references turned into absolute URLs.
    pub fn with_absolute_assets(&self, base_url: &str) -> WidgetConfig {
        let mut config = self.clone();
        if let WidgetSettings::Chat(chat) = &mut config.settings {
            chat.greeting_image = chat
                .greeting_image
                .take()
                .map(|image| absolutize(base_url, &image));
        }
        config
    }
}

pub fn absolutize(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), reference)
    }
}
