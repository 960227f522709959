use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ChatSettings, ReviewsSettings, WidgetKind, WidgetSettings};
use crate::services::sanitize::strip_markup;

pub const DEFAULT_REVIEWS_THEME: &str = "teal";
pub const DEFAULT_CHAT_THEME: &str = "#25D366";
pub const DEFAULT_AGENT_NAME: &str = "Jane Doe";
pub const DEFAULT_REPLY_TIME: &str = "Online";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi there 🥰 How can I help you?";
pub const DEFAULT_GREETING_MESSAGE: &str = "";

/// Tailwind palettes the reviews widget ships classes for.
pub const REVIEWS_THEMES: [&str; 4] = ["teal", "blue", "green", "purple"];

/// Prefix of greeting images stored by this service.
pub const OWNED_UPLOAD_PREFIX: &str = "/uploads/";

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{10,15}$").expect("static pattern"));

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static pattern")
});

/// Widget fields as submitted, before any cleaning.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawWidgetInput {
    pub place_id: Option<String>,
    pub place_name: Option<String>,
    #[serde(alias = "buttonColor")]
    pub theme_color: Option<String>,
    pub widget_size: Option<String>,
    pub position: Option<String>,
    pub phone_number: Option<String>,
    pub agent_name: Option<String>,
    pub reply_time: Option<String>,
    pub welcome_message: Option<String>,
    pub greeting_message: Option<String>,
    pub greeting_image: Option<String>,
}

impl RawWidgetInput {
    /// Assigns a form field by its wire name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "placeId" => &mut self.place_id,
            "placeName" => &mut self.place_name,
            "themeColor" | "buttonColor" => &mut self.theme_color,
            "widgetSize" => &mut self.widget_size,
            "position" => &mut self.position,
            "phoneNumber" => &mut self.phone_number,
            "agentName" => &mut self.agent_name,
            "replyTime" => &mut self.reply_time,
            "welcomeMessage" => &mut self.welcome_message,
            "greetingMessage" => &mut self.greeting_message,
            "greetingImage" => &mut self.greeting_image,
            _ => return,
        };
        *slot = Some(value);
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Missing,
    InvalidFormat,
    UnsupportedValue,
    TooLarge,
}

impl Reason {
    fn describe(&self) -> &'static str {
        match self {
            Reason::Missing => "is required",
            Reason::InvalidFormat => "has an invalid format",
            Reason::UnsupportedValue => "has an unsupported value",
            Reason::TooLarge => "is too large",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {}", .reason.describe())]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: Reason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: Reason) -> Self {
        Self { field, reason }
    }
}

/// Cleans and checks one submission. Same input, same output; no side effects.
pub fn validate(kind: WidgetKind, raw: &RawWidgetInput) -> Result<WidgetSettings, ValidationError> {
    match kind {
        WidgetKind::Reviews => validate_reviews(raw).map(WidgetSettings::Reviews),
        WidgetKind::Chat => validate_chat(raw).map(WidgetSettings::Chat),
    }
}

fn validate_reviews(raw: &RawWidgetInput) -> Result<ReviewsSettings, ValidationError> {
    let place_id = required("placeId", &raw.place_id)?;
    let place_name = required("placeName", &raw.place_name)?;

    let theme_color = match clean(&raw.theme_color) {
        Some(color) if REVIEWS_THEMES.contains(&color.as_str()) => color,
        Some(_) => return Err(ValidationError::new("themeColor", Reason::UnsupportedValue)),
        None => DEFAULT_REVIEWS_THEME.to_string(),
    };

    Ok(ReviewsSettings {
        place_id,
        place_name,
        theme_color,
        widget_size: parsed("widgetSize", &raw.widget_size)?.unwrap_or_default(),
    })
}

fn validate_chat(raw: &RawWidgetInput) -> Result<ChatSettings, ValidationError> {
    let phone_number = required("phoneNumber", &raw.phone_number)?;
    if !PHONE.is_match(&phone_number) {
        return Err(ValidationError::new("phoneNumber", Reason::InvalidFormat));
    }

    let theme_color = match clean(&raw.theme_color) {
        Some(color) if HEX_COLOR.is_match(&color) => color,
        Some(_) => return Err(ValidationError::new("themeColor", Reason::InvalidFormat)),
        None => DEFAULT_CHAT_THEME.to_string(),
    };

    let greeting_image = match clean(&raw.greeting_image) {
        Some(image) if is_acceptable_image_ref(&image) => Some(image),
        Some(_) => return Err(ValidationError::new("greetingImage", Reason::InvalidFormat)),
        None => None,
    };

    Ok(ChatSettings {
        phone_number,
        theme_color,
        widget_size: parsed("widgetSize", &raw.widget_size)?.unwrap_or_default(),
        position: parsed("position", &raw.position)?.unwrap_or_default(),
        agent_name: or_default(&raw.agent_name, DEFAULT_AGENT_NAME),
        reply_time: or_default(&raw.reply_time, DEFAULT_REPLY_TIME),
        welcome_message: or_default(&raw.welcome_message, DEFAULT_WELCOME_MESSAGE),
        greeting_message: or_default(&raw.greeting_message, DEFAULT_GREETING_MESSAGE),
        greeting_image,
    })
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(strip_markup)
        .filter(|cleaned| !cleaned.is_empty())
}

fn required(field: &'static str, value: &Option<String>) -> Result<String, ValidationError> {
    clean(value).ok_or(ValidationError::new(field, Reason::Missing))
}

fn or_default(value: &Option<String>, default: &str) -> String {
    clean(value).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<T>, ValidationError> {
    clean(value)
        .map(|v| {
            v.parse()
                .map_err(|_| ValidationError::new(field, Reason::UnsupportedValue))
        })
        .transpose()
}

fn is_acceptable_image_ref(value: &str) -> bool {
    if let Some(file) = value.strip_prefix(OWNED_UPLOAD_PREFIX) {
        return !file.is_empty() && !file.contains('/') && !file.contains("..");
    }
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, WidgetSize};

    fn chat(phone: &str) -> RawWidgetInput {
        RawWidgetInput {
            phone_number: Some(phone.to_string()),
            ..Default::default()
        }
    }

    fn expect_chat(settings: WidgetSettings) -> ChatSettings {
        match settings {
            WidgetSettings::Chat(chat) => chat,
            other => panic!("expected chat settings, got {other:?}"),
        }
    }

    #[test]
    fn valid_phone_is_kept_verbatim() {
        for phone in ["+14155550123", "+4915112345678", "+123456789012345"] {
            let settings = expect_chat(validate(WidgetKind::Chat, &chat(phone)).unwrap());
            assert_eq!(settings.phone_number, phone);
        }
    }

    #[test]
    fn malformed_phones_are_rejected_with_field_error() {
        for phone in ["12345", "+1234", "+abcdefghij", "14155550123", "+1234567890123456", "+٣٣٣٣٣٣٣٣٣٣"] {
            let err = validate(WidgetKind::Chat, &chat(phone)).unwrap_err();
            assert_eq!(err, ValidationError::new("phoneNumber", Reason::InvalidFormat), "{phone}");
        }
    }

    #[test]
    fn missing_phone_is_reported_as_missing() {
        let err = validate(WidgetKind::Chat, &RawWidgetInput::default()).unwrap_err();
        assert_eq!(err, ValidationError::new("phoneNumber", Reason::Missing));
        assert_eq!(err.to_string(), "phoneNumber is required");
    }

    #[test]
    fn chat_defaults_fill_omitted_fields() {
        let settings = expect_chat(validate(WidgetKind::Chat, &chat("+14155550123")).unwrap());
        assert_eq!(settings.theme_color, DEFAULT_CHAT_THEME);
        assert_eq!(settings.position, Position::BottomRight);
        assert_eq!(settings.widget_size, WidgetSize::Medium);
        assert_eq!(settings.agent_name, DEFAULT_AGENT_NAME);
        assert_eq!(settings.reply_time, DEFAULT_REPLY_TIME);
        assert_eq!(settings.welcome_message, DEFAULT_WELCOME_MESSAGE);
        assert_eq!(settings.greeting_message, "");
        assert_eq!(settings.greeting_image, None);
    }

    #[test]
    fn free_text_is_stripped_before_use() {
        let mut raw = chat("+14155550123");
        raw.agent_name = Some("<script>alert(1)</script>Hello".into());
        raw.welcome_message = Some("<b>Welcome</b>".into());
        let settings = expect_chat(validate(WidgetKind::Chat, &raw).unwrap());
        assert_eq!(settings.agent_name, "Hello");
        assert_eq!(settings.welcome_message, "Welcome");
    }

    #[test]
    fn markup_only_field_falls_back_to_default() {
        let mut raw = chat("+14155550123");
        raw.agent_name = Some("<script>alert(1)</script>".into());
        let settings = expect_chat(validate(WidgetKind::Chat, &raw).unwrap());
        assert_eq!(settings.agent_name, DEFAULT_AGENT_NAME);
    }

    #[test]
    fn chat_color_must_be_hex() {
        let mut raw = chat("+14155550123");
        raw.theme_color = Some("red; background:url(x)".into());
        let err = validate(WidgetKind::Chat, &raw).unwrap_err();
        assert_eq!(err.field, "themeColor");

        raw.theme_color = Some("#0a0".into());
        assert!(validate(WidgetKind::Chat, &raw).is_ok());
    }

    #[test]
    fn position_and_size_must_be_known() {
        let mut raw = chat("+14155550123");
        raw.position = Some("center".into());
        assert_eq!(
            validate(WidgetKind::Chat, &raw).unwrap_err(),
            ValidationError::new("position", Reason::UnsupportedValue)
        );

        raw.position = Some("top-left".into());
        raw.widget_size = Some("huge".into());
        assert_eq!(
            validate(WidgetKind::Chat, &raw).unwrap_err(),
            ValidationError::new("widgetSize", Reason::UnsupportedValue)
        );
    }

    #[test]
    fn greeting_image_accepts_urls_and_owned_refs_only() {
        let mut raw = chat("+14155550123");
        for ok in ["https://cdn.example.com/a.png", "/uploads/abc.png"] {
            raw.greeting_image = Some(ok.into());
            let settings = expect_chat(validate(WidgetKind::Chat, &raw).unwrap());
            assert_eq!(settings.greeting_image.as_deref(), Some(ok));
        }
        for bad in ["javascript:alert(1)", "/etc/passwd", "/uploads/../x", "data:image/png;base64,AA"] {
            raw.greeting_image = Some(bad.into());
            assert_eq!(
                validate(WidgetKind::Chat, &raw).unwrap_err().field,
                "greetingImage",
                "{bad}"
            );
        }
    }

    #[test]
    fn reviews_require_place_id_and_name() {
        let raw = RawWidgetInput {
            place_id: Some("ChIJ123".into()),
            ..Default::default()
        };
        assert_eq!(
            validate(WidgetKind::Reviews, &raw).unwrap_err(),
            ValidationError::new("placeName", Reason::Missing)
        );

        let raw = RawWidgetInput {
            place_name: Some("Cafe".into()),
            place_id: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            validate(WidgetKind::Reviews, &raw).unwrap_err(),
            ValidationError::new("placeId", Reason::Missing)
        );
    }

    #[test]
    fn reviews_defaults_and_theme_allow_list() {
        let mut raw = RawWidgetInput {
            place_id: Some("ChIJ123".into()),
            place_name: Some("Joe's".into()),
            ..Default::default()
        };
        match validate(WidgetKind::Reviews, &raw).unwrap() {
            WidgetSettings::Reviews(reviews) => {
                assert_eq!(reviews.theme_color, "teal");
                assert_eq!(reviews.widget_size, WidgetSize::Medium);
            }
            other => panic!("unexpected {other:?}"),
        }

        raw.theme_color = Some("chartreuse".into());
        assert_eq!(
            validate(WidgetKind::Reviews, &raw).unwrap_err(),
            ValidationError::new("themeColor", Reason::UnsupportedValue)
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let mut raw = chat("+14155550123");
        raw.agent_name = Some("Ana".into());
        assert_eq!(
            validate(WidgetKind::Chat, &raw),
            validate(WidgetKind::Chat, &raw)
        );
    }

    #[test]
    fn button_color_is_accepted_as_theme_alias() {
        let raw: RawWidgetInput = serde_json::from_value(serde_json::json!({
            "phoneNumber": "+14155550123",
            "buttonColor": "#112233"
        }))
        .unwrap();
        let settings = expect_chat(validate(WidgetKind::Chat, &raw).unwrap());
        assert_eq!(settings.theme_color, "#112233");
    }
}
