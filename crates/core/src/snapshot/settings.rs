use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Site-wide settings edited in the CMS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub hours: Option<String>,
    pub email: Option<String>,
    /// Site-wide announcement banner.
    pub notice: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub line: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Twitter,
    Line,
}

impl SocialPlatform {
    pub fn as_str(self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Line => "line",
        }
    }
}

impl SiteSettings {
    /// Read settings one field at a time. Numbers and booleans are kept as
    /// text; any other non-string value is dropped and its key returned.
    pub fn from_map_lenient(map: &Map<String, Value>) -> (Self, Vec<&'static str>) {
        let mut dropped = Vec::new();
        let mut text = |key: &'static str| match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(_) => {
                dropped.push(key);
                None
            }
        };
        let settings = Self {
            site_name: text("siteName"),
            phone: text("phone"),
            address: text("address"),
            hours: text("hours"),
            email: text("email"),
            notice: text("notice"),
            facebook: text("facebook"),
            instagram: text("instagram"),
            twitter: text("twitter"),
            line: text("line"),
        };
        (settings, dropped)
    }

    /// `tel:` link with everything but digits and `+` removed.
    pub fn tel_href(&self) -> Option<String> {
        let phone = self.phone.as_deref()?;
        let dialable: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        Some(format!("tel:{dialable}"))
    }

    pub fn mailto_href(&self) -> Option<String> {
        self.email.as_deref().map(|e| format!("mailto:{e}"))
    }

    /// The announcement, only when it has visible text.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Configured social links in display order.
    pub fn social_links(&self) -> Vec<(SocialPlatform, &str)> {
        [
            (SocialPlatform::Facebook, &self.facebook),
            (SocialPlatform::Instagram, &self.instagram),
            (SocialPlatform::Twitter, &self.twitter),
            (SocialPlatform::Line, &self.line),
        ]
        .into_iter()
        .filter_map(|(platform, url)| {
            url.as_deref()
                .filter(|u| !u.is_empty())
                .map(|u| (platform, u))
        })
        .collect()
    }
}
