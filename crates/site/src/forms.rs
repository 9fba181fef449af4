//! Form input validation for the review and contact forms.
//!
//! Fields hold raw user input. Validation reports every failing field at
//! once, each with the message shown next to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wasui_core::record::ReviewDetails;
use wasui_core::{ContentType, Details, Record, RecordId};

pub const REQUIRED: &str = "この項目は必須です";
pub const INVALID_EMAIL: &str = "メールアドレスの形式が正しくありません";
pub const EMAIL_MISMATCH: &str = "メールアドレスが一致しません";
pub const NOT_KATAKANA: &str = "カタカナで入力してください";
pub const INVALID_PHONE: &str = "電話番号の形式が正しくありません";
pub const INVALID_RATING: &str = "評価を1〜5で選択してください";
pub const UNKNOWN_INQUIRY: &str = "お問い合わせの種類を選択してください";
pub const MESSAGE_TOO_LONG: &str = "1000文字以内で入力してください";

pub const MESSAGE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct FormError {
    pub errors: Vec<FieldError>,
}

impl FormError {
    /// The message for one field, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    /// Record a required-field failure; true if the value is present.
    fn required(&mut self, field: &'static str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(field, REQUIRED);
            return false;
        }
        true
    }

    fn finish(self) -> Result<(), FormError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(FormError {
                errors: self.errors,
            })
        }
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Katakana block characters and whitespace only.
pub fn is_katakana(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| ('\u{30A0}'..='\u{30FF}').contains(&c) || c.is_whitespace())
}

/// Digits, hyphens, parentheses and spaces only.
pub fn is_valid_phone(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '(' | ')') || c.is_whitespace())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewForm {
    pub product: String,
    pub rating: String,
    pub name: String,
    pub content: String,
    pub age: String,
    pub gender: String,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<u8, FormError> {
        let mut check = Checker::default();
        check.required("product", &self.product);
        check.required("name", &self.name);
        check.required("content", &self.content);

        let rating = self
            .rating
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|r| (1..=5).contains(r));
        if rating.is_none() {
            check.fail("rating", INVALID_RATING);
        }
        check.finish()?;
        Ok(rating.unwrap_or_default())
    }

    /// Build the active review this form describes, dated `now`.
    pub fn to_record(&self, now: DateTime<Utc>) -> Result<Record, FormError> {
        let rating = self.validate()?;
        Ok(Record {
            id: RecordId::generate(ContentType::Review),
            category: None,
            active: true,
            featured: false,
            created_at: now,
            image: None,
            details: Details::Review(ReviewDetails {
                customer_name: Some(self.name.trim().to_string()),
                rating: Some(rating),
                content: self.content.trim().to_string(),
                product: Some(self.product.trim().to_string()),
                age: optional(&self.age),
                gender: optional(&self.gender),
                helpful: 0,
            }),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryType {
    Product,
    Order,
    Gift,
    Store,
    Other,
}

impl InquiryType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "product" => Some(InquiryType::Product),
            "order" => Some(InquiryType::Order),
            "gift" => Some(InquiryType::Gift),
            "store" => Some(InquiryType::Store),
            "other" => Some(InquiryType::Other),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InquiryType::Product => "商品について",
            InquiryType::Order => "ご注文について",
            InquiryType::Gift => "ギフトについて",
            InquiryType::Store => "店舗について",
            InquiryType::Other => "その他",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    pub inquiry_type: String,
    pub subject: String,
    pub message: String,
    pub last_name: String,
    pub first_name: String,
    pub last_name_kana: String,
    pub first_name_kana: String,
    pub email: String,
    pub email_confirm: String,
    /// Optional.
    pub phone: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), FormError> {
        let mut check = Checker::default();

        if check.required("inquiryType", &self.inquiry_type)
            && InquiryType::parse(&self.inquiry_type).is_none()
        {
            check.fail("inquiryType", UNKNOWN_INQUIRY);
        }
        check.required("subject", &self.subject);
        if check.required("message", &self.message)
            && self.message.trim().chars().count() > MESSAGE_MAX_CHARS
        {
            check.fail("message", MESSAGE_TOO_LONG);
        }
        check.required("lastName", &self.last_name);
        check.required("firstName", &self.first_name);

        for (field, value) in [
            ("lastNameKana", &self.last_name_kana),
            ("firstNameKana", &self.first_name_kana),
        ] {
            if check.required(field, value) && !is_katakana(value.trim()) {
                check.fail(field, NOT_KATAKANA);
            }
        }

        let email_ok = check.required("email", &self.email) && {
            let valid = is_valid_email(self.email.trim());
            if !valid {
                check.fail("email", INVALID_EMAIL);
            }
            valid
        };
        if check.required("emailConfirm", &self.email_confirm)
            && email_ok
            && self.email.trim() != self.email_confirm.trim()
        {
            check.fail("emailConfirm", EMAIL_MISMATCH);
        }

        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            check.fail("phone", INVALID_PHONE);
        }

        check.finish()
    }

    /// Full name as shown on the confirmation step.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name.trim(), self.first_name.trim())
            .trim()
            .to_string()
    }
}
