use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{time::Timestamp, DomainError, DomainResult, Key};

pub type MemberId = Key<Member>;

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex =
        Regex::new(r"^[a-z0-9]{4,20}$").expect("identifier pattern compiles");
    static ref PASSWORD_PATTERN: Regex =
        Regex::new(r"^[a-z0-9!@#$%^&*()~]{8,15}$").expect("password pattern compiles");
    static ref PHONE_NUMBER_PATTERN: Regex =
        Regex::new(r"^010-\d{4}-\d{4}$").expect("phone number pattern compiles");
}

/// A registered member
#[derive(Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub identifier: Identifier,
    pub nickname: Nickname,
    /// The argon2 hash of the password, in PHC string format
    pub password_hash: String,
    pub profile: MemberProfile,
    pub image: MemberImage,
    pub created_at: Timestamp,
}

/// A member that is about to be registered
#[derive(Debug, Clone)]
pub struct NewMember {
    pub identifier: Identifier,
    pub nickname: Nickname,
    pub password_hash: String,
    pub profile: MemberProfile,
    pub image: MemberImage,
}

/// The unique login name of a member: 4 to 20 lowercase letters or digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();

        if !IDENTIFIER_PATTERN.is_match(&value) {
            return Err(DomainError::validation(
                "identifier does not meet the constraints",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The unique display name of a member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Nickname(String);

impl Nickname {
    const MIN_LENGTH: usize = 2;
    const MAX_LENGTH: usize = 8;

    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let length = value.chars().count();

        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(DomainError::validation(
                "nickname does not meet the constraints",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A plain password as typed by the member. Never stored.
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();

        let has_letter = value.chars().any(|c| c.is_ascii_lowercase());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());

        if !PASSWORD_PATTERN.is_match(&value) || !has_letter || !has_digit {
            return Err(DomainError::validation(
                "password does not meet the constraints",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();

        if !PHONE_NUMBER_PATTERN.is_match(&value) {
            return Err(DomainError::validation(
                "phone number does not meet the constraints",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub gender: Gender,
    pub birthday: NaiveDate,
    pub phone_number: PhoneNumber,
}

/// A stored profile image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberImage {
    pub original_file_name: String,
    pub server_file_path: String,
    pub content_type: ImageContentType,
}

/// Image formats accepted for uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageContentType {
    Jpg,
    Jpeg,
    Png,
    Webp,
}

impl ImageContentType {
    /// Parses a MIME type such as `image/png`
    pub fn from_mime(mime: &str) -> DomainResult<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpg" => Ok(Self::Jpg),
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            other => Err(DomainError::Validation(format!(
                "unsupported image content type {other}"
            ))),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpg => "image/jpg",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extension, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
            Self::Png => ".png",
            Self::Webp => ".webp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpg => "JPG",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Webp => "WEBP",
        }
    }
}

impl Display for ImageContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageContentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JPG" => Ok(Self::Jpg),
            "JPEG" => Ok(Self::Jpeg),
            "PNG" => Ok(Self::Png),
            "WEBP" => Ok(Self::Webp),
            other => Err(DomainError::Validation(format!(
                "unknown image content type {other}"
            ))),
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            other => Err(DomainError::Validation(format!("unknown gender {other}"))),
        }
    }
}
