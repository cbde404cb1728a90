use std::{borrow::Cow, fmt, str::FromStr};

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

pub const MIN_RADIX: u8 = 2;
pub const MAX_RADIX: u8 = 16;

/// Radices that have their own control in the notation widget. Every other
/// radix in `MIN_RADIX..=MAX_RADIX` lives in the custom-base dropdown.
const FIXED_RADICES: [u8; 4] = [2, 8, 10, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Containers,
    Hashing,
    Notation,
    Bytes,
    Seconds,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Target,
}

/// Every format tag understood by the `/exec` contract.
///
/// Tags are globally unique, so a tag alone identifies the variant; which
/// mode a format belongs to is answered by [`Mode::source_formats`] and
/// [`Mode::target_formats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatId {
    Xml,
    Json,
    Yaml,
    Ini,
    Csv,
    Cef,
    Syslog,
    Grok,
    Text,
    Base64,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Roman,
    Radix(u8),
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
    Date,
    Timestamp,
}

const CONTAINER_SOURCES: [FormatId; 8] = [
    FormatId::Xml,
    FormatId::Json,
    FormatId::Yaml,
    FormatId::Ini,
    FormatId::Csv,
    FormatId::Cef,
    FormatId::Syslog,
    FormatId::Grok,
];

const CONTAINER_TARGETS: [FormatId; 7] = [
    FormatId::Xml,
    FormatId::Json,
    FormatId::Yaml,
    FormatId::Ini,
    FormatId::Csv,
    FormatId::Cef,
    FormatId::Syslog,
];

const HASHING_SOURCES: [FormatId; 2] = [FormatId::Text, FormatId::Base64];

const HASHING_TARGETS: [FormatId; 8] = [
    FormatId::Text,
    FormatId::Base64,
    FormatId::Md5,
    FormatId::Sha1,
    FormatId::Sha224,
    FormatId::Sha256,
    FormatId::Sha384,
    FormatId::Sha512,
];

const BYTE_UNITS: [FormatId; 5] = [
    FormatId::Bytes,
    FormatId::Kilobytes,
    FormatId::Megabytes,
    FormatId::Gigabytes,
    FormatId::Terabytes,
];

const TIME_UNITS: [FormatId; 7] = [
    FormatId::Seconds,
    FormatId::Minutes,
    FormatId::Hours,
    FormatId::Days,
    FormatId::Weeks,
    FormatId::Months,
    FormatId::Years,
];

const DATE_FORMATS: [FormatId; 2] = [FormatId::Date, FormatId::Timestamp];

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Containers,
        Mode::Hashing,
        Mode::Notation,
        Mode::Bytes,
        Mode::Seconds,
        Mode::Date,
    ];

    /// Source formats in display order.
    pub fn source_formats(self) -> Vec<FormatId> {
        match self {
            Mode::Containers => CONTAINER_SOURCES.to_vec(),
            Mode::Hashing => HASHING_SOURCES.to_vec(),
            Mode::Notation => notation_formats(),
            Mode::Bytes => BYTE_UNITS.to_vec(),
            Mode::Seconds => TIME_UNITS.to_vec(),
            Mode::Date => DATE_FORMATS.to_vec(),
        }
    }

    /// Target formats in display order.
    pub fn target_formats(self) -> Vec<FormatId> {
        match self {
            Mode::Containers => CONTAINER_TARGETS.to_vec(),
            Mode::Hashing => HASHING_TARGETS.to_vec(),
            Mode::Notation => notation_formats(),
            Mode::Bytes => BYTE_UNITS.to_vec(),
            Mode::Seconds => TIME_UNITS.to_vec(),
            Mode::Date => DATE_FORMATS.to_vec(),
        }
    }

    pub fn has_source(self, format: FormatId) -> bool {
        self.source_formats().contains(&format)
    }

    pub fn has_target(self, format: FormatId) -> bool {
        self.target_formats().contains(&format)
    }

    pub fn ensure_source(self, format: FormatId) -> Result<(), FormatError> {
        format.check()?;
        if self.has_source(format) {
            Ok(())
        } else {
            Err(FormatError::NotInMode {
                format,
                mode: self,
                side: Side::Source,
            })
        }
    }

    pub fn ensure_target(self, format: FormatId) -> Result<(), FormatError> {
        format.check()?;
        if self.has_target(format) {
            Ok(())
        } else {
            Err(FormatError::NotInMode {
                format,
                mode: self,
                side: Side::Target,
            })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Containers => "containers",
            Mode::Hashing => "hashing",
            Mode::Notation => "notation",
            Mode::Bytes => "bytes",
            Mode::Seconds => "seconds",
            Mode::Date => "date",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| FormatError::UnknownMode(value.to_string()))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

fn notation_formats() -> Vec<FormatId> {
    let mut formats = vec![FormatId::Text, FormatId::Roman];
    formats.extend(FIXED_RADICES.iter().map(|radix| FormatId::Radix(*radix)));
    formats.extend(
        (MIN_RADIX..=MAX_RADIX)
            .filter(|radix| !FIXED_RADICES.contains(radix))
            .map(FormatId::Radix),
    );
    formats
}

impl FormatId {
    pub fn radix(radix: u8) -> Result<Self, FormatError> {
        if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
            Ok(FormatId::Radix(radix))
        } else {
            Err(FormatError::RadixOutOfRange(radix))
        }
    }

    /// `Radix` can be built directly, so its range is checked wherever a
    /// format enters a mode or goes on the wire.
    pub fn check(self) -> Result<Self, FormatError> {
        match self {
            FormatId::Radix(radix) => FormatId::radix(radix),
            other => Ok(other),
        }
    }

    /// Wire tag as sent in the `from`/`to` fields.
    pub fn tag(self) -> Cow<'static, str> {
        let tag = match self {
            FormatId::Xml => "xml",
            FormatId::Json => "json",
            FormatId::Yaml => "yaml",
            FormatId::Ini => "ini",
            FormatId::Csv => "csv",
            FormatId::Cef => "cef",
            FormatId::Syslog => "syslog",
            FormatId::Grok => "grok",
            FormatId::Text => "text",
            FormatId::Base64 => "base64",
            FormatId::Md5 => "md5",
            FormatId::Sha1 => "sha1",
            FormatId::Sha224 => "sha224",
            FormatId::Sha256 => "sha256",
            FormatId::Sha384 => "sha384",
            FormatId::Sha512 => "sha512",
            FormatId::Roman => "roman",
            FormatId::Radix(radix) => return Cow::Owned(radix.to_string()),
            FormatId::Bytes => "bytes",
            FormatId::Kilobytes => "Kb",
            FormatId::Megabytes => "Mb",
            FormatId::Gigabytes => "Gb",
            FormatId::Terabytes => "Tb",
            FormatId::Seconds => "s",
            FormatId::Minutes => "m",
            FormatId::Hours => "h",
            FormatId::Days => "d",
            FormatId::Weeks => "w",
            FormatId::Months => "M",
            FormatId::Years => "y",
            FormatId::Date => "date",
            FormatId::Timestamp => "timestamp",
        };
        Cow::Borrowed(tag)
    }

    /// Caption of the control that selects this format.
    pub fn label(self) -> Cow<'static, str> {
        let label = match self {
            FormatId::Xml => "XML",
            FormatId::Json => "JSON",
            FormatId::Yaml => "YAML",
            FormatId::Ini => "INI",
            FormatId::Csv => "CSV",
            FormatId::Cef => "CEF",
            FormatId::Syslog => "SYSLOG",
            FormatId::Grok => "GROK",
            FormatId::Text => "TEXT",
            FormatId::Base64 => "BASE64",
            FormatId::Md5 => "MD5",
            FormatId::Sha1 => "SHA1",
            FormatId::Sha224 => "SHA224",
            FormatId::Sha256 => "SHA256",
            FormatId::Sha384 => "SHA384",
            FormatId::Sha512 => "SHA512",
            FormatId::Roman => "ROME",
            FormatId::Radix(2) => "BIN",
            FormatId::Radix(8) => "OCT",
            FormatId::Radix(10) => "DEC",
            FormatId::Radix(16) => "HEX",
            FormatId::Radix(radix) => return Cow::Owned(format!("BASE {radix}")),
            FormatId::Bytes => "Bytes",
            FormatId::Kilobytes => "Kb",
            FormatId::Megabytes => "Mb",
            FormatId::Gigabytes => "Gb",
            FormatId::Terabytes => "Tb",
            FormatId::Seconds => "Seconds",
            FormatId::Minutes => "Minutes",
            FormatId::Hours => "Hours",
            FormatId::Days => "Days",
            FormatId::Weeks => "Weeks",
            FormatId::Months => "Months",
            FormatId::Years => "Years",
            FormatId::Date => "Date",
            FormatId::Timestamp => "Timestamp",
        };
        Cow::Borrowed(label)
    }

    pub fn is_digest(self) -> bool {
        matches!(
            self,
            FormatId::Md5
                | FormatId::Sha1
                | FormatId::Sha224
                | FormatId::Sha256
                | FormatId::Sha384
                | FormatId::Sha512
        )
    }

    /// Radix served by the custom-base dropdown rather than a fixed control.
    pub fn is_custom_radix(self) -> bool {
        match self {
            FormatId::Radix(radix) => {
                (MIN_RADIX..=MAX_RADIX).contains(&radix) && !FIXED_RADICES.contains(&radix)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for FormatId {
    type Err = FormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let format = match tag {
            "xml" => FormatId::Xml,
            "json" => FormatId::Json,
            "yaml" => FormatId::Yaml,
            "ini" => FormatId::Ini,
            "csv" => FormatId::Csv,
            "cef" => FormatId::Cef,
            "syslog" => FormatId::Syslog,
            "grok" => FormatId::Grok,
            "text" => FormatId::Text,
            "base64" => FormatId::Base64,
            "md5" => FormatId::Md5,
            "sha1" => FormatId::Sha1,
            "sha224" => FormatId::Sha224,
            "sha256" => FormatId::Sha256,
            "sha384" => FormatId::Sha384,
            "sha512" => FormatId::Sha512,
            "roman" => FormatId::Roman,
            "bytes" => FormatId::Bytes,
            "Kb" => FormatId::Kilobytes,
            "Mb" => FormatId::Megabytes,
            "Gb" => FormatId::Gigabytes,
            "Tb" => FormatId::Terabytes,
            "s" => FormatId::Seconds,
            "m" => FormatId::Minutes,
            "h" => FormatId::Hours,
            "d" => FormatId::Days,
            "w" => FormatId::Weeks,
            "M" => FormatId::Months,
            "y" => FormatId::Years,
            "date" => FormatId::Date,
            "timestamp" => FormatId::Timestamp,
            other if !other.is_empty() && other.bytes().all(|b| b.is_ascii_digit()) => {
                let radix = other
                    .parse::<u8>()
                    .map_err(|_| FormatError::UnknownTag(other.to_string()))?;
                FormatId::radix(radix)?
            }
            other => return Err(FormatError::UnknownTag(other.to_string())),
        };
        Ok(format)
    }
}

impl Serialize for FormatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let format = self.check().map_err(ser::Error::custom)?;
        serializer.serialize_str(&format.tag())
    }
}

impl<'de> Deserialize<'de> for FormatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Cow::<'de, str>::deserialize(deserializer)?;
        tag.parse().map_err(de::Error::custom)
    }
}
