use byte_unit::{Byte, Unit};
use serde::{de, Deserialize};

use crate::sim::error::ConfigError;

/// Parse a memory size the way the simulator's option strings spell them:
///  4096, 4096B
///  32kB, 32KiB, 32k
///  1MB, 1MiB
///  16GB
///
/// Unit prefixes are binary regardless of the `i`, so "32kB" is 32768 bytes.
pub fn parse_mem_size(input: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSize {
        input: input.to_owned(),
        reason,
    };

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '_')
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid("missing a leading number".to_owned()));
    }
    let count: u64 = digits
        .replace('_', "")
        .parse()
        .map_err(|e| invalid(format!("{e}")))?;

    let unit = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => Unit::B,
        "k" | "kb" | "kib" => Unit::KiB,
        "m" | "mb" | "mib" => Unit::MiB,
        "g" | "gb" | "gib" => Unit::GiB,
        "t" | "tb" | "tib" => Unit::TiB,
        other => return Err(invalid(format!("unknown unit '{other}'"))),
    };

    Byte::from_u64_with_unit(count, unit)
        .map(|b| b.as_u64())
        .ok_or_else(|| invalid("size overflows u64".to_owned()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

/// serde helper for fields holding a memory size as either an integer or a
/// size string.
pub fn deserialize_mem_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: de::Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(n) => Ok(n),
        SizeRepr::Text(s) => parse_mem_size(&s).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_suffixed_bytes() {
        assert_eq!(parse_mem_size("4096").unwrap(), 4096);
        assert_eq!(parse_mem_size("4096B").unwrap(), 4096);
        assert_eq!(parse_mem_size("64_000").unwrap(), 64_000);
    }

    #[test]
    fn prefixes_are_binary() {
        assert_eq!(parse_mem_size("32kB").unwrap(), 32 * 1024);
        assert_eq!(parse_mem_size("32KiB").unwrap(), 32 * 1024);
        assert_eq!(parse_mem_size("256kB").unwrap(), 256 * 1024);
        assert_eq!(parse_mem_size("1MB").unwrap(), 1 << 20);
        assert_eq!(parse_mem_size("16GB").unwrap(), 16 << 30);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_mem_size("kB"),
            Err(ConfigError::InvalidSize { .. })
        ));
        assert!(matches!(
            parse_mem_size("12 parsecs"),
            Err(ConfigError::InvalidSize { .. })
        ));
    }
}
