//! Hex MD5 digests as written in manifests and produced by hashing.

use crate::error::ChecksumError;
use std::fmt;
use std::str::FromStr;

/// Number of hex characters in an MD5 digest.
pub const DIGEST_HEX_LEN: usize = 32;

/// An MD5 digest in its 32-character hex form.
///
/// Parsing keeps the text exactly as written. A manifest digest in upper
/// case therefore never equals the lower-case digest produced by
/// [`compute_md5`](crate::digest::compute_md5), and the entry is treated as
/// stale.
///
/// ```
/// use hathi_checksum::md5_digest::Md5Digest;
///
/// let digest: Md5Digest = "d41d8cd98f00b204e9800998ecf8427e".parse()?;
/// assert_eq!(digest.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
/// assert!("d41d8cd9".parse::<Md5Digest>().is_err());
/// # Ok::<(), hathi_checksum::error::ChecksumError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Md5Digest(String);

impl Md5Digest {
    /// Encode raw hasher output as lower-case hex.
    pub(crate) fn from_output(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// The digest text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Md5Digest {
    type Err = ChecksumError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let is_hex = text.bytes().all(|byte| byte.is_ascii_hexdigit());
        if text.len() == DIGEST_HEX_LEN && is_hex {
            Ok(Self(text.to_owned()))
        } else {
            Err(ChecksumError::MalformedEntry {
                reason: format!("digest {text:?} is not {DIGEST_HEX_LEN} hex characters"),
            })
        }
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lower("d41d8cd98f00b204e9800998ecf8427e")]
    #[case::upper("D41D8CD98F00B204E9800998ECF8427E")]
    fn keeps_text_as_written(#[case] text: &str) {
        let digest: Md5Digest = text.parse().expect("valid digest");
        assert_eq!(digest.as_str(), text);
    }

    #[rstest]
    #[case::too_short("d41d8cd98f00b204e9800998ecf8427")]
    #[case::too_long("d41d8cd98f00b204e9800998ecf8427e0")]
    #[case::empty("")]
    #[case::non_hex("g41d8cd98f00b204e9800998ecf8427e")]
    #[case::multibyte("d41d8cd98f00b204e9800998ecf842é")]
    fn rejects_anything_but_32_hex_characters(#[case] text: &str) {
        let err = text.parse::<Md5Digest>().expect_err("digest should be rejected");
        assert!(err.is_malformed());
        assert!(err.to_string().contains("32 hex characters"));
    }

    #[test]
    fn upper_case_differs_from_computed_digest() {
        let computed = Md5Digest::from_output(&[
            0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec, 0xf8,
            0x42, 0x7e,
        ]);
        let recorded: Md5Digest = "D41D8CD98F00B204E9800998ECF8427E".parse().expect("valid");
        assert_eq!(computed.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_ne!(computed, recorded);
    }
}
