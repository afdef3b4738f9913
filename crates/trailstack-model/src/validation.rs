//! Validation of declared resource attributes.
//!
//! Bucket names follow the
//! [Amazon S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html);
//! tags follow the S3 bucket tagging limits. Catching these at definition
//! time keeps malformed names from ever reaching the provisioning engine.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::ResourceError;

/// Maximum number of tags allowed on a single bucket.
const MAX_BUCKET_TAGS: usize = 50;

/// Maximum length of a tag key in characters.
const MAX_TAG_KEY_LEN: usize = 128;

/// Maximum length of a tag value in characters.
const MAX_TAG_VALUE_LEN: usize = 256;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Validate an S3 bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots, and no dot adjacent to a hyphen
/// - Not formatted as an IPv4 address (e.g. `192.168.0.1`)
/// - Must not start with `xn--` or `sthree-`
/// - Must not end with `-s3alias` or `--ol-s3`
///
/// # Errors
///
/// Returns [`ResourceError::InvalidBucketName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use trailstack_model::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("sublog.sample-trail-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), ResourceError> {
    let invalid = |reason: &str| {
        Err(ResourceError::InvalidBucketName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        })
    };
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        ));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return invalid(
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        );
    }

    let is_alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !is_alnum(name.as_bytes()[0]) || !is_alnum(name.as_bytes()[len - 1]) {
        return invalid("Bucket name must start and end with a letter or number");
    }

    if name.contains("..") {
        return invalid("Bucket name must not contain consecutive dots");
    }

    if name.contains(".-") || name.contains("-.") {
        return invalid("Bucket name must not contain a dot next to a hyphen");
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return invalid("Bucket name must not be formatted as an IP address");
    }

    for prefix in ["xn--", "sthree-"] {
        if name.starts_with(prefix) {
            return invalid(&format!("Bucket name must not start with '{prefix}'"));
        }
    }

    for suffix in ["-s3alias", "--ol-s3"] {
        if name.ends_with(suffix) {
            return invalid(&format!("Bucket name must not end with '{suffix}'"));
        }
    }

    Ok(())
}

/// Validate a bucket tag set.
///
/// # Errors
///
/// Returns [`ResourceError::InvalidTag`] if there are too many tags, or a
/// key or value is out of bounds.
pub fn validate_tags(tags: &BTreeMap<String, String>) -> Result<(), ResourceError> {
    if tags.len() > MAX_BUCKET_TAGS {
        return Err(ResourceError::InvalidTag {
            message: format!(
                "Bucket must not have more than {MAX_BUCKET_TAGS} tags, got {}",
                tags.len()
            ),
        });
    }

    for (key, value) in tags {
        let key_len = key.chars().count();
        if key_len == 0 || key_len > MAX_TAG_KEY_LEN {
            return Err(ResourceError::InvalidTag {
                message: format!(
                    "Tag key must be between 1 and {MAX_TAG_KEY_LEN} characters, got {key_len}"
                ),
            });
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(ResourceError::InvalidTag {
                message: format!("Tag value for '{key}' must not exceed {MAX_TAG_VALUE_LEN} characters"),
            });
        }
    }

    Ok(())
}
