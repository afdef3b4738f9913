//! Deterministic logical ids for template resources.
//!
//! A resource's logical id is derived from its construct path: the
//! alphanumeric characters of the path components followed by the first
//! eight hex digits (uppercase) of the MD5 of the `/`-joined path. The hash
//! keeps ids unique when two paths flatten to the same human-readable text.

use md5::{Digest, Md5};

/// Path component skipped everywhere, including the hash.
const HIDDEN_ID: &str = "Default";

/// Path component kept in the hash but dropped from the readable part.
const HIDDEN_FROM_HUMAN_ID: &str = "Resource";

/// Separator between path components.
const PATH_SEP: &str = "/";

/// Number of hash characters appended.
const HASH_LEN: usize = 8;

/// Maximum length of the readable part.
const MAX_HUMAN_LEN: usize = 240;

/// Maximum length of a logical id.
const MAX_ID_LEN: usize = 255;

/// Path of a construct below its stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructPath {
    components: Vec<String>,
}

impl ConstructPath {
    /// Path of a top-level construct.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            components: vec![id.into()],
        }
    }

    /// Path of a child construct.
    #[must_use]
    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(id.into());
        Self { components }
    }

    /// Path of the underlying template resource of this construct.
    #[must_use]
    pub fn resource(&self) -> Self {
        self.child(HIDDEN_FROM_HUMAN_ID)
    }

    /// Logical id derived from this path.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailstack_synth::ConstructPath;
    ///
    /// let id = ConstructPath::new("a").child("b").logical_id();
    /// assert_eq!(id, "abA7E86136");
    /// ```
    #[must_use]
    pub fn logical_id(&self) -> String {
        let components: Vec<&str> = self
            .components
            .iter()
            .map(String::as_str)
            .filter(|c| *c != HIDDEN_ID)
            .collect();

        if let [single] = components.as_slice() {
            let candidate = remove_non_alphanumeric(single);
            if candidate.len() <= MAX_ID_LEN {
                return candidate;
            }
        }

        let hash = path_hash(&components);
        let mut human: String = remove_dupes(&components)
            .into_iter()
            .filter(|c| *c != HIDDEN_FROM_HUMAN_ID)
            .map(remove_non_alphanumeric)
            .collect();
        human.truncate(MAX_HUMAN_LEN);

        human + &hash
    }
}

impl std::fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.components.join(PATH_SEP))
    }
}

fn path_hash(components: &[&str]) -> String {
    let digest = Md5::digest(components.join(PATH_SEP).as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash.to_ascii_uppercase()
}

/// Drop components already contained at the end of their predecessor.
fn remove_dupes<'a>(components: &[&'a str]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::with_capacity(components.len());
    for component in components {
        if out.last().is_none_or(|prev| !prev.ends_with(component)) {
            out.push(*component);
        }
    }
    out
}

fn remove_non_alphanumeric(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}
