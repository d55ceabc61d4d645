//! Host identity shown in greetings.

use std::env;

/// Where the container/host name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostIdentity {
    /// Read the named environment variable on every call.
    Env(String),
    /// A fixed value, used when the environment should not be consulted.
    Fixed(String),
}

impl HostIdentity {
    /// Resolve the current identity. A missing variable resolves to `""`.
    pub fn resolve(&self) -> String {
        match self {
            HostIdentity::Env(var) => env::var_os(var)
                .map(|value| value.to_string_lossy().into_owned())
                .unwrap_or_default(),
            HostIdentity::Fixed(value) => value.clone(),
        }
    }
}

/// The last `max_chars` characters of `identity`, or all of it when shorter.
pub fn display_tail(identity: &str, max_chars: usize) -> &str {
    let len = identity.chars().count();
    if len <= max_chars {
        return identity;
    }

    match identity.char_indices().nth(len - max_chars) {
        Some((start, _)) => &identity[start..],
        None => identity,
    }
}
