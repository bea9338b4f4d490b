//! The parsed headers mapping.
//!
//! Keys are lowercase byte strings, including the pseudo-keys `:method`,
//! `:path`, `:protocol` and `:rx` that the parser synthesizes itself.
//! A header name repeated across the request is promoted from
//! [`HeaderValue::Single`] to [`HeaderValue::Multi`], preserving
//! occurrence order.

/// The value stored for one header name: either the single value seen,
/// or an ordered sequence when the name repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(Box<[u8]>),
    Multi(Vec<Box<[u8]>>),
}

impl HeaderValue {
    /// The first (or only) value.
    #[must_use]
    pub fn first(&self) -> &[u8] {
        match self {
            Self::Single(v) => v,
            Self::Multi(vs) => vs.first().map_or(&[][..], |v| v),
        }
    }

    /// All values in occurrence order.
    pub fn values(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
        match self {
            Self::Single(v) => Box::new(std::iter::once(&v[..])),
            Self::Multi(vs) => Box::new(vs.iter().map(|v| &v[..])),
        }
    }
}

/// The headers mapping returned by `parse_headers`, mutated afterward by
/// body reads (to keep `:rx` current).
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(Box<[u8]>, HeaderValue)>,
}

pub const PSEUDO_METHOD: &[u8] = b":method";
pub const PSEUDO_PATH: &[u8] = b":path";
pub const PSEUDO_PROTOCOL: &[u8] = b":protocol";
pub const PSEUDO_RX: &[u8] = b":rx";

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Set a pseudo-header or otherwise-unique key, overwriting any
    /// existing value rather than promoting to `Multi` (used for
    /// `:method`, `:path`, `:protocol`, `:rx`, all of which appear at
    /// most once per request).
    pub(crate) fn set_unique(&mut self, key: &[u8], value: Vec<u8>) {
        if let Some((_, v)) = self.entries.iter_mut().find(|(k, _)| k.as_ref() == key) {
            *v = HeaderValue::Single(value.into_boxed_slice());
        } else {
            self.entries
                .push((key.to_vec().into_boxed_slice(), HeaderValue::Single(value.into_boxed_slice())));
        }
    }

    /// Append a real header field, promoting to `Multi` on repeat (the
    /// key must already be lowercased by the caller).
    pub(crate) fn push_header(&mut self, key: Box<[u8]>, value: Box<[u8]>) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            match existing {
                HeaderValue::Single(first) => {
                    *existing = HeaderValue::Multi(vec![first.clone(), value]);
                }
                HeaderValue::Multi(values) => values.push(value),
            }
        } else {
            self.entries.push((key, HeaderValue::Single(value)));
        }
    }

    /// Update the `:rx` pseudo-header after a parse or body-read step.
    pub(crate) fn set_rx(&mut self, rx: u64) {
        self.set_unique(PSEUDO_RX, rx.to_string().into_bytes());
    }

    #[must_use]
    pub fn method(&self) -> Option<&[u8]> {
        self.get(PSEUDO_METHOD).map(HeaderValue::first)
    }

    #[must_use]
    pub fn path(&self) -> Option<&[u8]> {
        self.get(PSEUDO_PATH).map(HeaderValue::first)
    }

    #[must_use]
    pub fn protocol(&self) -> Option<&[u8]> {
        self.get(PSEUDO_PROTOCOL).map(HeaderValue::first)
    }

    #[must_use]
    pub fn rx(&self) -> u64 {
        self.get(PSEUDO_RX)
            .and_then(|v| std::str::from_utf8(v.first()).ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}
