//! Identifier cleaning and request grouping.

/// Separator the lookup protocol uses between identifiers of one request.
pub const GROUP_SEPARATOR: char = ',';

/// Drop empty identifiers, keeping the rest verbatim and in order.
/// Whitespace-only identifiers are not empty and are kept.
pub fn clean<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    identifiers
        .into_iter()
        .map(Into::into)
        .filter(|id: &String| !id.is_empty())
        .collect()
}

/// Ordered, non-empty set of identifiers sent in one lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestGroup {
    ids: Vec<String>,
}

impl RequestGroup {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false for groups built by [`group`]; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when the response is a list of self-identifying records.
    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    /// The comma-joined resource string sent to the remote.
    pub fn composite_key(&self) -> String {
        self.ids.join(&GROUP_SEPARATOR.to_string())
    }
}

/// Partition identifiers into groups of at most `chunk` (clamped to 1).
/// Empty identifiers are dropped first; every remaining identifier lands in
/// exactly one group, in original relative order.
pub fn group<I, S>(identifiers: I, chunk: usize) -> Vec<RequestGroup>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    crate::scheduler::split_rounds(clean(identifiers), chunk)
        .into_iter()
        .map(|ids| RequestGroup { ids })
        .collect()
}
