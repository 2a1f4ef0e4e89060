use scour_common::{Result, ScourError};

/// Ordered, case-insensitive keywords. Earlier entries win when several are
/// present in the same text.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    /// (as configured, lowercased)
    entries: Vec<(String, String)>,
}

impl KeywordSet {
    /// Build a set from keywords in priority order.
    ///
    /// Blank keywords are rejected since they would match every page.
    /// Case-insensitive duplicates keep their first position.
    ///
    /// ```
    /// use scour_web::KeywordSet;
    ///
    /// let set = KeywordSet::new(["alpha", "beta", "ALPHA"]).unwrap();
    /// assert_eq!(set.len(), 2);
    /// assert_eq!(set.first_match("only Beta here"), Some("beta"));
    /// ```
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for kw in keywords {
            let kw = kw.into();
            if kw.trim().is_empty() {
                return Err(ScourError::Config("keywords must not be blank".into()));
            }
            let lowered = kw.to_lowercase();
            if entries.iter().any(|(_, l)| *l == lowered) {
                continue;
            }
            entries.push((kw, lowered));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords as configured, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(kw, _)| kw.as_str())
    }

    /// First keyword (in list order) contained in `text`, ignoring case.
    /// Scanning stops at the first hit.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.entries
            .iter()
            .find(|(_, lowered)| haystack.contains(lowered.as_str()))
            .map(|(kw, _)| kw.as_str())
    }
}
