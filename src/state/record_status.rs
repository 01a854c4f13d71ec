/// Outcome and content classifications stored in the processed-URL ledger
use std::fmt;

/// Terminal outcome of one processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessStatus {
    /// Text extracted and appended to the text artifact
    Success,

    /// Fetched, but no usable text
    Empty,

    /// Network, HTTP or extraction failure
    Error,

    /// Deliberately not extracted (wrong type, oversize, duplicate, disallowed)
    Skipped,
}

impl ProcessStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "empty" => Some(Self::Empty),
            "error" => Some(Self::Error),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::Success, Self::Empty, Self::Error, Self::Skipped]
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Kind of resource a ledger record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentKind {
    Html,
    Pdf,
    Other,
}

impl ContentKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Other => "other",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "html" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Classifies a `Content-Type` header value
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Self::Html,
            "application/pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Html, Self::Pdf, Self::Other]
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
