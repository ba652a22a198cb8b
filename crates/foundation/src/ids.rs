/// Stable identifier of a boundary region (e.g. `"b1"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundaryId(String);

impl BoundaryId {
    pub fn new(id: impl Into<String>) -> Self {
        BoundaryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoundaryId {
    fn from(s: &str) -> Self {
        BoundaryId(s.to_string())
    }
}

impl From<String> for BoundaryId {
    fn from(s: String) -> Self {
        BoundaryId(s)
    }
}
