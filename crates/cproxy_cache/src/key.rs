/// Cache key: the raw request path, case-sensitive, exact match.
#[derive(Hash, Eq, PartialEq, Debug, Clone)]
pub struct CacheKey {
    pub path: String,
}

impl CacheKey {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
