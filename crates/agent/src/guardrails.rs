use storefront_core::config::{
    ScopeConfig, ScopeMode, DEFAULT_ALLOW_KEYWORDS, DEFAULT_DENY_KEYWORDS,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeDecision {
    Allow,
    Refuse { reason_code: &'static str, matched_keyword: Option<String> },
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether a shopper message is worth a paid completion call.
///
/// Implementations must be pure: the same message always yields the same
/// decision and evaluation never fails.
pub trait ScopeFilter: Send + Sync {
    fn evaluate(&self, message: &str) -> ScopeDecision;

    fn is_in_scope(&self, message: &str) -> bool {
        self.evaluate(message).is_allowed()
    }
}

impl<F> ScopeFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn evaluate(&self, message: &str) -> ScopeDecision {
        if self(message) {
            ScopeDecision::Allow
        } else {
            ScopeDecision::Refuse { reason_code: "custom_filter", matched_keyword: None }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordScopePolicy {
    mode: ScopeMode,
    allow_keywords: Vec<String>,
    deny_keywords: Vec<String>,
}

impl Default for KeywordScopePolicy {
    fn default() -> Self {
        Self::new(ScopeMode::DenyList, DEFAULT_ALLOW_KEYWORDS, DEFAULT_DENY_KEYWORDS)
    }
}

impl KeywordScopePolicy {
    pub fn new<A, D>(mode: ScopeMode, allow_keywords: A, deny_keywords: D) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            mode,
            allow_keywords: normalize_keywords(allow_keywords),
            deny_keywords: normalize_keywords(deny_keywords),
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(config.mode, &config.allow_keywords, &config.deny_keywords)
    }

    pub fn allow_list<A>(keywords: A) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self::new(ScopeMode::AllowList, keywords, Vec::<String>::new())
    }

    pub fn deny_list<D>(keywords: D) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self::new(ScopeMode::DenyList, Vec::<String>::new(), keywords)
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }
}

impl ScopeFilter for KeywordScopePolicy {
    fn evaluate(&self, message: &str) -> ScopeDecision {
        let haystack = format!(" {} ", normalize_text(message));

        match self.mode {
            ScopeMode::DenyList => match find_keyword(&haystack, &self.deny_keywords) {
                Some(keyword) => ScopeDecision::Refuse {
                    reason_code: "off_topic_keyword",
                    matched_keyword: Some(keyword.to_string()),
                },
                None => ScopeDecision::Allow,
            },
            ScopeMode::AllowList => match find_keyword(&haystack, &self.allow_keywords) {
                Some(_) => ScopeDecision::Allow,
                None => {
                    ScopeDecision::Refuse { reason_code: "no_shop_keyword", matched_keyword: None }
                }
            },
        }
    }
}

// Keywords match at the start of a word, so `deal` covers `deals` but `art`
// never matches inside `cart`.
fn find_keyword<'a>(haystack: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|keyword| haystack.contains(&format!(" {keyword}")))
        .map(String::as_str)
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|keyword| normalize_text(keyword.as_ref()))
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
