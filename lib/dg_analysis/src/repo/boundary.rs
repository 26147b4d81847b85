//! Framework boundary predicate.

use crate::errors::AnalysisResult;
use lazy_static::lazy_static;
use regex::Regex;

/// Package prefixes of the Android platform and of the libraries bundled
/// with it.
pub const ANDROID_PREFIXES: &[&str] = &[
    "Landroid/",
    "Landroidx/",
    "Ldalvik/",
    "Ljava/",
    "Ljavax/",
    "Ljunit/",
    "Lkotlin/",
    "Lorg/apache/",
    "Lorg/json/",
    "Lorg/w3c/",
    "Lorg/xml/",
    "Lorg/xmlpull/",
    "Lcom/google/android/",
    "Lsun/",
];

lazy_static! {
    static ref ANDROID_BOUNDARY: FrameworkBoundary =
        FrameworkBoundary::from_prefixes(ANDROID_PREFIXES).expect("valid android prefixes");
}

/// Decides whether a class belongs to the framework (out of the analysis
/// scope) from its name.
///
/// The configured package prefixes are compiled into a single anchored
/// alternation.
#[derive(Debug, Clone)]
pub struct FrameworkBoundary {
    prefixes: Vec<String>,
    pattern: Option<Regex>,
}

impl FrameworkBoundary {
    pub fn from_prefixes<S: AsRef<str>>(prefixes: &[S]) -> AnalysisResult<Self> {
        let prefixes: Vec<String> = prefixes
            .iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let pattern = if prefixes.is_empty() {
            None
        } else {
            let alternation: Vec<String> = prefixes.iter().map(|p| regex::escape(p)).collect();
            Some(Regex::new(&format!("^(?:{})", alternation.join("|")))?)
        };
        Ok(Self { prefixes, pattern })
    }

    /// The default Android platform boundary.
    #[must_use]
    pub fn android() -> Self {
        ANDROID_BOUNDARY.clone()
    }

    /// A boundary that leaves every class in scope.
    #[must_use]
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            pattern: None,
        }
    }

    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(false, |pattern| pattern.is_match(class_name))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

impl Default for FrameworkBoundary {
    fn default() -> Self {
        Self::android()
    }
}
