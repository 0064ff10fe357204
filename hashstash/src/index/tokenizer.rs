use std::ops::Deref;
use std::sync::Arc;

/// Splits indexed values and search terms into tokens.
///
/// The same tokenizer is used on both sides, so a provider only has to be
/// consistent with itself. Tokens are compared case-sensitively and are
/// never stemmed.
pub trait TokenizerProvider: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// The default tokenizer.
///
/// Splits on whitespace and strips punctuation that commonly hugs a word
/// (`"alice,"` becomes `alice`). Signs, decimal points and key separators
/// inside a token are kept, so `-4.5` and `paywell:hash:1` stay whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl TokenizerProvider for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|word| word.trim_matches(is_edge_punctuation))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn is_edge_punctuation(c: char) -> bool {
    matches!(
        c,
        ',' | ';' | '.' | '!' | '?' | '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>'
    )
}

/// Shared handle to a [TokenizerProvider].
///
/// ```ignore
/// let tokenizer = Tokenizer::new(WhitespaceTokenizer);
/// assert_eq!(tokenizer.tokenize("hello world"), vec!["hello", "world"]);
/// ```
#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<dyn TokenizerProvider>,
}

impl Tokenizer {
    pub fn new<T: TokenizerProvider + 'static>(inner: T) -> Self {
        Tokenizer {
            inner: Arc::new(inner),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new(WhitespaceTokenizer)
    }
}

impl Deref for Tokenizer {
    type Target = Arc<dyn TokenizerProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
