//! Splitting records on a delimiter that may be escaped.

/// Default escape character.
pub const ESCAPE: char = '\\';

/// Splits text on a delimiter, honouring a single-character escape.
///
/// An escape makes the following character literal (so `\ ` is a space that
/// does not split). Whether the escape itself survives into the token is
/// controlled by [`keep_escape`](Self::keep_escape). A trailing escape with
/// nothing after it is kept only when escapes are kept.
///
/// # Examples
///
/// ```
/// use deken_index::Splitter;
///
/// let splitter = Splitter::new(' ').max_splits(Some(1));
/// assert_eq!(splitter.split("foo bar baz"), ["foo", "bar baz"]);
/// assert_eq!(splitter.split("foo\\ bar baz"), ["foo bar", "baz"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splitter {
    delimiter: char,
    escape: char,
    keep_escape: bool,
    max_splits: Option<usize>,
}
impl Splitter {
    /// Unlimited splitting on `delimiter`, escaping with `\`, dropping escapes.
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            escape: ESCAPE,
            keep_escape: false,
            max_splits: None,
        }
    }

    pub fn escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    pub fn keep_escape(mut self, keep: bool) -> Self {
        self.keep_escape = keep;
        self
    }

    /// Stop after this many splits; the rest of the text becomes the final
    /// token, verbatim. `None` splits everything.
    pub fn max_splits(mut self, max: Option<usize>) -> Self {
        self.max_splits = max;
        self
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        if self.max_splits == Some(0) {
            return vec![text.to_string()];
        }
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == self.escape {
                match chars.next() {
                    Some(escaped) => {
                        if self.keep_escape {
                            current.push(self.escape);
                        }
                        current.push(escaped);
                    },
                    None if self.keep_escape => current.push(self.escape),
                    None => {},
                }
            } else if ch == self.delimiter {
                tokens.push(std::mem::take(&mut current));
                if self.max_splits.is_some_and(|max| tokens.len() >= max) {
                    tokens.push(chars.as_str().to_string());
                    return tokens;
                }
            } else {
                current.push(ch);
            }
        }
        tokens.push(current);
        tokens
    }
}

/// Splits `text` on every unescaped `delimiter`, dropping escapes.
pub fn split(text: &str, delimiter: char) -> Vec<String> {
    Splitter::new(delimiter).split(text)
}
