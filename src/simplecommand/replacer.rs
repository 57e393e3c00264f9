/// Rewrites environment variable keys before lookup, e.g. `-` to `_`.
///
/// Pairs are tried in order at each position of the input; the first pair whose pattern
/// matches is substituted and scanning resumes after the match. Replacements are never
/// rescanned, and empty patterns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyReplacer {
    pairs: Vec<(String, String)>,
}

impl KeyReplacer {
    pub fn new<I, O, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (O, N)>,
        O: Into<String>,
        N: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(old, new)| (old.into(), new.into()))
                .filter(|(old, _)| !old.is_empty())
                .collect(),
        }
    }

    pub fn replace(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        'scan: while let Some(c) = rest.chars().next() {
            for (old, new) in &self.pairs {
                if let Some(after) = rest.strip_prefix(old.as_str()) {
                    out.push_str(new);
                    rest = after;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }

        out
    }
}
