/// Query arguments as gitweb splits them: segments separated by `;` or `&`, each split on
/// its first `=`. A segment without `=` is stored as the empty key with an empty value, so
/// repeated bare segments collapse into one entry. Values are kept percent-encoded.
///
/// A repeated key keeps its first position and takes the last value seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pairs: Vec<(String, String)>,
}

impl QueryArgs {
    pub fn parse(raw: &str) -> Self {
        let mut args = Self::default();

        for segment in raw.split([';', '&']) {
            let (key, value) = segment.split_once('=').unwrap_or(("", ""));
            args.insert(key, value);
        }

        args
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The gitweb action, `a=...`.
    pub fn action(&self) -> Option<&str> {
        self.get("a")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
