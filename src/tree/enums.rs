use crate::error::{Error, Result};

/// Names for the numeric values of a scalar leaf.
///
/// Entries keep the order they were added in. Names are unique; a value may carry
/// several names, in which case the first one is reported when mapping back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumMap {
    items: Vec<(String, u64)>,
}

impl EnumMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, name: S, value: u64) -> Result<()> {
        let name = name.into();
        if self.value_of(&name).is_some() {
            return Err(Error::InvalidArgument(format!(
                "enum name '{}' defined twice",
                name
            )));
        }
        self.items.push((name, value));
        Ok(())
    }

    /// Builder form of [`EnumMap::add`].
    pub fn with<S: Into<String>>(mut self, name: S, value: u64) -> Result<Self> {
        self.add(name, value)?;
        Ok(self)
    }

    pub fn name_of(&self, value: u64) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    pub fn value_of(&self, name: &str) -> Option<u64> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.items.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_both_ways() {
        let e = EnumMap::new()
            .with("Off", 0)
            .and_then(|e| e.with("On", 1))
            .and_then(|e| e.with("Enabled", 1))
            .unwrap();
        assert_eq!(e.len(), 3);
        assert_eq!(e.value_of("Enabled"), Some(1));
        assert_eq!(e.name_of(1), Some("On"));
        assert_eq!(e.name_of(2), None);
        assert_eq!(e.value_of("on"), None);
        let names: Vec<_> = e.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Off", "On", "Enabled"]);
    }

    #[test]
    fn names_are_unique() {
        let mut e = EnumMap::new();
        e.add("A", 1).unwrap();
        assert!(matches!(e.add("A", 2), Err(Error::InvalidArgument(_))));
    }
}
