use serde::{Deserialize, Serialize};

use super::structs::Well;

/// One group of a [Classification]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    value: String,
    wells: Vec<String>,
}

impl Category {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn wells(&self) -> &[String] {
        &self.wells
    }

    pub fn contains(&self, well: &str) -> bool {
        self.wells.iter().any(|w| w == well)
    }
}

/// A partition of wells into named groups
///
/// Groups keep the order in which their value was first seen. A well belongs
/// to at most one group of a classification, but may be classified by several
/// classifications at once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Classification {
    name: String,
    groups: Vec<Category>,
}

impl Classification {
    pub fn new(name: impl Into<String>) -> Self {
        Classification {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Classify wells by a key derived from each well
    ///
    /// Wells for which `key` returns `None` are left unclassified.
    pub fn from_wells<'a, I, F>(name: impl Into<String>, wells: I, key: F) -> Self
    where
        I: IntoIterator<Item = &'a Well>,
        F: Fn(&Well) -> Option<String>,
    {
        let mut classification = Classification::new(name);
        for well in wells {
            if let Some(value) = key(well) {
                classification.add(&value, well.id());
            }
        }
        classification
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Put `well` in the group `value`, moving it out of any other group
    pub fn add(&mut self, value: &str, well: &str) {
        for group in self.groups.iter_mut() {
            group.wells.retain(|w| w != well);
        }
        self.groups.retain(|g| !g.wells.is_empty() || g.value == value);
        match self.groups.iter_mut().find(|g| g.value == value) {
            Some(group) => group.wells.push(well.to_string()),
            None => self.groups.push(Category {
                value: value.to_string(),
                wells: vec![well.to_string()],
            }),
        }
    }

    pub fn groups(&self) -> &[Category] {
        &self.groups
    }

    pub fn group(&self, value: &str) -> Option<&Category> {
        self.groups.iter().find(|g| g.value == value)
    }

    /// Category value of a well
    pub fn category_of(&self, well: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.contains(well))
            .map(|g| g.value.as_str())
    }

    /// Wells belonging to any of the given groups, in group order
    pub fn select_wells(&self, values: &[&str]) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| values.contains(&g.value.as_str()))
            .flat_map(|g| g.wells.iter().map(|w| w.as_str()))
            .collect()
    }
}
