use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use serde_json::{Map as JsonMap, Value};

use crate::common::error::SpecError;

/// Name of the member list inside a serialized association record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetField {
    Nodes,
    Sites,
}

impl TargetField {
    pub fn key(&self) -> &'static str {
        match self {
            TargetField::Nodes => "nodes",
            TargetField::Sites => "sites",
        }
    }
}

/// One entry of the list view of an [`AssociationMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationRecord<T> {
    pub name: String,
    pub members: Vec<T>,
}

/// Associations of one category (firmware, profile, mobility, script, ...).
///
/// Maps a resource name to the set of nodes, aliases or sites that use it.
/// Member sets are always deduplicated and kept in the member sort order and the
/// list view is ordered by resource name, so the serialized form does not depend
/// on the order in which associations were added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationMap<T> {
    category: String,
    target: TargetField,
    entries: BTreeMap<String, BTreeSet<T>>,
}

impl<T: Ord + Clone> AssociationMap<T> {
    pub fn new(category: impl Into<String>, target: TargetField) -> Self {
        AssociationMap {
            category: category.into(),
            target,
            entries: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn target(&self) -> TargetField {
        self.target
    }

    /// Key holding the resource name in a serialized record, e.g. `firmwarename`.
    pub fn name_field(&self) -> String {
        format!("{}name", self.category)
    }

    /// Replaces the members of `name`. An empty member list removes the association.
    pub fn set(&mut self, name: &str, members: impl IntoIterator<Item = T>) {
        let members: BTreeSet<T> = members.into_iter().collect();
        if members.is_empty() {
            self.entries.remove(name);
        } else {
            self.entries.insert(name.to_string(), members);
        }
    }

    /// Adds members to `name`, creating the association if needed.
    pub fn extend(&mut self, name: &str, members: impl IntoIterator<Item = T>) {
        match self.entries.get_mut(name) {
            Some(existing) => existing.extend(members),
            None => self.set(name, members),
        }
    }

    /// Removes `name` and returns its members. Removing a missing name does nothing.
    pub fn remove(&mut self, name: &str) -> Option<Vec<T>> {
        self.entries
            .remove(name)
            .map(|members| members.into_iter().collect())
    }

    pub fn members(&self, name: &str) -> Option<&BTreeSet<T>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_list(&self) -> Vec<AssociationRecord<T>> {
        self.entries
            .iter()
            .map(|(name, members)| AssociationRecord {
                name: name.clone(),
                members: members.iter().cloned().collect(),
            })
            .collect()
    }

    /// Rebuilds a map from its list view. Records sharing a name are merged.
    pub fn from_list(
        category: impl Into<String>,
        target: TargetField,
        records: impl IntoIterator<Item = AssociationRecord<T>>,
    ) -> Self {
        let mut map = Self::new(category, target);
        for record in records {
            map.extend(&record.name, record.members);
        }
        map
    }
}

impl<T: Ord + Clone + Display> AssociationMap<T> {
    /// Serializes the list view: `[{"<category>name": name, "<target>": [...]}, ...]`.
    pub fn to_json(&self) -> Value {
        let name_field = self.name_field();
        let records = self
            .to_list()
            .into_iter()
            .map(|record| {
                let mut object = JsonMap::new();
                object.insert(name_field.clone(), Value::String(record.name));
                object.insert(
                    self.target.key().to_string(),
                    Value::Array(
                        record
                            .members
                            .iter()
                            .map(|member| Value::String(member.to_string()))
                            .collect(),
                    ),
                );
                Value::Object(object)
            })
            .collect();
        Value::Array(records)
    }
}

impl<T: Ord + Clone> AssociationMap<T> {
    pub fn from_json(
        category: &str,
        target: TargetField,
        value: &Value,
        parse_member: impl Fn(&str) -> crate::Result<T>,
    ) -> crate::Result<Self> {
        let invalid = |message: String| SpecError::InvalidDocument(message);
        let name_field = format!("{category}name");

        let records = value
            .as_array()
            .ok_or_else(|| invalid(format!("{category} associations have to be a list")))?;

        let mut parsed = Vec::with_capacity(records.len());
        for record in records {
            let name = record
                .get(&name_field)
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("{category} association without `{name_field}`")))?;
            let members = record
                .get(target.key())
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    invalid(format!(
                        "{category} association `{name}` without `{}`",
                        target.key()
                    ))
                })?
                .iter()
                .map(|member| {
                    member
                        .as_str()
                        .ok_or_else(|| invalid(format!("Invalid member of `{name}`: {member}")))
                        .and_then(&parse_member)
                })
                .collect::<crate::Result<Vec<T>>>()?;
            parsed.push(AssociationRecord {
                name: name.to_string(),
                members,
            });
        }
        Ok(Self::from_list(category, target, parsed))
    }
}
