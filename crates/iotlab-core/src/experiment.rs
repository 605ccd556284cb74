use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::associations::{AssociationMap, TargetField};
use crate::common::error::{SpecError, malformed};
use crate::common::idcounter::AliasCounter;
use crate::node::{AliasId, NodeId, NodeRef};
use crate::selection::{AliasProperties, NodeSelection, ResourceSpec, SiteAssociationSpec};

pub const FIRMWARE_CATEGORY: &str = "firmware";
pub const PROFILE_CATEGORY: &str = "profile";

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentType {
    Physical,
    Alias,
}

impl fmt::Display for ExperimentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExperimentType::Physical => "physical",
            ExperimentType::Alias => "alias",
        })
    }
}

/// Request for `nbnodes` nodes with the given properties, resolved by the scheduler.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AliasRequest {
    pub alias: AliasId,
    pub nbnodes: u32,
    pub properties: AliasProperties,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExperimentNodes {
    Physical(BTreeSet<NodeId>),
    /// One request per alias specification, in the order they were added.
    Alias(Vec<AliasRequest>),
}

impl ExperimentNodes {
    pub fn kind(&self) -> ExperimentType {
        match self {
            ExperimentNodes::Physical(_) => ExperimentType::Physical,
            ExperimentNodes::Alias(_) => ExperimentType::Alias,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ExperimentNodes::Physical(nodes) => nodes.len(),
            ExperimentNodes::Alias(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resources attached to a physical node by the specification that selected it.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ResourceSignature {
    firmware: Option<String>,
    profile: Option<String>,
    associations: Vec<(String, String)>,
}

impl ResourceSignature {
    fn of(spec: &ResourceSpec) -> Self {
        let mut associations = spec.associations.clone();
        associations.sort();
        ResourceSignature {
            firmware: spec.firmware.clone(),
            profile: spec.profile.clone(),
            associations,
        }
    }
}

/// Experiment being assembled from resource specifications.
///
/// The experiment type is fixed by the first specification. Physical nodes are
/// merged into one sorted set, every alias specification creates a new
/// [`AliasRequest`]. Resources are tracked in association maps keyed by the
/// resource name, so specifications sharing a firmware or profile end up in a
/// single association.
#[derive(Clone, Debug)]
pub struct Experiment {
    pub(crate) name: Option<String>,
    pub(crate) duration: u32,
    pub(crate) reservation: Option<i64>,
    pub(crate) nodes: Option<ExperimentNodes>,
    pub(crate) firmwares: AssociationMap<NodeRef>,
    pub(crate) profiles: AssociationMap<NodeRef>,
    pub(crate) associations: BTreeMap<String, AssociationMap<NodeRef>>,
    pub(crate) site_associations: BTreeMap<String, AssociationMap<String>>,
    pub(crate) alias_counter: AliasCounter,
    claims: BTreeMap<NodeId, ResourceSignature>,
    conflicts: BTreeSet<NodeId>,
}

impl Experiment {
    /// Creates an empty experiment. `duration` is in minutes, `reservation` is a unix timestamp.
    pub fn new(name: Option<String>, duration: u32, reservation: Option<i64>) -> Self {
        Experiment {
            name,
            duration,
            reservation,
            nodes: None,
            firmwares: AssociationMap::new(FIRMWARE_CATEGORY, TargetField::Nodes),
            profiles: AssociationMap::new(PROFILE_CATEGORY, TargetField::Nodes),
            associations: BTreeMap::new(),
            site_associations: BTreeMap::new(),
            alias_counter: AliasCounter::new(),
            claims: BTreeMap::new(),
            conflicts: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn reservation(&self) -> Option<i64> {
        self.reservation
    }

    pub fn experiment_type(&self) -> Option<ExperimentType> {
        self.nodes.as_ref().map(|nodes| nodes.kind())
    }

    pub fn nodes(&self) -> Option<&ExperimentNodes> {
        self.nodes.as_ref()
    }

    pub fn firmware_associations(&self) -> &AssociationMap<NodeRef> {
        &self.firmwares
    }

    pub fn profile_associations(&self) -> &AssociationMap<NodeRef> {
        &self.profiles
    }

    pub fn associations(&self) -> &BTreeMap<String, AssociationMap<NodeRef>> {
        &self.associations
    }

    pub fn site_associations(&self) -> &BTreeMap<String, AssociationMap<String>> {
        &self.site_associations
    }

    /// Folds one resource specification into the experiment and returns the
    /// references its resources were associated with.
    ///
    /// Fails without modifying the experiment if the specification kind differs
    /// from the experiment type.
    pub fn add_resources(&mut self, spec: ResourceSpec) -> crate::Result<Vec<NodeRef>> {
        let added = spec.selection.kind();
        if let Some(current) = self.experiment_type() {
            if current != added {
                return Err(SpecError::MixedExperimentType { current, added });
            }
        }

        let signature = ResourceSignature::of(&spec);
        let ResourceSpec {
            selection,
            firmware,
            profile,
            associations,
        } = spec;

        let targets: Vec<NodeRef> = match selection {
            NodeSelection::Physical(selected) => {
                let selected: BTreeSet<NodeId> = selected.into_iter().collect();
                for node in &selected {
                    self.claim(node, &signature);
                }
                let ExperimentNodes::Physical(nodes) = self
                    .nodes
                    .get_or_insert_with(|| ExperimentNodes::Physical(BTreeSet::new()))
                else {
                    unreachable!("experiment type checked above");
                };
                nodes.extend(selected.iter().cloned());
                selected.into_iter().map(NodeRef::Physical).collect()
            }
            NodeSelection::Alias(alias_spec) => {
                let alias = self.alias_counter.next();
                let ExperimentNodes::Alias(requests) = self
                    .nodes
                    .get_or_insert_with(|| ExperimentNodes::Alias(Vec::new()))
                else {
                    unreachable!("experiment type checked above");
                };
                requests.push(AliasRequest {
                    alias,
                    nbnodes: alias_spec.nbnodes,
                    properties: alias_spec.properties,
                });
                vec![NodeRef::Alias(alias)]
            }
        };

        if let Some(firmware) = firmware {
            self.firmwares.extend(&firmware, targets.iter().cloned());
        }
        if let Some(profile) = profile {
            self.profiles.extend(&profile, targets.iter().cloned());
        }
        for (category, value) in associations {
            self.associations
                .entry(category.clone())
                .or_insert_with(|| AssociationMap::new(category, TargetField::Nodes))
                .extend(&value, targets.iter().cloned());
        }

        log::debug!(
            "Added {} {added} target(s) to experiment {:?}",
            targets.len(),
            self.name
        );
        Ok(targets)
    }

    fn claim(&mut self, node: &NodeId, signature: &ResourceSignature) {
        match self.claims.get(node) {
            Some(existing) if existing != signature => {
                log::debug!("Node {node} is claimed with different resources");
                self.conflicts.insert(node.clone());
            }
            Some(_) => {}
            None => {
                self.claims.insert(node.clone(), signature.clone());
            }
        }
    }

    /// Folds a site association (scripts and their configuration) into the experiment.
    pub fn add_site_association(&mut self, spec: SiteAssociationSpec) {
        let SiteAssociationSpec {
            sites,
            associations,
        } = spec;
        for (category, value) in associations {
            self.site_associations
                .entry(category.clone())
                .or_insert_with(|| AssociationMap::new(category, TargetField::Sites))
                .extend(&value, sites.iter().cloned());
        }
    }

    /// Checks that the experiment can be submitted.
    pub fn validate(&self) -> crate::Result<()> {
        if self.duration == 0 {
            return malformed("Experiment duration has to be at least one minute");
        }
        if self.nodes.as_ref().is_none_or(|nodes| nodes.is_empty()) {
            return Err(SpecError::EmptyExperiment);
        }
        if !self.conflicts.is_empty() {
            return Err(SpecError::DuplicateNodeAssignment(
                self.conflicts.iter().map(|node| node.to_string()).collect(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for Experiment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.duration == other.duration
            && self.reservation == other.reservation
            && self.nodes == other.nodes
            && self.firmwares == other.firmwares
            && self.profiles == other.profiles
            && self.associations == other.associations
            && self.site_associations == other.site_associations
    }
}

impl Eq for Experiment {}
