pub mod associations;
pub mod common;
pub mod experiment;
pub mod node;
pub mod range;
pub mod registry;
pub mod selection;
pub mod submission;

pub type Error = crate::common::error::SpecError;
pub type Result<T> = std::result::Result<T, Error>;

// Reexports
pub use crate::associations::{AssociationMap, AssociationRecord, TargetField};
pub use crate::common::idcounter::AliasCounter;
pub use crate::experiment::{AliasRequest, Experiment, ExperimentNodes, ExperimentType};
pub use crate::node::{AliasId, DEFAULT_DOMAIN, NodeId, NodeRef};
pub use crate::registry::{SiteRegistry, StaticSiteRegistry};
pub use crate::selection::{
    AliasProperties, NodeSelection, ResourceSpec, SiteAssociationSpec, parse_resource_spec,
    parse_site_association,
};
