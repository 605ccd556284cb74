use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::error::SpecError;

pub const DEFAULT_DOMAIN: &str = "iot-lab.info";

/// Physical node address, e.g. `m3-12.grenoble.iot-lab.info`.
///
/// Field order defines the sort order of nodes: site, architecture, number.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId {
    site: String,
    archi: String,
    number: u32,
    domain: String,
}

impl NodeId {
    pub fn new(site: &str, archi: &str, number: u32, domain: &str) -> Self {
        NodeId {
            site: site.to_string(),
            archi: archi.to_string(),
            number,
            domain: domain.to_string(),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn archi(&self) -> &str {
        &self.archi
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}.{}.{}",
            self.archi, self.number, self.site, self.domain
        )
    }
}

impl FromStr for NodeId {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SpecError::InvalidDocument(format!("Invalid node identifier '{s}'"));

        let (host, rest) = s.split_once('.').ok_or_else(invalid)?;
        let (site, domain) = rest.split_once('.').ok_or_else(invalid)?;
        let (archi, number) = host.rsplit_once('-').ok_or_else(invalid)?;
        let number = number.parse::<u32>().map_err(|_| invalid())?;
        if archi.is_empty() || site.is_empty() || domain.is_empty() {
            return Err(invalid());
        }
        Ok(NodeId::new(site, archi, number, domain))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Builds node identifiers for the given numbers, keeping their order.
pub fn build_node_ids(site: &str, archi: &str, numbers: &[u32], domain: &str) -> Vec<NodeId> {
    numbers
        .iter()
        .map(|&number| NodeId::new(site, archi, number, domain))
        .collect()
}

/// Reference to an alias request inside one experiment.
/// It is written as a string (`"1"`) on the wire.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AliasId(u32);

impl AliasId {
    #[inline]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub fn as_num(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AliasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AliasId {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(AliasId)
            .map_err(|_| SpecError::InvalidDocument(format!("Invalid alias reference '{s}'")))
    }
}

impl Serialize for AliasId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AliasId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older documents store the alias as a number
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(AliasId(value)),
            Raw::Text(value) => value.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Member of a node association: a physical node or an alias reference.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeRef {
    Physical(NodeId),
    Alias(AliasId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Physical(node) => node.fmt(f),
            NodeRef::Alias(alias) => alias.fmt(f),
        }
    }
}

impl From<NodeId> for NodeRef {
    fn from(node: NodeId) -> Self {
        NodeRef::Physical(node)
    }
}

impl From<AliasId> for NodeRef {
    fn from(alias: AliasId) -> Self {
        NodeRef::Alias(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_node_identifiers() {
        let nodes = build_node_ids("grenoble", "m3", &[3, 1], DEFAULT_DOMAIN);
        let names: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["m3-3.grenoble.iot-lab.info", "m3-1.grenoble.iot-lab.info"]
        );
    }

    #[test]
    fn parse_node_identifier() {
        let node: NodeId = "a8-12.saclay.iot-lab.info".parse().unwrap();
        assert_eq!(node, NodeId::new("saclay", "a8", 12, "iot-lab.info"));
        assert_eq!(node.to_string(), "a8-12.saclay.iot-lab.info");
    }

    #[test]
    fn parse_node_identifier_with_dash_in_archi() {
        let node: NodeId = "st-lrwan1-2.saclay.iot-lab.info".parse().unwrap();
        assert_eq!(node.archi(), "st-lrwan1");
        assert_eq!(node.number(), 2);
    }

    #[test]
    fn parse_invalid_node_identifier() {
        for value in ["m3.grenoble.iot-lab.info", "m3-x.grenoble.iot-lab.info", "m3-1", "m3-1.grenoble"] {
            assert!(value.parse::<NodeId>().is_err(), "{value}");
        }
    }

    #[test]
    fn nodes_sort_by_site_archi_number() {
        let mut nodes: Vec<NodeId> = [
            "m3-10.grenoble.iot-lab.info",
            "a8-1.grenoble.iot-lab.info",
            "m3-1.lille.iot-lab.info",
            "m3-9.grenoble.iot-lab.info",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
        nodes.sort();
        let names: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "a8-1.grenoble.iot-lab.info",
                "m3-9.grenoble.iot-lab.info",
                "m3-10.grenoble.iot-lab.info",
                "m3-1.lille.iot-lab.info",
            ]
        );
    }

    #[test]
    fn alias_wire_format() {
        assert_eq!(serde_json::to_string(&AliasId::new(3)).unwrap(), "\"3\"");
        assert_eq!(serde_json::from_str::<AliasId>("\"12\"").unwrap(), AliasId::new(12));
        assert_eq!(serde_json::from_str::<AliasId>("7").unwrap(), AliasId::new(7));
        assert!(serde_json::from_str::<AliasId>("\"x\"").is_err());
    }

    #[test]
    fn alias_refs_sort_numerically() {
        let mut refs = vec![NodeRef::from(AliasId::new(10)), NodeRef::from(AliasId::new(9))];
        refs.sort();
        assert_eq!(refs[0].to_string(), "9");
    }
}
