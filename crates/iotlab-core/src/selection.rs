//! Parsers for user supplied resource specifications.
//!
//! A physical specification has the form `site,archi,range[,firmware[,profile]][,key=value...]`,
//! for example `grenoble,m3,1-4+6,tutorial.elf,battery`.
//! An alias specification requests a number of nodes with given properties:
//! `count,archi=<archi>+site=<site>[+mobile=<bool>][,firmware[,profile]][,key=value...]`.

use serde::{Deserialize, Serialize};

use crate::common::error::{SpecError, malformed};
use crate::experiment::ExperimentType;
use crate::node::{NodeId, build_node_ids};
use crate::range::expand_range;
use crate::registry::SiteRegistry;

const FIRMWARE_KEY: &str = "firmware";
const PROFILE_KEY: &str = "profile";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AliasProperties {
    pub archi: String,
    pub site: String,
    pub mobile: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasSpec {
    pub nbnodes: u32,
    pub properties: AliasProperties,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSelection {
    Physical(Vec<NodeId>),
    Alias(AliasSpec),
}

impl NodeSelection {
    pub fn kind(&self) -> ExperimentType {
        match self {
            NodeSelection::Physical(_) => ExperimentType::Physical,
            NodeSelection::Alias(_) => ExperimentType::Alias,
        }
    }
}

/// A parsed resource specification: selected nodes and the resources attached to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    pub selection: NodeSelection,
    pub firmware: Option<String>,
    pub profile: Option<String>,
    /// Named associations (`mobility=...`) in input order.
    pub associations: Vec<(String, String)>,
}

/// A parsed site association: `site[+site...],key=value[,key=value...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteAssociationSpec {
    pub sites: Vec<String>,
    pub associations: Vec<(String, String)>,
}

#[derive(Default)]
struct AssociationFields {
    firmware: Option<String>,
    profile: Option<String>,
    associations: Vec<(String, String)>,
}

fn split_key_value(field: &str) -> Option<(&str, &str)> {
    field
        .split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn check_key_value(key: &str, value: &str) -> crate::Result<()> {
    if key.is_empty() || value.is_empty() {
        return malformed(format!("Invalid association '{key}={value}'"));
    }
    Ok(())
}

/// Parses the fields following the node selection.
/// At most two positional values (firmware, profile) may come first, followed by `key=value` pairs.
fn parse_association_fields(fields: &[&str]) -> crate::Result<AssociationFields> {
    let mut result = AssociationFields::default();
    let mut positional = 0;
    let mut keyed = false;

    for field in fields {
        match split_key_value(field) {
            None => {
                if keyed {
                    return Err(SpecError::PositionalAfterKeyword(field.to_string()));
                }
                match positional {
                    0 => result.firmware = non_empty(field),
                    1 => result.profile = non_empty(field),
                    _ => {
                        return malformed(format!(
                            "Unexpected value '{field}', only a firmware and a profile can be given without a key"
                        ));
                    }
                }
                positional += 1;
            }
            Some((key, value)) => {
                keyed = true;
                check_key_value(key, value)?;
                let slot = match key {
                    FIRMWARE_KEY => Some(&mut result.firmware),
                    PROFILE_KEY => Some(&mut result.profile),
                    _ => None,
                };
                match slot {
                    Some(Some(_)) => return Err(SpecError::DuplicateProperty(key.to_string())),
                    Some(slot) => *slot = Some(value.to_string()),
                    None => {
                        if result.associations.iter().any(|(k, _)| k == key) {
                            return Err(SpecError::DuplicateProperty(key.to_string()));
                        }
                        result
                            .associations
                            .push((key.to_string(), value.to_string()));
                    }
                }
            }
        }
    }
    Ok(result)
}

fn parse_mobile(value: &str) -> crate::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => malformed(format!(
            "Invalid value '{value}' for mobile, expected one of true, false, 1, 0"
        )),
    }
}

/// Parses `archi=<archi>+site=<site>[+mobile=<bool>]`.
pub fn parse_alias_properties(input: &str) -> crate::Result<AliasProperties> {
    let mut archi = None;
    let mut site = None;
    let mut mobile = None;

    for item in input.split('+') {
        let Some((key, value)) = split_key_value(item) else {
            return malformed(format!("Invalid property '{item}', expected key=value"));
        };
        if value.is_empty() {
            return malformed(format!("Property '{key}' has no value"));
        }
        let (name, slot) = match key {
            "archi" | "architecture" => ("archi", &mut archi),
            "site" => ("site", &mut site),
            "mobile" => ("mobile", &mut mobile),
            _ => {
                return malformed(format!(
                    "Unknown property '{key}', expected archi, site or mobile"
                ));
            }
        };
        if slot.is_some() {
            return Err(SpecError::DuplicateProperty(name.to_string()));
        }
        *slot = Some(value.to_string());
    }

    let Some(archi) = archi else {
        return malformed(format!("Missing property 'archi' in '{input}'"));
    };
    let Some(site) = site else {
        return malformed(format!("Missing property 'site' in '{input}'"));
    };
    let mobile = mobile.as_deref().map(parse_mobile).transpose()?.unwrap_or(false);
    Ok(AliasProperties {
        archi,
        site,
        mobile,
    })
}

fn is_alias_count(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_digit())
}

fn parse_alias_selection(fields: &[&str]) -> crate::Result<(NodeSelection, usize)> {
    if fields.len() < 2 {
        return malformed("Alias specification requires a node count and properties");
    }
    let nbnodes = fields[0]
        .parse::<u32>()
        .map_err(|_| SpecError::MalformedSpec(format!("Invalid node count '{}'", fields[0])))?;
    if nbnodes == 0 {
        return malformed("Alias specification has to request at least one node");
    }
    let properties = parse_alias_properties(fields[1])?;
    Ok((
        NodeSelection::Alias(AliasSpec {
            nbnodes,
            properties,
        }),
        2,
    ))
}

fn parse_physical_selection(
    fields: &[&str],
    registry: &dyn SiteRegistry,
) -> crate::Result<(NodeSelection, usize)> {
    if fields.len() < 3 {
        return malformed("Physical specification requires a site, an architecture and a range");
    }
    let (site, archi) = (fields[0], fields[1]);
    registry.check_site(site)?;
    registry.check_architecture(archi)?;
    let numbers = expand_range(fields[2])?;
    let nodes = build_node_ids(site, archi, &numbers, registry.domain());
    Ok((NodeSelection::Physical(nodes), 3))
}

/// Parses one resource specification token.
///
/// The token is an alias specification if its first field is a non-negative integer,
/// otherwise it is a physical one.
pub fn parse_resource_spec(token: &str, registry: &dyn SiteRegistry) -> crate::Result<ResourceSpec> {
    if token.trim().is_empty() {
        return malformed("Empty resource specification");
    }
    let fields: Vec<&str> = token.split(',').map(str::trim).collect();
    let (selection, consumed) = if is_alias_count(fields[0]) {
        parse_alias_selection(&fields)?
    } else {
        parse_physical_selection(&fields, registry)?
    };
    let AssociationFields {
        firmware,
        profile,
        associations,
    } = parse_association_fields(&fields[consumed..])?;

    log::debug!("Parsed {} specification '{token}'", selection.kind());
    Ok(ResourceSpec {
        selection,
        firmware,
        profile,
        associations,
    })
}

/// Parses a site association token, e.g. `grenoble+lille,script=run.sh,scriptconfig=cfg`.
pub fn parse_site_association(
    token: &str,
    registry: &dyn SiteRegistry,
) -> crate::Result<SiteAssociationSpec> {
    let fields: Vec<&str> = token.split(',').map(str::trim).collect();
    let mut sites: Vec<String> = Vec::new();
    for site in fields[0].split('+') {
        if site.is_empty() || site.contains('=') {
            return malformed(format!("Site association '{token}' has to start with sites"));
        }
        registry.check_site(site)?;
        if !sites.iter().any(|s| s == site) {
            sites.push(site.to_string());
        }
    }

    let mut associations: Vec<(String, String)> = Vec::new();
    for field in &fields[1..] {
        let Some((key, value)) = split_key_value(field) else {
            return malformed(format!(
                "Invalid site association '{field}', expected key=value"
            ));
        };
        check_key_value(key, value)?;
        if associations.iter().any(|(k, _)| k == key) {
            return Err(SpecError::DuplicateProperty(key.to_string()));
        }
        associations.push((key.to_string(), value.to_string()));
    }
    if associations.is_empty() {
        return malformed(format!("Site association '{token}' has no key=value pair"));
    }
    Ok(SiteAssociationSpec {
        sites,
        associations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticSiteRegistry;

    fn parse(token: &str) -> crate::Result<ResourceSpec> {
        parse_resource_spec(token, &StaticSiteRegistry::default())
    }

    fn node_names(spec: &ResourceSpec) -> Vec<String> {
        match &spec.selection {
            NodeSelection::Physical(nodes) => nodes.iter().map(|n| n.to_string()).collect(),
            NodeSelection::Alias(_) => panic!("Expected physical selection"),
        }
    }

    #[test]
    fn parse_physical_spec() {
        let spec = parse("grenoble,m3,1-2+5,tp.elf,battery").unwrap();
        assert_eq!(
            node_names(&spec),
            vec![
                "m3-1.grenoble.iot-lab.info",
                "m3-2.grenoble.iot-lab.info",
                "m3-5.grenoble.iot-lab.info",
            ]
        );
        assert_eq!(spec.firmware.as_deref(), Some("tp.elf"));
        assert_eq!(spec.profile.as_deref(), Some("battery"));
        assert!(spec.associations.is_empty());
    }

    #[test]
    fn parse_physical_spec_without_resources() {
        let spec = parse("lille,a8,3").unwrap();
        assert_eq!(node_names(&spec), vec!["a8-3.lille.iot-lab.info"]);
        assert_eq!(spec.firmware, None);
        assert_eq!(spec.profile, None);
    }

    #[test]
    fn parse_empty_firmware_slot() {
        let spec = parse("lille,m3,3,,battery").unwrap();
        assert_eq!(spec.firmware, None);
        assert_eq!(spec.profile.as_deref(), Some("battery"));
    }

    #[test]
    fn parse_generic_associations() {
        let spec = parse("grenoble,m3,1,fw.elf,mobility=circuit,kernel=linux").unwrap();
        assert_eq!(spec.firmware.as_deref(), Some("fw.elf"));
        assert_eq!(
            spec.associations,
            vec![
                ("mobility".to_string(), "circuit".to_string()),
                ("kernel".to_string(), "linux".to_string()),
            ]
        );
    }

    #[test]
    fn parse_keyed_firmware_and_profile() {
        let spec = parse("grenoble,m3,1,profile=battery,firmware=fw.elf").unwrap();
        assert_eq!(spec.firmware.as_deref(), Some("fw.elf"));
        assert_eq!(spec.profile.as_deref(), Some("battery"));
    }

    #[test]
    fn parse_keyed_firmware_after_positional() {
        assert_eq!(
            parse("grenoble,m3,1,fw.elf,firmware=other.elf"),
            Err(SpecError::DuplicateProperty("firmware".to_string()))
        );
    }

    #[test]
    fn parse_positional_after_keyword() {
        assert_eq!(
            parse("grenoble,m3,1,mobility=circuit,battery"),
            Err(SpecError::PositionalAfterKeyword("battery".to_string()))
        );
    }

    #[test]
    fn parse_duplicate_association_key() {
        assert_eq!(
            parse("grenoble,m3,1,mobility=a,mobility=b"),
            Err(SpecError::DuplicateProperty("mobility".to_string()))
        );
    }

    #[test]
    fn parse_too_many_positionals() {
        assert!(matches!(
            parse("grenoble,m3,1,fw.elf,battery,extra"),
            Err(SpecError::MalformedSpec(_))
        ));
    }

    #[test]
    fn parse_physical_missing_range() {
        assert!(matches!(parse("grenoble,m3"), Err(SpecError::MalformedSpec(_))));
    }

    #[test]
    fn parse_physical_unknown_site_and_archi() {
        assert_eq!(
            parse("atlantis,m3,1"),
            Err(SpecError::UnknownSite("atlantis".to_string()))
        );
        assert_eq!(
            parse("grenoble,z80,1"),
            Err(SpecError::UnknownArchitecture("z80".to_string()))
        );
    }

    #[test]
    fn parse_physical_invalid_range() {
        assert!(matches!(
            parse("grenoble,m3,3-3"),
            Err(SpecError::InvalidRangeSyntax(_))
        ));
    }

    #[test]
    fn parse_physical_oversized_range() {
        assert!(matches!(
            parse("grenoble,m3,1-4294967295"),
            Err(SpecError::InvalidRangeSyntax(_))
        ));
    }

    #[test]
    fn parse_alias_spec() {
        let spec = parse("2,archi=m3:at86rf231+site=grenoble,fw.elf").unwrap();
        assert_eq!(
            spec.selection,
            NodeSelection::Alias(AliasSpec {
                nbnodes: 2,
                properties: AliasProperties {
                    archi: "m3:at86rf231".to_string(),
                    site: "grenoble".to_string(),
                    mobile: false,
                },
            })
        );
        assert_eq!(spec.firmware.as_deref(), Some("fw.elf"));
    }

    #[test]
    fn parse_alias_spec_without_properties() {
        assert!(matches!(parse("2"), Err(SpecError::MalformedSpec(_))));
    }

    #[test]
    fn parse_alias_zero_nodes() {
        assert!(matches!(
            parse("0,archi=m3+site=grenoble"),
            Err(SpecError::MalformedSpec(_))
        ));
    }

    #[test]
    fn parse_alias_mobile() {
        for (value, expected) in [("1", true), ("TRUE", true), ("0", false), ("False", false)] {
            let properties =
                parse_alias_properties(&format!("archi=m3+site=lille+mobile={value}")).unwrap();
            assert_eq!(properties.mobile, expected);
        }
        assert!(matches!(
            parse_alias_properties("archi=m3+site=lille+mobile=yes"),
            Err(SpecError::MalformedSpec(_))
        ));
    }

    #[test]
    fn parse_alias_duplicate_property() {
        assert_eq!(
            parse_alias_properties("archi=m3+site=grenoble+archi=m3"),
            Err(SpecError::DuplicateProperty("archi".to_string()))
        );
        assert_eq!(
            parse_alias_properties("architecture=m3+site=grenoble+archi=m3"),
            Err(SpecError::DuplicateProperty("archi".to_string()))
        );
    }

    #[test]
    fn parse_alias_missing_property() {
        assert!(matches!(
            parse_alias_properties("archi=m3"),
            Err(SpecError::MalformedSpec(_))
        ));
        assert!(matches!(
            parse_alias_properties("site=grenoble"),
            Err(SpecError::MalformedSpec(_))
        ));
    }

    #[test]
    fn parse_alias_unknown_property() {
        assert!(matches!(
            parse_alias_properties("archi=m3+site=grenoble+color=red"),
            Err(SpecError::MalformedSpec(_))
        ));
    }

    #[test]
    fn parse_site_association_spec() {
        let registry = StaticSiteRegistry::default();
        let spec =
            parse_site_association("grenoble+lille+grenoble,script=run.sh,scriptconfig=cfg", &registry)
                .unwrap();
        assert_eq!(spec.sites, vec!["grenoble", "lille"]);
        assert_eq!(
            spec.associations,
            vec![
                ("script".to_string(), "run.sh".to_string()),
                ("scriptconfig".to_string(), "cfg".to_string()),
            ]
        );
    }

    #[test]
    fn parse_site_association_errors() {
        let registry = StaticSiteRegistry::default();
        assert!(matches!(
            parse_site_association("grenoble", &registry),
            Err(SpecError::MalformedSpec(_))
        ));
        assert!(matches!(
            parse_site_association("script=run.sh", &registry),
            Err(SpecError::MalformedSpec(_))
        ));
        assert_eq!(
            parse_site_association("grenoble,script=a,script=b", &registry),
            Err(SpecError::DuplicateProperty("script".to_string()))
        );
        assert_eq!(
            parse_site_association("atlantis,script=a", &registry),
            Err(SpecError::UnknownSite("atlantis".to_string()))
        );
    }
}
