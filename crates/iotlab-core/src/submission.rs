//! Conversion between [`Experiment`] and the JSON document accepted by the scheduler.
//!
//! The document is canonical: object keys are sorted, node lists and association
//! lists are sorted, so encoding equal experiments always yields identical text.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

use crate::associations::{AssociationMap, TargetField};
use crate::common::error::SpecError;
use crate::experiment::{
    AliasRequest, Experiment, ExperimentNodes, ExperimentType, FIRMWARE_CATEGORY,
    PROFILE_CATEGORY,
};
use crate::node::{AliasId, NodeId, NodeRef};

pub const NAME_KEY: &str = "name";
pub const DURATION_KEY: &str = "duration";
pub const RESERVATION_KEY: &str = "reservation";
pub const TYPE_KEY: &str = "type";
pub const NODES_KEY: &str = "nodes";
pub const FIRMWARE_ASSOCIATIONS_KEY: &str = "firmwareassociations";
pub const PROFILE_ASSOCIATIONS_KEY: &str = "profileassociations";
pub const ASSOCIATIONS_KEY: &str = "associations";
pub const SITE_ASSOCIATIONS_KEY: &str = "siteassociations";

fn invalid<T>(message: impl Into<String>) -> crate::Result<T> {
    Err(SpecError::InvalidDocument(message.into()))
}

/// Recursively rebuilds objects with their keys in lexicographic order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(object) => {
            let sorted: BTreeMap<String, Value> = object
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        value => value,
    }
}

fn encode_categories<T: Ord + Clone + std::fmt::Display>(
    maps: &BTreeMap<String, AssociationMap<T>>,
) -> Option<Value> {
    let object: JsonMap<String, Value> = maps
        .iter()
        .filter(|(_, map)| !map.is_empty())
        .map(|(category, map)| (category.clone(), map.to_json()))
        .collect();
    if object.is_empty() {
        None
    } else {
        Some(Value::Object(object))
    }
}

/// Encodes a validated experiment into its submission document.
pub fn encode(experiment: &Experiment) -> crate::Result<Value> {
    experiment.validate()?;
    let nodes = experiment.nodes().ok_or(SpecError::EmptyExperiment)?;

    let mut document = JsonMap::new();
    if let Some(name) = experiment.name() {
        document.insert(NAME_KEY.into(), Value::String(name.to_string()));
    }
    document.insert(DURATION_KEY.into(), experiment.duration().into());
    if let Some(reservation) = experiment.reservation() {
        document.insert(RESERVATION_KEY.into(), reservation.into());
    }
    document.insert(TYPE_KEY.into(), serde_json::to_value(nodes.kind())?);
    let nodes = match nodes {
        ExperimentNodes::Physical(nodes) => serde_json::to_value(nodes)?,
        ExperimentNodes::Alias(requests) => serde_json::to_value(requests)?,
    };
    document.insert(NODES_KEY.into(), nodes);

    if !experiment.firmware_associations().is_empty() {
        document.insert(
            FIRMWARE_ASSOCIATIONS_KEY.into(),
            experiment.firmware_associations().to_json(),
        );
    }
    if !experiment.profile_associations().is_empty() {
        document.insert(
            PROFILE_ASSOCIATIONS_KEY.into(),
            experiment.profile_associations().to_json(),
        );
    }
    if let Some(associations) = encode_categories(experiment.associations()) {
        document.insert(ASSOCIATIONS_KEY.into(), associations);
    }
    if let Some(associations) = encode_categories(experiment.site_associations()) {
        document.insert(SITE_ASSOCIATIONS_KEY.into(), associations);
    }
    Ok(canonicalize(Value::Object(document)))
}

/// Renders a document as text with sorted keys and four space indentation.
pub fn to_canonical_string(document: &Value) -> crate::Result<String> {
    let document = canonicalize(document.clone());
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|error| SpecError::SerializationError(error.to_string()))
}

fn field<'a>(document: &'a JsonMap<String, Value>, key: &str) -> Option<&'a Value> {
    document.get(key).filter(|value| !value.is_null())
}

fn decode_node_map(
    document: &JsonMap<String, Value>,
    key: &str,
    category: &str,
    kind: ExperimentType,
) -> crate::Result<AssociationMap<NodeRef>> {
    match field(document, key) {
        Some(value) => AssociationMap::from_json(category, TargetField::Nodes, value, |member| {
            parse_node_ref(kind, member)
        }),
        None => Ok(AssociationMap::new(category, TargetField::Nodes)),
    }
}

fn decode_categories<T: Ord + Clone>(
    document: &JsonMap<String, Value>,
    key: &str,
    target: TargetField,
    parse_member: impl Fn(&str) -> crate::Result<T>,
) -> crate::Result<BTreeMap<String, AssociationMap<T>>> {
    let Some(value) = field(document, key) else {
        return Ok(BTreeMap::new());
    };
    let Some(categories) = value.as_object() else {
        return invalid(format!("`{key}` has to be an object"));
    };
    let mut result = BTreeMap::new();
    for (category, records) in categories {
        let map = AssociationMap::from_json(category, target, records, &parse_member)?;
        if !map.is_empty() {
            result.insert(category.clone(), map);
        }
    }
    Ok(result)
}

fn parse_node_ref(kind: ExperimentType, member: &str) -> crate::Result<NodeRef> {
    match kind {
        ExperimentType::Physical => member.parse::<NodeId>().map(NodeRef::Physical),
        ExperimentType::Alias => member.parse::<AliasId>().map(NodeRef::Alias),
    }
}

fn decode_nodes(kind: ExperimentType, value: Option<&Value>) -> crate::Result<ExperimentNodes> {
    let value = value.cloned().unwrap_or_else(|| Value::Array(Vec::new()));
    let nodes = match kind {
        ExperimentType::Physical => serde_json::from_value::<Vec<NodeId>>(value)
            .map(|nodes| ExperimentNodes::Physical(nodes.into_iter().collect())),
        ExperimentType::Alias => {
            serde_json::from_value::<Vec<AliasRequest>>(value).map(ExperimentNodes::Alias)
        }
    };
    nodes.map_err(|error| SpecError::InvalidDocument(format!("Invalid {kind} nodes: {error}")))
}

/// Rebuilds an experiment from a submission document.
///
/// Values are taken as they are: nodes are already expanded and are not checked
/// against a site registry again.
pub fn decode(document: &Value) -> crate::Result<Experiment> {
    let Some(document) = document.as_object() else {
        return invalid("Experiment document has to be an object");
    };

    let name = match field(document, NAME_KEY) {
        None => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => return invalid("`name` has to be a string"),
    };
    let Some(duration) = field(document, DURATION_KEY)
        .and_then(Value::as_u64)
        .and_then(|duration| u32::try_from(duration).ok())
        .filter(|duration| *duration > 0)
    else {
        return invalid("`duration` has to be a positive number of minutes");
    };
    let reservation = match field(document, RESERVATION_KEY) {
        None => None,
        Some(value) => match value.as_i64() {
            Some(reservation) => Some(reservation),
            None => return invalid("`reservation` has to be a unix timestamp"),
        },
    };
    let kind: ExperimentType = match field(document, TYPE_KEY) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
            SpecError::InvalidDocument(format!("Unknown experiment type {value}"))
        })?,
        None => return invalid("Missing experiment `type`"),
    };

    let mut experiment = Experiment::new(name, duration, reservation);
    let nodes = decode_nodes(kind, field(document, NODES_KEY))?;
    if let ExperimentNodes::Alias(requests) = &nodes {
        for request in requests {
            experiment.alias_counter.observe(request.alias);
        }
    }
    experiment.nodes = Some(nodes);
    experiment.firmwares =
        decode_node_map(document, FIRMWARE_ASSOCIATIONS_KEY, FIRMWARE_CATEGORY, kind)?;
    experiment.profiles =
        decode_node_map(document, PROFILE_ASSOCIATIONS_KEY, PROFILE_CATEGORY, kind)?;
    experiment.associations =
        decode_categories(document, ASSOCIATIONS_KEY, TargetField::Nodes, |member| {
            parse_node_ref(kind, member)
        })?;
    experiment.site_associations =
        decode_categories(document, SITE_ASSOCIATIONS_KEY, TargetField::Sites, |member| {
            Ok(member.to_string())
        })?;

    log::debug!(
        "Decoded {kind} experiment with {} node entries",
        experiment.nodes().map(|nodes| nodes.len()).unwrap_or(0)
    );
    Ok(experiment)
}

/// Encodes the experiment, decodes the result and encodes it again.
/// Returns the document if both passes agree.
pub fn check_round_trip(experiment: &Experiment) -> crate::Result<Value> {
    let first = encode(experiment)?;
    let decoded = decode(&first)?;
    if decoded != *experiment {
        return Err(SpecError::RoundTripMismatch(
            "decoded experiment differs from the original".to_string(),
        ));
    }
    let second = encode(&decoded)?;
    if to_canonical_string(&first)? != to_canonical_string(&second)? {
        return Err(SpecError::RoundTripMismatch(
            "re-encoded document differs from the original".to_string(),
        ));
    }
    Ok(first)
}
