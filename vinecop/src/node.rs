//! A small, recursive, named-field tree: the serialization format for
//! [`crate::bicop::Bicop`] and [`crate::vinecop::Vinecop`], independent of
//! any particular wire format (JSON today; anything `serde` can drive).

use serde::de::Error as DeError;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bicop::Bicop;
use crate::error::{Error, Result};
use crate::family::BicopFamily;
use crate::rvine_matrix::RVineMatrix;
use crate::vinecop::Vinecop;

/// A named-node tree: either a scalar/vector leaf, or a named, order-preserving
/// set of child nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A scalar or vector value (numbers, strings, arrays of either).
    Leaf(serde_json::Value),
    /// A named field set, in declaration order.
    Map(Vec<(String, Node)>),
}

impl Node {
    /// Wraps any serializable value as a leaf.
    ///
    /// # Panics
    /// Panics if `value` cannot be represented as JSON (never the case for
    /// the numeric/string types this crate serializes).
    #[must_use]
    pub fn leaf(value: impl Serialize) -> Self {
        Self::Leaf(serde_json::to_value(value).expect("leaf values are always representable as JSON"))
    }

    /// Builds a named field set.
    #[must_use]
    pub fn map(fields: impl IntoIterator<Item = (&'static str, Node)>) -> Self {
        Self::Map(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Looks up a field by name in a [`Node::Map`]; `None` on a leaf or a
    /// missing key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::Leaf(_) => None,
        }
    }

    /// Every `(key, Node)` pair in a [`Node::Map`]; empty for a leaf.
    #[must_use]
    pub fn entries(&self) -> &[(String, Self)] {
        match self {
            Self::Map(fields) => fields,
            Self::Leaf(_) => &[],
        }
    }

    /// Deserializes this node's leaf value (or reinterprets a whole map node
    /// as one JSON object) as `T`.
    ///
    /// # Errors
    /// Returns [`Error::Other`] if the underlying JSON does not match `T`.
    pub fn parse<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        let value = self.to_json();
        serde_json::from_value(value).map_err(|e| Error::Other(anyhow::anyhow!(e)))
    }

    /// Converts to a plain [`serde_json::Value`], recursively.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Leaf(v) => v.clone(),
            Self::Map(fields) => {
                let map = fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                serde_json::Value::Object(map)
            }
        }
    }

    /// Converts from a [`serde_json::Value`]: objects become [`Node::Map`]
    /// (in the map's iteration order), everything else a [`Node::Leaf`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect()),
            other => Self::Leaf(other),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(value) => value.serialize(serializer),
            Self::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer).map_err(DeError::custom)?;
        Ok(Self::from_json(value))
    }
}

/// Serializes a [`Bicop`] to its named-node form: `{family, rotation,
/// parameters, var_type, nobs, loglik}`, the last two `null` if never fitted.
#[must_use]
pub fn bicop_to_node(bicop: &Bicop) -> Node {
    Node::map([
        ("family", Node::leaf(bicop.family().to_string())),
        ("rotation", Node::leaf(bicop.rotation())),
        ("parameters", Node::leaf(bicop.parameters())),
        ("var_type", Node::leaf("continuous")),
        ("nobs", Node::leaf(bicop.nobs().ok())),
        ("loglik", Node::leaf(bicop.fitted_loglik().ok())),
    ])
}

/// Reconstructs a [`Bicop`] from [`bicop_to_node`]'s output (fitted
/// diagnostics are not restored; only family, rotation, and parameters are
/// structural).
///
/// # Errors
/// Returns [`Error::Parameter`] if a required field is missing or malformed.
pub fn bicop_from_node(node: &Node) -> Result<Bicop> {
    let family_name: String =
        node.get("family").ok_or_else(|| Error::Parameter("node missing 'family'".to_string()))?.parse()?;
    let family: BicopFamily = family_name.parse()?;
    let rotation: u16 =
        node.get("rotation").ok_or_else(|| Error::Parameter("node missing 'rotation'".to_string()))?.parse()?;
    let parameters: Vec<f64> =
        node.get("parameters").ok_or_else(|| Error::Parameter("node missing 'parameters'".to_string()))?.parse()?;

    let mut bicop = Bicop::with_rotation(family, rotation)?;
    if !parameters.is_empty() {
        bicop.set_parameters(&parameters)?;
    }
    Ok(bicop)
}

/// Serializes a [`Vinecop`] to its named-node form: `{order, matrix,
/// pair_copulas}`, with `pair_copulas` a flat map keyed `"t{tree}e{edge}"` to
/// each edge's own [`bicop_to_node`].
#[must_use]
pub fn vinecop_to_node(vine: &Vinecop) -> Node {
    let matrix: Vec<Vec<u32>> = vine.get_matrix().rows().into_iter().map(|row| row.to_vec()).collect();
    let mut pair_copulas = Vec::new();
    for (tree, row) in vine.get_all_pair_copulas().iter().enumerate() {
        for (edge, bicop) in row.iter().enumerate() {
            pair_copulas.push((format!("t{tree}e{edge}"), bicop_to_node(bicop)));
        }
    }
    Node::map([
        ("dim", Node::leaf(vine.dim())),
        ("order", Node::leaf(vine.order())),
        ("matrix", Node::leaf(matrix)),
        ("pair_copulas", Node::Map(pair_copulas)),
    ])
}

/// Reconstructs a [`Vinecop`] from [`vinecop_to_node`]'s output.
///
/// # Errors
/// Returns [`Error::Parameter`] if a required field is missing or malformed,
/// or [`Error::Structure`] if the reconstructed matrix/staircase is invalid.
pub fn vinecop_from_node(node: &Node) -> Result<Vinecop> {
    let dim: usize = node.get("dim").ok_or_else(|| Error::Parameter("node missing 'dim'".to_string()))?.parse()?;
    let matrix_rows: Vec<Vec<u32>> =
        node.get("matrix").ok_or_else(|| Error::Parameter("node missing 'matrix'".to_string()))?.parse()?;
    let mut matrix = ndarray::Array2::<u32>::zeros((dim, dim));
    for (i, row) in matrix_rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    let vine_matrix = RVineMatrix::new(matrix)?;

    let pair_copula_node =
        node.get("pair_copulas").ok_or_else(|| Error::Parameter("node missing 'pair_copulas'".to_string()))?;
    let mut pair_copulas: Vec<Vec<Option<Bicop>>> = (0..dim - 1).map(|t| vec![None; dim - 1 - t]).collect();
    for (key, bicop_node) in pair_copula_node.entries() {
        let (tree, edge) = parse_tree_edge_key(key)?;
        let bicop = bicop_from_node(bicop_node)?;
        *pair_copulas
            .get_mut(tree)
            .and_then(|row| row.get_mut(edge))
            .ok_or_else(|| Error::Structure(format!("pair copula key '{key}' is out of range for dim {dim}")))? =
            Some(bicop);
    }
    let pair_copulas: Vec<Vec<Bicop>> = pair_copulas
        .into_iter()
        .enumerate()
        .map(|(tree, row)| {
            row.into_iter()
                .enumerate()
                .map(|(edge, pc)| pc.ok_or_else(|| Error::Structure(format!("missing pair copula at tree {tree}, edge {edge}"))))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Vinecop::from_structure(vine_matrix, pair_copulas)
}

fn parse_tree_edge_key(key: &str) -> Result<(usize, usize)> {
    let rest = key.strip_prefix('t').ok_or_else(|| Error::Parameter(format!("malformed pair copula key '{key}'")))?;
    let (tree_str, edge_str) =
        rest.split_once('e').ok_or_else(|| Error::Parameter(format!("malformed pair copula key '{key}'")))?;
    let tree: usize = tree_str.parse().map_err(|_| Error::Parameter(format!("malformed pair copula key '{key}'")))?;
    let edge: usize = edge_str.parse().map_err(|_| Error::Parameter(format!("malformed pair copula key '{key}'")))?;
    Ok((tree, edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::BicopFamily;

    #[test]
    fn bicop_round_trips_through_a_node() {
        let mut bicop = Bicop::with_rotation(BicopFamily::Clayton, 180).unwrap();
        bicop.set_parameters(&[2.5]).unwrap();
        let node = bicop_to_node(&bicop);
        let restored = bicop_from_node(&node).unwrap();
        assert_eq!(restored.family(), BicopFamily::Clayton);
        assert_eq!(restored.rotation(), 180);
        assert_eq!(restored.parameters(), &[2.5]);
    }

    #[test]
    fn bicop_node_round_trips_through_json_text() {
        let bicop = Bicop::new(BicopFamily::Gumbel);
        let node = bicop_to_node(&bicop);
        let text = serde_json::to_string(&node).unwrap();
        let reparsed: Node = serde_json::from_str(&text).unwrap();
        let restored = bicop_from_node(&reparsed).unwrap();
        assert_eq!(restored.family(), BicopFamily::Gumbel);
    }

    #[test]
    fn vinecop_round_trips_through_a_node() {
        let vine = Vinecop::new(3).unwrap();
        let node = vinecop_to_node(&vine);
        let restored = vinecop_from_node(&node).unwrap();
        assert_eq!(restored.dim(), 3);
        assert_eq!(restored.get_all_pair_copulas().len(), 2);
        for (tree, row) in restored.get_all_pair_copulas().iter().enumerate() {
            for pc in row {
                assert_eq!(pc.family(), BicopFamily::Indep, "tree {tree}");
            }
        }
    }

    #[test]
    fn node_map_preserves_field_order() {
        let node = Node::map([("a", Node::leaf(1)), ("b", Node::leaf(2))]);
        let keys: Vec<&str> = node.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
