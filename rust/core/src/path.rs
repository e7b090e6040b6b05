// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Namespace-aware path queries over a [`Document`].
//!
//! Supports the XPath 1.0 subset the field catalog is written in:
//!
//! ```text
//! //gb:Campus/gb:Location/gb:Name
//! //gb:SizingPeriodDesignDay[2]/gb:Month
//! //gb:Space/gb:AnalysisParameter[gb:Name='OAFlowMethod']/gb:ParameterValue
//! //gb:Construction[@id='c1']
//! ```
//!
//! Positional predicates count among the matching children of each parent,
//! so `//X[2]` is "every X that is the second X child of its parent", as in
//! XPath. Results are de-duplicated and returned in document order.

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::xml::{Document, NodeKey};

/// Navigation between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/`
    Child,
    /// `//`
    Descendant,
}

/// A possibly prefixed element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTest {
    pub prefix: Option<String>,
    pub local: String,
}

/// Step filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based.
    Position(usize),
    /// `[p:Child='value']`
    ChildEquals { name: NameTest, value: String },
    /// `[@attr='value']`
    AttributeEquals { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub name: NameTest,
    pub predicates: Vec<Predicate>,
}

/// Prefix → namespace URI bindings used while evaluating a path.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    bindings: FxHashMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding.
    pub fn with(mut self, prefix: &str, uri: &str) -> Self {
        self.bind(prefix, uri);
        self
    }

    pub fn bind(&mut self, prefix: &str, uri: &str) {
        self.bindings.insert(prefix.to_string(), uri.to_string());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    steps: Vec<Step>,
}

impl PathExpr {
    /// Parse a path expression.
    pub fn parse(expr: &str) -> Result<Self> {
        match all_consuming(path)(expr.trim()) {
            Ok((_, steps)) => Ok(Self {
                source: expr.to_string(),
                steps,
            }),
            Err(e) => Err(Error::invalid_path(expr, e.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Every namespace prefix the expression names, predicates included.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flat_map(|step| {
            let predicates = step.predicates.iter().filter_map(|p| match p {
                Predicate::ChildEquals { name, .. } => name.prefix.as_deref(),
                _ => None,
            });
            step.name.prefix.as_deref().into_iter().chain(predicates)
        })
    }

    /// All matching nodes in document order.
    pub fn select(&self, doc: &Document, namespaces: &Namespaces) -> Result<Vec<NodeKey>> {
        let order: FxHashMap<NodeKey, usize> = doc
            .descendants_or_self(doc.document_node())
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, i))
            .collect();

        let mut context = vec![doc.document_node()];
        for step in &self.steps {
            let namespace = match &step.name.prefix {
                Some(prefix) => Some(
                    namespaces
                        .get(prefix)
                        .ok_or_else(|| Error::UnboundPrefix(prefix.clone()))?,
                ),
                None => None,
            }
            .filter(|uri| !uri.is_empty());

            let parents: Vec<NodeKey> = match step.axis {
                Axis::Child => context.clone(),
                Axis::Descendant => context
                    .iter()
                    .flat_map(|&k| doc.descendants_or_self(k))
                    .collect(),
            };

            let mut seen = FxHashSet::default();
            let mut next = Vec::new();
            for parent in parents {
                if !seen.insert(parent) {
                    continue;
                }
                let mut matched: Vec<NodeKey> = doc
                    .child_elements(parent)
                    .filter(|&k| name_matches(doc, k, &step.name.local, namespace))
                    .collect();
                for predicate in &step.predicates {
                    matched = apply_predicate(doc, namespaces, matched, predicate)?;
                }
                next.extend(matched);
            }

            let mut unique = FxHashSet::default();
            next.retain(|k| unique.insert(*k));
            next.sort_by_key(|k| order.get(k).copied().unwrap_or(usize::MAX));
            context = next;
            if context.is_empty() {
                break;
            }
        }

        Ok(context)
    }

    /// First matching node in document order.
    pub fn select_first(&self, doc: &Document, namespaces: &Namespaces) -> Result<Option<NodeKey>> {
        Ok(self.select(doc, namespaces)?.into_iter().next())
    }
}

impl FromStr for PathExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn name_matches(doc: &Document, key: NodeKey, local: &str, namespace: Option<&str>) -> bool {
    doc.element(key)
        .is_some_and(|e| e.local == local && e.namespace.as_deref() == namespace)
}

fn apply_predicate(
    doc: &Document,
    namespaces: &Namespaces,
    nodes: Vec<NodeKey>,
    predicate: &Predicate,
) -> Result<Vec<NodeKey>> {
    Ok(match predicate {
        Predicate::Position(n) => nodes
            .get(n.wrapping_sub(1))
            .copied()
            .into_iter()
            .collect(),
        Predicate::AttributeEquals { name, value } => nodes
            .into_iter()
            .filter(|&k| doc.attribute(k, name) == Some(value.as_str()))
            .collect(),
        Predicate::ChildEquals { name, value } => {
            let namespace = match &name.prefix {
                Some(prefix) => Some(
                    namespaces
                        .get(prefix)
                        .ok_or_else(|| Error::UnboundPrefix(prefix.clone()))?,
                ),
                None => None,
            }
            .filter(|uri| !uri.is_empty());
            nodes
                .into_iter()
                .filter(|&k| {
                    doc.child_elements(k).any(|c| {
                        name_matches(doc, c, &name.local, namespace) && doc.text_content(c) == *value
                    })
                })
                .collect()
        }
    })
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// NCName: letter or underscore followed by name characters.
fn ncname(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_name_char),
    ))(input)
}

/// `prefix:local` or `local`
fn qname(input: &str) -> IResult<&str, NameTest> {
    map(pair(opt(terminated(ncname, char(':'))), ncname), |(prefix, local)| {
        NameTest {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    })(input)
}

/// `'text'` or `"text"`
fn literal(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))(input)
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

fn position(input: &str) -> IResult<&str, Predicate> {
    map_res(digit1, |s: &str| s.parse::<usize>().map(Predicate::Position))(input)
}

fn attribute_equals(input: &str) -> IResult<&str, Predicate> {
    map(
        separated_pair(preceded(char('@'), ncname), ws(char('=')), literal),
        |(name, value)| Predicate::AttributeEquals {
            name: name.to_string(),
            value: value.to_string(),
        },
    )(input)
}

fn child_equals(input: &str) -> IResult<&str, Predicate> {
    map(separated_pair(qname, ws(char('=')), literal), |(name, value)| {
        Predicate::ChildEquals {
            name,
            value: value.to_string(),
        }
    })(input)
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    delimited(
        char('['),
        ws(alt((position, attribute_equals, child_equals))),
        char(']'),
    )(input)
}

fn axis(input: &str) -> IResult<&str, Axis> {
    alt((value(Axis::Descendant, tag("//")), value(Axis::Child, tag("/"))))(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    map(tuple((axis, qname, many0(predicate))), |(axis, name, predicates)| Step {
        axis,
        name,
        predicates,
    })(input)
}

fn path(input: &str) -> IResult<&str, Vec<Step>> {
    many1(step)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: &str = "http://www.gbxml.org/schema";

    fn ns() -> Namespaces {
        Namespaces::new().with("gb", GB)
    }

    fn doc() -> Document {
        Document::parse(
            r#"<gbXML xmlns="http://www.gbxml.org/schema">
  <Campus>
    <Location><Name>Seoul</Name></Location>
    <Building buildingType="Office"><Space id="s1">
      <AnalysisParameter><Name>OAFlowMethod</Name><ParameterValue>Sum</ParameterValue></AnalysisParameter>
      <AnalysisParameter><Name>OAFlowPerArea</Name><ParameterValue>0.3</ParameterValue></AnalysisParameter>
    </Space></Building>
  </Campus>
  <SizingPeriodDesignDay><Month>7</Month></SizingPeriodDesignDay>
  <SizingPeriodDesignDay><Month>1</Month></SizingPeriodDesignDay>
</gbXML>"#,
        )
        .unwrap()
    }

    fn texts(doc: &Document, keys: &[NodeKey]) -> Vec<String> {
        keys.iter().map(|&k| doc.text_content(k)).collect()
    }

    #[test]
    fn test_parse_steps() {
        let expr = PathExpr::parse("//gb:Campus/gb:Location/gb:Name").unwrap();
        assert_eq!(expr.steps().len(), 3);
        assert_eq!(expr.steps()[0].axis, Axis::Descendant);
        assert_eq!(expr.steps()[1].axis, Axis::Child);
        assert_eq!(expr.steps()[2].name.local, "Name");
        assert_eq!(expr.steps()[2].name.prefix.as_deref(), Some("gb"));
    }

    #[test]
    fn test_parse_predicates() {
        let expr =
            PathExpr::parse("//gb:Space/gb:AnalysisParameter[gb:Name='OAFlowMethod'][1]").unwrap();
        let preds = &expr.steps()[1].predicates;
        assert_eq!(preds.len(), 2);
        assert!(matches!(&preds[0], Predicate::ChildEquals { value, .. } if value == "OAFlowMethod"));
        assert_eq!(preds[1], Predicate::Position(1));

        let expr = PathExpr::parse(r#"//gb:Space[@id = "s1"]"#).unwrap();
        assert!(matches!(
            &expr.steps()[0].predicates[0],
            Predicate::AttributeEquals { name, value } if name == "id" && value == "s1"
        ));
    }

    #[test]
    fn test_prefixes_include_predicates() {
        let expr = PathExpr::parse("//gb:Space/Param[x:Name='a'][@id='b']/y:Value").unwrap();
        assert_eq!(expr.prefixes().collect::<Vec<_>>(), vec!["gb", "x", "y"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PathExpr::parse("gb:Campus").is_err());
        assert!(PathExpr::parse("//gb:Campus[").is_err());
        assert!(PathExpr::parse("").is_err());
        assert!(PathExpr::parse("//1abc").is_err());
    }

    #[test]
    fn test_select_simple_path() {
        let doc = doc();
        let expr = PathExpr::parse("//gb:Campus/gb:Location/gb:Name").unwrap();
        let found = expr.select(&doc, &ns()).unwrap();
        assert_eq!(texts(&doc, &found), vec!["Seoul"]);
    }

    #[test]
    fn test_select_positional() {
        let doc = doc();
        let first = PathExpr::parse("//gb:SizingPeriodDesignDay[1]/gb:Month").unwrap();
        let second = PathExpr::parse("//gb:SizingPeriodDesignDay[2]/gb:Month").unwrap();
        assert_eq!(texts(&doc, &first.select(&doc, &ns()).unwrap()), vec!["7"]);
        assert_eq!(texts(&doc, &second.select(&doc, &ns()).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_select_child_value_predicate() {
        let doc = doc();
        let expr = PathExpr::parse(
            "//gb:Space/gb:AnalysisParameter[gb:Name='OAFlowPerArea']/gb:ParameterValue",
        )
        .unwrap();
        assert_eq!(texts(&doc, &expr.select(&doc, &ns()).unwrap()), vec!["0.3"]);
    }

    #[test]
    fn test_select_document_order() {
        let doc = doc();
        let expr = PathExpr::parse("//gb:Name").unwrap();
        assert_eq!(
            texts(&doc, &expr.select(&doc, &ns()).unwrap()),
            vec!["Seoul", "OAFlowMethod", "OAFlowPerArea"]
        );
    }

    #[test]
    fn test_unprefixed_step_matches_no_namespace_only() {
        let doc = doc();
        let expr = PathExpr::parse("//Campus").unwrap();
        assert!(expr.select(&doc, &ns()).unwrap().is_empty());
    }

    #[test]
    fn test_unbound_prefix() {
        let doc = doc();
        let expr = PathExpr::parse("//x:Campus").unwrap();
        assert!(matches!(expr.select(&doc, &ns()), Err(Error::UnboundPrefix(p)) if p == "x"));
    }

    #[test]
    fn test_attribute_predicate() {
        let doc = doc();
        let hit = PathExpr::parse("//gb:Space[@id='s1']").unwrap();
        let miss = PathExpr::parse("//gb:Space[@id='s2']").unwrap();
        assert_eq!(hit.select(&doc, &ns()).unwrap().len(), 1);
        assert!(miss.select_first(&doc, &ns()).unwrap().is_none());
    }
}
