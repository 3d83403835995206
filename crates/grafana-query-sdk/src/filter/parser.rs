//! Parse a whole filter string back into a [`FilterNode`] tree.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr := and ("||" and)*
//! and  := term ("&&" term)*
//! term := clause | "(" expr ")"
//! ```
//!
//! A clause is any text matching one operation's expression template. Clauses
//! are tried before parenthesized groups, since some templates (such as
//! `DateTimeIsBlank`) contain `||` themselves. Such a clause must be
//! parenthesized when it is joined with `&&`.
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::{
    read_operation, template, Combinator, Condition, FieldDescriptor, FilterNode, FilterValue, Lookups,
    OperationKind, OperationName, ParseError,
};

struct ClauseMatcher {
    operation: OperationName,
    regex: Regex,
    /// The placeholder bound by each capture group.
    groups: Vec<usize>,
}

static MATCHERS: LazyLock<Vec<ClauseMatcher>> = LazyLock::new(|| {
    OperationName::ALL
        .into_iter()
        .filter_map(|operation| {
            let (source, groups) = template::pattern(operation.operation().expression_template);
            let regex = Regex::new(&format!("^(?:{source})")).ok()?;
            Some(ClauseMatcher {
                operation,
                regex,
                groups,
            })
        })
        .collect()
});

/// A successful clause match.
struct Clause<'a> {
    operation: OperationName,
    text: &'a str,
    bindings: Vec<&'a str>,
}

impl ClauseMatcher {
    fn matches<'a>(&self, input: &'a str) -> Option<Clause<'a>> {
        let caps = self.regex.captures(input)?;
        let mut bindings: Vec<Option<&'a str>> = vec![None; self.groups.iter().max().map_or(0, |m| m + 1)];
        for (group, &placeholder) in self.groups.iter().enumerate() {
            let text = caps.get(group + 1)?.as_str();
            // A placeholder used twice must bind the same text both times.
            if bindings[placeholder].is_some_and(|previous| previous != text) {
                return None;
            }
            bindings[placeholder] = Some(text);
        }
        Some(Clause {
            operation: self.operation,
            text: caps.get(0)?.as_str(),
            bindings: bindings.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }
}

/// Parse `filter` into a tree whose root is a group.
pub(crate) fn parse_filter(filter: &str, fields: &[FieldDescriptor]) -> Result<FilterNode, ParseError> {
    let mut parser = Parser {
        input: filter,
        pos: 0,
        fields,
        lookups: Lookups::from_fields(fields),
    };
    parser.skip_whitespace();
    if parser.at_end() {
        return Ok(FilterNode::default());
    }
    let (combinator, children) = parser.parse_expression()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.unexpected());
    }
    Ok(FilterNode::group(combinator, children))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    fields: &'a [FieldDescriptor],
    lookups: Lookups,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            offset: self.pos,
            found: self.rest().chars().take(32).collect(),
        }
    }

    /// Parse `and ("||" and)*`, returning the combinator and children of the
    /// resulting group.
    fn parse_expression(&mut self) -> Result<(Combinator, Vec<FilterNode>), ParseError> {
        let mut alternatives = vec![self.parse_conjunction()?];
        while self.eat(Combinator::Or.operator()) {
            alternatives.push(self.parse_conjunction()?);
        }
        if alternatives.len() == 1 {
            return Ok((Combinator::And, alternatives.pop().unwrap_or_default()));
        }
        let children = alternatives
            .into_iter()
            .map(|terms| node(Combinator::And, terms))
            .collect();
        Ok((Combinator::Or, children))
    }

    /// Parse `term ("&&" term)*`.
    ///
    /// A bare clause whose template contains `||` may only stand alone, since
    /// its text would otherwise bind looser than the `&&` next to it.
    fn parse_conjunction(&mut self) -> Result<Vec<FilterNode>, ParseError> {
        let mut terms = Vec::new();
        let mut ungrouped = None;
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let (term, alternative) = self.parse_term()?;
            if alternative {
                ungrouped.get_or_insert(offset);
            }
            terms.push(term);
            if !self.eat(Combinator::And.operator()) {
                break;
            }
        }
        match ungrouped {
            Some(offset) if terms.len() > 1 => Err(ParseError::UngroupedAlternative { offset }),
            _ => Ok(terms),
        }
    }

    /// Parse one term, reporting whether it was a bare clause containing `||`.
    fn parse_term(&mut self) -> Result<(FilterNode, bool), ParseError> {
        self.skip_whitespace();
        if let Some(clause) = self.best_clause() {
            self.pos += clause.text.len();
            let result = read_operation(clause.operation, clause.text, clause.bindings.as_slice(), &self.lookups);
            trace!(operation = %clause.operation, field = %result.field_name, "Parsed clause");
            let condition = FilterNode::Condition(Condition {
                data_field: result.field_name,
                operation: clause.operation,
                value: result.value,
            });
            return Ok((condition, template::has_top_level_or(clause.text)));
        }
        let open = self.pos;
        if !self.eat("(") {
            return Err(self.unexpected());
        }
        let (combinator, children) = self.parse_expression()?;
        if !self.eat(")") {
            return Err(ParseError::UnclosedGroup { offset: open });
        }
        Ok((collapse_multi_value(node(combinator, children)), false))
    }

    /// The longest clause at the current position.
    ///
    /// Templates shared by several operations are resolved to one the field
    /// supports, then to the first in registry order.
    fn best_clause(&self) -> Option<Clause<'a>> {
        let rest = self.rest();
        let mut best: Option<(Clause<'a>, bool)> = None;
        for matcher in MATCHERS.iter() {
            let Some(clause) = matcher.matches(rest) else {
                continue;
            };
            let supported = self.supported(&clause);
            let better = match &best {
                None => true,
                Some((current, current_supported)) => {
                    clause.text.len() > current.text.len()
                        || (clause.text.len() == current.text.len() && supported && !current_supported)
                }
            };
            if better {
                best = Some((clause, supported));
            }
        }
        best.map(|(clause, _)| clause)
    }

    fn supported(&self, clause: &Clause<'_>) -> bool {
        let field = clause.bindings.first().copied().unwrap_or_default();
        self.fields
            .iter()
            .any(|f| f.data_field == field && f.supports(clause.operation))
    }
}

fn node(combinator: Combinator, mut children: Vec<FilterNode>) -> FilterNode {
    if children.len() == 1 {
        children.pop().unwrap_or_default()
    } else {
        FilterNode::group(combinator, children)
    }
}

/// Turn a parenthesized run of single-value clauses on one field back into
/// the list condition the builder expands into such a run.
fn collapse_multi_value(tree: FilterNode) -> FilterNode {
    let FilterNode::Group { combinator, children } = tree else {
        return tree;
    };
    if let Some(condition) = as_multi_value(combinator, &children) {
        return FilterNode::Condition(condition);
    }
    FilterNode::Group { combinator, children }
}

fn as_multi_value(combinator: Combinator, children: &[FilterNode]) -> Option<Condition> {
    let Some(FilterNode::Condition(first)) = children.first() else {
        return None;
    };
    let operation = first.operation;
    let expandable = matches!(
        operation.operation().kind,
        OperationKind::Scalar | OperationKind::List | OperationKind::DateTime
    );
    let expected = if operation.is_negated() {
        Combinator::And
    } else {
        Combinator::Or
    };
    if children.len() < 2 || !expandable || combinator != expected {
        return None;
    }
    let values = children
        .iter()
        .map(|child| match child {
            FilterNode::Condition(Condition {
                data_field,
                operation: op,
                value: FilterValue::Text(value),
            }) if *data_field == first.data_field && *op == operation => Some(value.clone()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Condition::new(first.data_field.clone(), operation, FilterValue::List(values)))
}
