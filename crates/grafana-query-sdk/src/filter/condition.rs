//! Structured filters: conditions combined into a tree with `&&` and `||`.
use serde::{Deserialize, Serialize};

use super::{
    build_operation, parser, template, FieldDescriptor, FilterError, FilterValue, Lookups, OperationName, ParseError,
};

/// A single `field operation value` row of the visual filter editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// The backend name of the field.
    pub data_field: String,
    /// The operation applied to the field.
    pub operation: OperationName,
    /// The operand.
    #[serde(default)]
    pub value: FilterValue,
}

impl Condition {
    /// Create a condition.
    pub fn new(data_field: impl Into<String>, operation: OperationName, value: impl Into<FilterValue>) -> Self {
        Self {
            data_field: data_field.into(),
            operation,
            value: value.into(),
        }
    }

    /// Check that `field` describes this condition's field and accepts its operation.
    pub fn validate(&self, field: &FieldDescriptor) -> Result<(), FilterError> {
        if field.data_field != self.data_field {
            return Err(FilterError::UnknownField(self.data_field.clone()));
        }
        if !field.supports(self.operation) {
            return Err(FilterError::UnsupportedOperation {
                field: self.data_field.clone(),
                operation: self.operation,
            });
        }
        Ok(())
    }

    /// Check this condition against the descriptor for its field in `fields`.
    pub fn validate_against(&self, fields: &[FieldDescriptor]) -> Result<(), FilterError> {
        let field = fields
            .iter()
            .find(|f| f.data_field == self.data_field)
            .ok_or_else(|| FilterError::UnknownField(self.data_field.clone()))?;
        self.validate(field)
    }

    /// Build the expression for this condition.
    pub fn to_expression(&self, lookups: &Lookups) -> String {
        build_operation(&self.data_field, self.operation, &self.value, lookups)
    }
}

/// How the children of a group are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// All children must hold.
    #[default]
    And,
    /// At least one child must hold.
    Or,
}

impl Combinator {
    /// The operator joining children in an expression.
    pub fn operator(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// A node of a filter tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterNode {
    /// A leaf condition.
    Condition(Condition),
    /// Children joined by a combinator.
    Group {
        /// The combinator joining the children.
        combinator: Combinator,
        /// The children, in order.
        children: Vec<FilterNode>,
    },
}

impl Default for FilterNode {
    fn default() -> Self {
        Self::group(Combinator::And, Vec::new())
    }
}

impl FilterNode {
    /// Create a group.
    pub fn group(combinator: Combinator, children: Vec<FilterNode>) -> Self {
        Self::Group { combinator, children }
    }

    /// Parse a filter string into a tree.
    ///
    /// The root of the result is always a group. `fields` resolves ambiguous
    /// clauses, such as `>` versus `DateTimeIsAfter`, to an operation the field
    /// supports, and maps lookup values back to their labels.
    ///
    /// ```
    /// use grafana_query_sdk::filter::{Combinator, Condition, FilterNode, OperationName};
    ///
    /// let tree = FilterNode::parse(r#"partNumber = "A-1" && name.Contains("cell")"#, &[]).unwrap();
    /// assert_eq!(
    ///     tree,
    ///     FilterNode::group(
    ///         Combinator::And,
    ///         vec![
    ///             FilterNode::Condition(Condition::new("partNumber", OperationName::Equals, "A-1")),
    ///             FilterNode::Condition(Condition::new("name", OperationName::Contains, "cell")),
    ///         ],
    ///     ),
    /// );
    /// ```
    pub fn parse(filter: &str, fields: &[FieldDescriptor]) -> Result<Self, ParseError> {
        parser::parse_filter(filter, fields)
    }

    /// Build the filter expression for this tree.
    ///
    /// Empty conditions are skipped. Nested groups with more than one part, and
    /// alternatives joined with `&&`, are parenthesized.
    pub fn to_expression(&self, lookups: &Lookups) -> String {
        self.render(lookups).0
    }

    fn render(&self, lookups: &Lookups) -> (String, usize) {
        match self {
            Self::Condition(condition) => {
                let expression = condition.to_expression(lookups);
                let parts = usize::from(!expression.is_empty());
                (expression, parts)
            }
            Self::Group { combinator, children } => {
                let rendered: Vec<(bool, String, usize)> = children
                    .iter()
                    .map(|child| {
                        let (expression, n) = child.render(lookups);
                        (matches!(child, Self::Group { .. }), expression, n)
                    })
                    .filter(|(_, expression, _)| !expression.is_empty())
                    .collect();
                let count = rendered.len();
                let parts: Vec<String> = rendered
                    .into_iter()
                    .map(|(is_group, expression, n)| {
                        let alternative = count > 1
                            && *combinator == Combinator::And
                            && template::has_top_level_or(&expression);
                        if (is_group && n > 1) || alternative {
                            format!("({expression})")
                        } else {
                            expression
                        }
                    })
                    .collect();
                (parts.join(&format!(" {} ", combinator.operator())), count)
            }
        }
    }

    /// Every condition in the tree, depth first.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Self::Condition(condition) => vec![condition],
            Self::Group { children, .. } => children.iter().flat_map(FilterNode::conditions).collect(),
        }
    }
}
