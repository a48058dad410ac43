//! Declarative query filters evaluated over serialized entities.
//!
//! A [`QueryFilter`] is data, not a closure: the same filter can be run
//! against an in-memory collection (the offline path always materializes
//! the full entity set first) or handed to a remote client that knows how
//! to delegate it. Both must agree, so evaluation is defined here once.

use crate::entity::{to_record, Entity};
use crate::error::{RepositoryError, RepositoryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Field equals the operand.
    Eq,
    /// Field differs from the operand.
    Ne,
    /// Field is less than the operand.
    Lt,
    /// Field is less than or equal to the operand.
    Le,
    /// Field is greater than the operand.
    Gt,
    /// Field is greater than or equal to the operand.
    Ge,
    /// String field contains the operand, or array field contains the element.
    Contains,
    /// String field starts with the operand.
    StartsWith,
}

/// Sort order for [`QueryFilter::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One predicate over a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated field path in the serialized entity.
    pub field: String,
    /// Comparison.
    pub op: FilterOp,
    /// Operand.
    pub value: Value,
}

impl Condition {
    fn evaluate(&self, record: &Value) -> bool {
        let field = field_value(record, &self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => values_equal(field, &self.value),
            FilterOp::Ne => !values_equal(field, &self.value),
            FilterOp::Lt => ordered(field, &self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                ordered(field, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => ordered(field, &self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                ordered(field, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Contains => match (field, &self.value) {
                (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
                (Value::Array(items), operand) => {
                    items.iter().any(|item| values_equal(item, operand))
                }
                _ => false,
            },
            FilterOp::StartsWith => match (field, &self.value) {
                (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
                _ => false,
            },
        }
    }
}

/// Predicates, ordering and paging over entities of type `T`.
///
/// Conditions are joined with AND. Ordering is stable, so entities that
/// compare equal keep their input order. Paging is applied after ordering.
///
/// # Example
///
/// ```rust,ignore
/// let filter = QueryFilter::<Customer>::new()
///     .where_eq("city", "Oslo")
///     .filter("orders", FilterOp::Ge, 3)
///     .order_by("name", SortDirection::Ascending)
///     .take(10);
/// let customers = repository.get(&filter).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct QueryFilter<T> {
    conditions: Vec<Condition>,
    order_by: Option<(String, SortDirection)>,
    skip: usize,
    take: Option<usize>,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for QueryFilter<T> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            order_by: None,
            skip: 0,
            take: None,
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> QueryFilter<T> {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Adds an equality condition.
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Orders results by a field.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Skips the first `n` results.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Returns at most `n` results.
    pub fn take(mut self, n: usize) -> Self {
        self.take = Some(n);
        self
    }

    /// Returns the conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns true if the filter has no conditions, ordering or paging.
    pub fn is_unbounded(&self) -> bool {
        self.conditions.is_empty() && self.order_by.is_none() && self.skip == 0 && self.take.is_none()
    }

    /// Returns true if `entity` satisfies every condition.
    pub fn matches(&self, entity: &T) -> RepositoryResult<bool> {
        let record = to_record(entity)?;
        Ok(self.matches_record(&record))
    }

    fn matches_record(&self, record: &Value) -> bool {
        self.conditions.iter().all(|c| c.evaluate(record))
    }

    /// Filters, orders and pages `items`.
    pub fn apply(&self, items: Vec<T>) -> RepositoryResult<Vec<T>> {
        let mut selected = Vec::new();
        for item in items {
            let record = to_record(&item)?;
            if self.matches_record(&record) {
                selected.push((record, item));
            }
        }

        if let Some((field, direction)) = &self.order_by {
            selected.sort_by(|(a, _), (b, _)| {
                let a = field_value(a, field).unwrap_or(&Value::Null);
                let b = field_value(b, field).unwrap_or(&Value::Null);
                let ordering = compare_values(a, b);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let take = self.take.unwrap_or(usize::MAX);
        Ok(selected
            .into_iter()
            .skip(self.skip)
            .take(take)
            .map(|(_, item)| item)
            .collect())
    }

    /// Checks that every operand is a scalar a field can be compared with.
    pub fn validate(&self) -> RepositoryResult<()> {
        for condition in &self.conditions {
            let ordering_op = matches!(
                condition.op,
                FilterOp::Lt | FilterOp::Le | FilterOp::Gt | FilterOp::Ge
            );
            if ordering_op && !is_scalar(&condition.value) {
                return Err(RepositoryError::InvalidFilter(format!(
                    "{:?} on {} needs a scalar operand",
                    condition.op, condition.field
                )));
            }
            if condition.op == FilterOp::StartsWith && !condition.value.is_string() {
                return Err(RepositoryError::InvalidFilter(format!(
                    "StartsWith on {} needs a string operand",
                    condition.field
                )));
            }
        }
        Ok(())
    }
}

/// Resolves a dot-separated path. `None` if a segment is missing.
fn field_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Number(_) | Value::String(_) | Value::Bool(_))
}

/// Numbers compare by value, so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Ordering::Equal,
        _ => a == b,
    }
}

/// Ordering between values of the same scalar kind; `None` otherwise.
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Bool(_), Value::Bool(_)) => Some(compare_values(a, b)),
        _ => None,
    }
}

/// Total order used for sorting: numbers, then strings, then booleans,
/// then everything else; nulls sort last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Integers compare exactly; a float on either side compares as `f64`.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    // A negative integer against one above i64::MAX
    if x.is_i64() && y.is_u64() {
        return Ordering::Less;
    }
    if x.is_u64() && y.is_i64() {
        return Ordering::Greater;
    }

    let a = x.as_f64().unwrap_or(f64::NAN);
    let b = y.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_entity::Account;
    use serde_json::json;

    fn accounts() -> Vec<Account> {
        vec![
            Account::new(1, "ops", 300),
            Account::new(2, "payroll", 50),
            Account::new(3, "ops-reserve", 900),
            Account::new(4, "marketing", 50),
        ]
    }

    fn ids(items: &[Account]) -> Vec<i64> {
        items.iter().map(|a| a.id).collect()
    }

    #[test]
    fn empty_filter_returns_everything() {
        let filter = QueryFilter::<Account>::new();
        assert!(filter.is_unbounded());
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [1, 2, 3, 4]);
    }

    #[test]
    fn conditions_are_anded() {
        let filter = QueryFilter::<Account>::new()
            .filter("name", FilterOp::StartsWith, "ops")
            .filter("balance", FilterOp::Gt, 500);
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [3]);
    }

    #[test]
    fn comparison_operators() {
        let apply = |op, value: i64| {
            let filter = QueryFilter::<Account>::new().filter("balance", op, value);
            ids(&filter.apply(accounts()).unwrap())
        };

        assert_eq!(apply(FilterOp::Eq, 50), [2, 4]);
        assert_eq!(apply(FilterOp::Ne, 50), [1, 3]);
        assert_eq!(apply(FilterOp::Lt, 300), [2, 4]);
        assert_eq!(apply(FilterOp::Le, 300), [1, 2, 4]);
        assert_eq!(apply(FilterOp::Gt, 300), [3]);
        assert_eq!(apply(FilterOp::Ge, 300), [1, 3]);
    }

    #[test]
    fn numbers_compare_by_value() {
        let filter = QueryFilter::<Account>::new().where_eq("balance", 50.0);
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [2, 4]);
    }

    #[test]
    fn cross_type_comparisons_never_match() {
        let filter = QueryFilter::<Account>::new().filter("balance", FilterOp::Gt, "100");
        assert!(filter.apply(accounts()).unwrap().is_empty());
    }

    #[test]
    fn missing_field_behaves_as_null() {
        let filter = QueryFilter::<Account>::new().where_eq("owner", Value::Null);
        assert_eq!(filter.apply(accounts()).unwrap().len(), 4);

        let filter = QueryFilter::<Account>::new().filter("owner", FilterOp::Lt, 1);
        assert!(filter.apply(accounts()).unwrap().is_empty());
    }

    #[test]
    fn contains_on_strings() {
        let filter = QueryFilter::<Account>::new().filter("name", FilterOp::Contains, "r");
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [2, 3, 4]);
    }

    #[test]
    fn order_is_stable_and_pages_after_sorting() {
        let filter = QueryFilter::<Account>::new()
            .order_by("balance", SortDirection::Ascending)
            .skip(1)
            .take(2);
        // 2 and 4 tie on balance; input order decides
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [4, 1]);

        let filter = QueryFilter::<Account>::new().order_by("name", SortDirection::Descending);
        assert_eq!(ids(&filter.apply(accounts()).unwrap()), [2, 3, 1, 4]);
    }

    #[test]
    fn nested_paths() {
        let record = json!({"address": {"city": "Oslo"}});
        assert_eq!(field_value(&record, "address.city"), Some(&json!("Oslo")));
        assert_eq!(field_value(&record, "address.zip"), None);
        assert_eq!(field_value(&record, "address.city.name"), None);
    }

    #[test]
    fn sorting_puts_nulls_last() {
        assert_eq!(compare_values(&json!(null), &json!(1)), Ordering::Greater);
        assert_eq!(compare_values(&json!(1), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!(true)), Ordering::Less);
    }

    #[test]
    fn large_integers_compare_exactly() {
        let big = 9_007_199_254_740_992_i64;
        let items = vec![Account::new(1, "a", big + 1), Account::new(2, "b", big)];

        let filter = QueryFilter::<Account>::new().where_eq("balance", big);
        assert_eq!(ids(&filter.apply(items.clone()).unwrap()), [2]);

        let filter = QueryFilter::<Account>::new().filter("balance", FilterOp::Gt, big);
        assert_eq!(ids(&filter.apply(items.clone()).unwrap()), [1]);

        let filter = QueryFilter::<Account>::new().order_by("balance", SortDirection::Ascending);
        assert_eq!(ids(&filter.apply(items).unwrap()), [2, 1]);
    }

    #[test]
    fn mixed_integer_kinds_order() {
        assert_eq!(compare_values(&json!(-1), &json!(u64::MAX)), Ordering::Less);
        assert_eq!(compare_values(&json!(u64::MAX), &json!(i64::MAX)), Ordering::Greater);
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Ordering::Less);
        assert!(values_equal(&json!(3), &json!(3.0)));
    }

    #[test]
    fn matches_single_entity() {
        let filter = QueryFilter::<Account>::new().where_eq("name", "ops");
        assert!(filter.matches(&Account::new(9, "ops", 0)).unwrap());
        assert!(!filter.matches(&Account::new(9, "dev", 0)).unwrap());
    }

    #[test]
    fn validate_rejects_non_scalar_operands() {
        let filter = QueryFilter::<Account>::new().filter("balance", FilterOp::Gt, json!([1]));
        assert!(matches!(
            filter.validate(),
            Err(RepositoryError::InvalidFilter(_))
        ));

        let filter = QueryFilter::<Account>::new().filter("name", FilterOp::StartsWith, 1);
        assert!(filter.validate().is_err());

        assert!(QueryFilter::<Account>::new()
            .where_eq("name", "ops")
            .validate()
            .is_ok());
    }

    #[test]
    fn filter_serializes_for_delegation() {
        let filter = QueryFilter::<Account>::new().where_eq("name", "ops").take(5);
        let encoded = serde_json::to_value(&filter).unwrap();
        let decoded: QueryFilter<Account> = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, filter);
    }
}
