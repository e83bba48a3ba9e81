//! Hierarchy assembler
//!
//! Builds a two-level parent/children view of a self-referencing
//! collection: root rows are fetched first, then each root gets its
//! children fetched by one query of their own and attached under a named
//! field. Grandchildren are never fetched.

use crate::db::DataSource;
use crate::models::{Filter, Row};
use serde_json::Value;

/// How root rows are recognised
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RootPolicy {
    /// The child link field is null, absent or empty
    #[default]
    EmptyLink,
    /// The parent id field equals 0
    ZeroParent,
    /// The child link field equals 0
    ZeroLink,
    /// Caller-supplied root filter
    Custom(Filter),
}

/// What to do when fetching one root's children fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildFetchErrorPolicy {
    /// Abort the whole walk
    #[default]
    Propagate,
    /// Log the failure and attach an empty child list
    TreatAsEmpty,
}

/// Error types for hierarchy assembly
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// The query names an empty collection or field
    #[error("Invalid hierarchy query: {0}")]
    InvalidQuery(String),

    /// A root row lacks the value its children point at
    #[error("Root row has no value for parent id field '{field}'")]
    MissingParentId { field: String },

    /// The data source failed
    #[error(transparent)]
    DataSource(#[from] anyhow::Error),
}

/// Description of one parent/children walk
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyQuery {
    /// Collection holding both roots and children
    pub collection: String,
    /// Field injected into each root row with its children
    pub child_field: String,
    /// Field of a root row identifying it
    pub parent_id_field: String,
    /// Field of a child row referencing its parent's id
    pub child_parent_id_field: String,
    pub root_policy: RootPolicy,
    pub on_child_error: ChildFetchErrorPolicy,
}

impl HierarchyQuery {
    pub fn new(
        collection: impl Into<String>,
        child_field: impl Into<String>,
        parent_id_field: impl Into<String>,
        child_parent_id_field: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            child_field: child_field.into(),
            parent_id_field: parent_id_field.into(),
            child_parent_id_field: child_parent_id_field.into(),
            root_policy: RootPolicy::default(),
            on_child_error: ChildFetchErrorPolicy::default(),
        }
    }

    /// Set the root selection policy
    pub fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.root_policy = policy;
        self
    }

    /// Set the child fetch error policy
    pub fn with_child_error_policy(mut self, policy: ChildFetchErrorPolicy) -> Self {
        self.on_child_error = policy;
        self
    }

    /// Filter selecting the root rows
    pub fn root_filter(&self) -> Filter {
        match &self.root_policy {
            RootPolicy::EmptyLink => Filter::null_or_empty(self.child_parent_id_field.clone()),
            RootPolicy::ZeroParent => Filter::eq(self.parent_id_field.clone(), 0),
            RootPolicy::ZeroLink => Filter::eq(self.child_parent_id_field.clone(), 0),
            RootPolicy::Custom(filter) => filter.clone(),
        }
    }

    fn validate(&self) -> Result<(), HierarchyError> {
        let fields = [
            ("collection", &self.collection),
            ("child_field", &self.child_field),
            ("parent_id_field", &self.parent_id_field),
            ("child_parent_id_field", &self.child_parent_id_field),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(HierarchyError::InvalidQuery(format!("{} is empty", name)));
            }
        }
        Ok(())
    }
}

/// Fetch the roots, then attach each root's children under `child_field`.
///
/// Roots keep the order the data source returned them in. A failing root
/// query always aborts; a failing child query follows `on_child_error`.
pub async fn assemble_hierarchy<S>(
    source: &S,
    query: &HierarchyQuery,
) -> Result<Vec<Row>, HierarchyError>
where
    S: DataSource + ?Sized,
{
    query.validate()?;

    let mut roots = source
        .fetch_all(&query.collection, &query.root_filter())
        .await?;

    for root in roots.iter_mut() {
        let children = fetch_children(source, query, root).await?;
        root.insert(
            query.child_field.clone(),
            Value::Array(children.into_iter().map(Value::Object).collect()),
        );
    }

    Ok(roots)
}

async fn fetch_children<S>(
    source: &S,
    query: &HierarchyQuery,
    root: &Row,
) -> Result<Vec<Row>, HierarchyError>
where
    S: DataSource + ?Sized,
{
    let parent_id = match root.get(&query.parent_id_field) {
        Some(value) if !value.is_null() => value.clone(),
        _ => {
            return match query.on_child_error {
                ChildFetchErrorPolicy::Propagate => Err(HierarchyError::MissingParentId {
                    field: query.parent_id_field.clone(),
                }),
                ChildFetchErrorPolicy::TreatAsEmpty => {
                    tracing::warn!(
                        "Root row in {} has no {}; attaching no children",
                        query.collection,
                        query.parent_id_field
                    );
                    Ok(Vec::new())
                }
            };
        }
    };

    let filter = Filter::eq(query.child_parent_id_field.clone(), parent_id.clone());
    match source.fetch_all(&query.collection, &filter).await {
        Ok(children) => Ok(children),
        Err(e) => match query.on_child_error {
            ChildFetchErrorPolicy::Propagate => Err(HierarchyError::DataSource(e)),
            ChildFetchErrorPolicy::TreatAsEmpty => {
                tracing::warn!(
                    "Failed to fetch children of {} {} in {}: {}",
                    query.parent_id_field,
                    parent_id,
                    query.collection,
                    e
                );
                Ok(Vec::new())
            }
        },
    }
}

/// Roots are rows whose `child_parent_id_field` is null or empty
pub async fn assemble_by_empty_link<S>(
    source: &S,
    collection: &str,
    child_field: &str,
    parent_id_field: &str,
    child_parent_id_field: &str,
) -> Result<Vec<Row>, HierarchyError>
where
    S: DataSource + ?Sized,
{
    let query = HierarchyQuery::new(collection, child_field, parent_id_field, child_parent_id_field)
        .with_root_policy(RootPolicy::EmptyLink);
    assemble_hierarchy(source, &query).await
}

/// Roots are rows whose `parent_id_field` is 0; their children are the
/// rows whose `child_parent_id_field` is 0 as well
pub async fn assemble_by_zero_parent<S>(
    source: &S,
    collection: &str,
    child_field: &str,
    parent_id_field: &str,
    child_parent_id_field: &str,
) -> Result<Vec<Row>, HierarchyError>
where
    S: DataSource + ?Sized,
{
    let query = HierarchyQuery::new(collection, child_field, parent_id_field, child_parent_id_field)
        .with_root_policy(RootPolicy::ZeroParent);
    assemble_hierarchy(source, &query).await
}
