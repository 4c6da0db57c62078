//! Model declarations: which fields are filterable, which operators each field accepts, and how
//! relations connect models (including polymorphic ones).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ast::Literal;
use crate::error::{SchemaError, StorageError};
use crate::query::FilterQuery;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllowedOperators {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl AllowedOperators {
    pub fn only<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedOperators::Only(tokens.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, token: &str) -> bool {
        match self {
            AllowedOperators::All => true,
            AllowedOperators::Only(tokens) => tokens.contains(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Stored column; differs from the field name for renamed fields.
    pub column: String,
    #[serde(default)]
    pub operators: AllowedOperators,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    /// This model holds `foreign_key`, pointing at `owner_key` on the target.
    BelongsTo { target: String, foreign_key: String, owner_key: String },
    /// The target holds `foreign_key`, pointing at `local_key` on this model.
    HasMany { target: String, foreign_key: String, local_key: String },
    /// Inverse side of a polymorphic relation: the target holds `type_column` / `id_column`, and rows
    /// belong to this model when `type_column` carries this model's marker.
    MorphMany { target: String, type_column: String, id_column: String, local_key: String },
    /// This model holds `type_column` / `id_column`; the target model varies per row.
    MorphTo { type_column: String, id_column: String, candidates: Vec<String> },
}

impl Relation {
    pub fn belongs_to(target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::BelongsTo { target: target.into(), foreign_key: foreign_key.into(), owner_key: "id".into() }
    }

    pub fn has_many(target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::HasMany { target: target.into(), foreign_key: foreign_key.into(), local_key: "id".into() }
    }

    /// `name` is the morph name; columns default to `{name}_type` / `{name}_id`.
    pub fn morph_many(target: impl Into<String>, name: &str) -> Self {
        Relation::MorphMany { target: target.into(), type_column: format!("{name}_type"), id_column: format!("{name}_id"), local_key: "id".into() }
    }

    /// Columns default to `{name}_type` / `{name}_id`.
    pub fn morph_to<I, S>(name: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Relation::MorphTo {
            type_column: format!("{name}_type"),
            id_column: format!("{name}_id"),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_polymorphic(&self) -> bool { matches!(self, Relation::MorphTo { .. }) }

    /// Models this relation may point at.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Relation::BelongsTo { target, .. } | Relation::HasMany { target, .. } | Relation::MorphMany { target, .. } => vec![target.as_str()],
            Relation::MorphTo { candidates, .. } => candidates.iter().map(String::as_str).collect(),
        }
    }
}

/// Schema view of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    name: String,
    table: String,
    #[serde(default = "default_primary_key")]
    primary_key: String,
    #[serde(default)]
    fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    relations: BTreeMap<String, Relation>,
}

fn default_primary_key() -> String { "id".to_string() }

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self { name: name.into(), table: table.into(), primary_key: default_primary_key(), fields: BTreeMap::new(), relations: BTreeMap::new() }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Filterable with every operator.
    pub fn field(self, name: &str) -> Self { self.field_spec(name, FieldSpec { column: name.to_string(), operators: AllowedOperators::All }) }

    /// Filterable with the listed operators only.
    pub fn restricted<I, S>(self, name: &str, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_spec(name, FieldSpec { column: name.to_string(), operators: AllowedOperators::only(operators) })
    }

    /// Exposes `column` to filters under the name `name`.
    pub fn renamed(mut self, name: &str, column: &str) -> Self {
        let operators = self.fields.remove(name).map(|spec| spec.operators).unwrap_or_default();
        self.field_spec(name, FieldSpec { column: column.to_string(), operators })
    }

    pub fn field_spec(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_string(), spec);
        self
    }

    pub fn relation(mut self, name: &str, relation: Relation) -> Self {
        self.relations.insert(name.to_string(), relation);
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn table(&self) -> &str { &self.table }

    pub fn key(&self) -> &str { &self.primary_key }

    /// Declared fields and relation names, sorted.
    pub fn filterable_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().chain(self.relations.keys()).map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn is_filterable(&self, field: &str) -> bool { self.fields.contains_key(field) || self.relations.contains_key(field) }

    /// `None` if the field is not filterable. Relations accept every operator.
    pub fn allowed_operators(&self, field: &str) -> Option<&AllowedOperators> {
        const UNRESTRICTED: &AllowedOperators = &AllowedOperators::All;
        match self.fields.get(field) {
            Some(spec) => Some(&spec.operators),
            None if self.relations.contains_key(field) => Some(UNRESTRICTED),
            None => None,
        }
    }

    /// Stored column for a filterable field.
    pub fn column<'a>(&'a self, field: &'a str) -> &'a str { self.fields.get(field).map(|spec| spec.column.as_str()).unwrap_or(field) }

    pub fn relation_named(&self, name: &str) -> Option<&Relation> { self.relations.get(name) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    models: BTreeMap<String, ModelDescriptor>,
    /// Stored type marker -> model name, for markers that differ from the model name.
    #[serde(default)]
    morph_map: BTreeMap<String, String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder { SchemaBuilder::default() }

    pub fn from_json(json: &str) -> Result<Self, SchemaLoadError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn model(&self, name: &str) -> Option<&ModelDescriptor> { self.models.get(name) }

    pub fn model_for_marker(&self, marker: &str) -> Option<&ModelDescriptor> {
        let name = self.morph_map.get(marker).map(String::as_str).unwrap_or(marker);
        self.models.get(name)
    }

    /// The type marker stored for rows of `model`.
    pub fn marker_for<'a>(&'a self, model: &'a str) -> &'a str {
        self.morph_map.iter().find(|(_, name)| name.as_str() == model).map(|(marker, _)| marker.as_str()).unwrap_or(model)
    }

    pub fn relation_targets(&self, relation: &Relation) -> Vec<&ModelDescriptor> {
        relation.targets().into_iter().filter_map(|name| self.models.get(name)).collect()
    }

    /// Concrete models currently referenced through a polymorphic relation of `owner`, found by
    /// projecting the distinct type markers stored in its type column.
    ///
    /// Markers that do not map to one of the relation's candidates are skipped.
    pub fn concrete_types(&self, owner: &ModelDescriptor, relation: &Relation, query: &dyn FilterQuery) -> Result<Vec<(String, &ModelDescriptor)>, StorageError> {
        let Relation::MorphTo { type_column, candidates, .. } = relation else {
            return Ok(self.relation_targets(relation).into_iter().map(|model| (self.marker_for(model.name()).to_string(), model)).collect());
        };

        let mut types = Vec::new();
        for marker in query.distinct_values(owner, type_column)? {
            let marker = match marker {
                Literal::String(s) => s,
                Literal::Null => continue,
                other => other.to_string(),
            };
            match self.model_for_marker(&marker) {
                Some(model) if candidates.iter().any(|c| c == model.name()) => types.push((marker, model)),
                _ => warn!(owner = owner.name(), marker = %marker, "skipping unknown morph type"),
            }
        }
        Ok(types)
    }

    /// Whether `path` (field names, outermost first) can be walked starting at `model`.
    /// Polymorphic relations end the static check.
    pub fn declares_path(&self, model: &ModelDescriptor, path: &[&str]) -> bool {
        let Some((first, rest)) = path.split_first() else { return true };
        if !model.is_filterable(first) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match model.relation_named(first) {
            None => false,
            Some(relation) if relation.is_polymorphic() => true,
            Some(relation) => self.relation_targets(relation).into_iter().any(|target| self.declares_path(target, rest)),
        }
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (key, model) in &self.models {
            if *key != model.name {
                return Err(SchemaError::NameMismatch { key: key.clone(), name: model.name.clone() });
            }
            for (name, relation) in &model.relations {
                for target in relation.targets() {
                    if !self.models.contains_key(target) {
                        return Err(SchemaError::UnknownTarget { model: model.name.clone(), relation: name.clone(), target: target.to_string() });
                    }
                }
            }
        }
        for (marker, model) in &self.morph_map {
            if !self.models.contains_key(model) {
                return Err(SchemaError::UnknownMorphModel { marker: marker.clone(), model: model.clone() });
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Default)]
pub struct SchemaBuilder {
    models: Vec<ModelDescriptor>,
    morph_map: BTreeMap<String, String>,
}

impl SchemaBuilder {
    pub fn model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    pub fn morph_marker(mut self, marker: impl Into<String>, model: impl Into<String>) -> Self {
        self.morph_map.insert(marker.into(), model.into());
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut models = BTreeMap::new();
        for model in self.models {
            if models.contains_key(&model.name) {
                return Err(SchemaError::DuplicateModel(model.name));
            }
            models.insert(model.name.clone(), model);
        }
        let schema = Schema { models, morph_map: self.morph_map };
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Schema {
        Schema::builder()
            .model(ModelDescriptor::new("post", "posts").field("title").restricted("views", ["$eq", "$gt"]).relation("author", Relation::belongs_to("user", "author_id")))
            .model(ModelDescriptor::new("video", "videos").field("url"))
            .model(ModelDescriptor::new("user", "users").field("name").renamed("email", "email_address"))
            .model(ModelDescriptor::new("comment", "comments").field("body").relation("commentable", Relation::morph_to("commentable", ["post", "video"])))
            .morph_marker("App\\Post", "post")
            .build()
            .unwrap()
    }

    #[test]
    fn test_filterable_fields_include_relations() {
        let schema = blog();
        let post = schema.model("post").unwrap();
        assert_eq!(post.filterable_fields(), vec!["author", "title", "views"]);
        assert_eq!(post.allowed_operators("author"), Some(&AllowedOperators::All));
        assert!(post.allowed_operators("views").unwrap().allows("$gt"));
        assert!(!post.allowed_operators("views").unwrap().allows("$lt"));
        assert_eq!(post.allowed_operators("missing"), None);
    }

    #[test]
    fn test_renamed_column() {
        let schema = blog();
        let user = schema.model("user").unwrap();
        assert_eq!(user.column("email"), "email_address");
        assert_eq!(user.column("name"), "name");
    }

    #[test]
    fn test_markers() {
        let schema = blog();
        assert_eq!(schema.model_for_marker("App\\Post").map(|m| m.name()), Some("post"));
        assert_eq!(schema.model_for_marker("video").map(|m| m.name()), Some("video"));
        assert_eq!(schema.marker_for("post"), "App\\Post");
        assert_eq!(schema.marker_for("video"), "video");
    }

    #[test]
    fn test_declares_path() {
        let schema = blog();
        let post = schema.model("post").unwrap();
        let video = schema.model("video").unwrap();
        assert!(schema.declares_path(post, &["title"]));
        assert!(schema.declares_path(post, &["author", "name"]));
        assert!(!schema.declares_path(post, &["author", "url"]));
        assert!(!schema.declares_path(video, &["title"]));
        assert!(!schema.declares_path(post, &["title", "name"]));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = Schema::builder().model(ModelDescriptor::new("post", "posts").relation("author", Relation::belongs_to("user", "author_id"))).build().unwrap_err();
        assert_eq!(err, SchemaError::UnknownTarget { model: "post".into(), relation: "author".into(), target: "user".into() });
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let err = Schema::builder().model(ModelDescriptor::new("post", "posts")).model(ModelDescriptor::new("post", "posts")).build().unwrap_err();
        assert_eq!(err, SchemaError::DuplicateModel("post".into()));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "models": {
                "user": { "name": "user", "table": "users", "fields": { "name": { "column": "name" } } },
                "post": {
                    "name": "post",
                    "table": "posts",
                    "fields": { "views": { "column": "view_count", "operators": { "Only": ["$eq"] } } },
                    "relations": { "author": { "kind": "belongs_to", "target": "user", "foreign_key": "author_id", "owner_key": "id" } }
                }
            }
        }"#;
        let schema = Schema::from_json(json).unwrap();
        let post = schema.model("post").unwrap();
        assert_eq!(post.key(), "id");
        assert_eq!(post.column("views"), "view_count");
        assert!(matches!(post.relation_named("author"), Some(Relation::BelongsTo { .. })));
    }

    #[test]
    fn test_model_key_must_match_name() {
        let json = r#"{ "models": { "post": { "name": "article", "table": "posts" } } }"#;
        let err = Schema::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaLoadError::Schema(SchemaError::NameMismatch { ref key, ref name }) if key == "post" && name == "article"));
        assert_eq!(err.to_string(), "model registered as `post` is named `article`");
    }
}
