use indexmap::IndexMap;

use ento_core::Value;
use ento_expr::Expr;

use crate::extension::{Extension, ReferentialAction};
use crate::field::Field;
use crate::relation::Relation;
use crate::trigger::Trigger;
use crate::virtual_attr::VirtualAttribute;

/// A seed row declared via `__fix_entries__` (§4.4 item 4, Glossary: "Fix
/// entry"). Keyed by column name so the sync differ can match rows by
/// primary key across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FixEntry {
    pub values: IndexMap<String, Value>,
}

impl FixEntry {
    pub fn new(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        FixEntry {
            values: values.into_iter().collect(),
        }
    }
}

/// `polymorph`/`polymorph_id` configuration (§3.3). A base declares
/// `discriminator_column`; descendants declare `discriminator_value`
/// (§4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum PolymorphRole {
    /// This entity is the polymorph base: owns `discriminator_column`.
    Base { discriminator_column: String },
    /// This entity is a descendant of `parent`, tagged `discriminator_value`
    /// in the base's discriminator column.
    Descendant {
        parent: String,
        discriminator_value: Value,
    },
}

/// A composite constraint produced by grouping extensions that share a
/// `name`/`group` across fields of the same entity (§3 "Extensions").
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub reference_entity: String,
    pub reference_columns: Vec<String>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeUnique {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeCheck {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub exprs: Vec<Expr>,
}

/// Whether an entity owns a PostgreSQL table. Composite/Json nested
/// entities and `_root` mixin bases carry a flag rather than a subclass
/// (§9 Design Notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOwnership {
    /// A normal entity: owns exactly one table.
    Owned,
    /// A `Composite<T>`/`Json<T>` nested schema: participates in the
    /// dependency list but never gets its own `CREATE TABLE`.
    Virtual,
    /// A `_root` mixin base: contributes fields to descendants, has no
    /// table of its own.
    MixinRoot,
}

/// An entity type (§3): a declarative schema binding a qualified name to an
/// ordered, deduplicated sequence of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
    pub ownership: TableOwnership,
    pub fields: Vec<Field>,
    pub relations: Vec<Relation>,
    pub virtuals: Vec<VirtualAttribute>,
    pub polymorph: Option<PolymorphRole>,
    pub fix_entries: Vec<FixEntry>,
    pub owned_sequences: Vec<String>,
    pub composite_foreign_keys: Vec<CompositeForeignKey>,
    pub composite_uniques: Vec<CompositeUnique>,
    pub composite_checks: Vec<CompositeCheck>,
    pub triggers: Vec<Trigger>,
}

impl Entity {
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// The name this entity is addressed by in expressions and joins: its
    /// alias if one was assigned via `E.alias("name")`, otherwise its own
    /// name (§4.3 "Aliasing").
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn field_by_key(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn relation_by_key(&self, key: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.key == key)
    }

    pub fn virtual_by_key(&self, key: &str) -> Option<&VirtualAttribute> {
        self.virtuals.iter().find(|v| v.key == key)
    }

    /// Fields carrying `PrimaryKey`, in declaration order (§8: "Composite PK
    /// with N fields compiles `PRIMARY KEY("f1", …, "fN")` in declaration
    /// order").
    pub fn primary_key_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_primary_key()).collect()
    }

    pub fn storable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.implementation.is_storable_column())
    }

    pub fn always_loaded_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| r.is_always_loaded())
    }

    pub fn is_polymorph_base(&self) -> bool {
        matches!(self.polymorph, Some(PolymorphRole::Base { .. }))
    }

    pub fn is_polymorph_descendant(&self) -> bool {
        matches!(self.polymorph, Some(PolymorphRole::Descendant { .. }))
    }

    pub fn polymorph_parent_name(&self) -> Option<&str> {
        match &self.polymorph {
            Some(PolymorphRole::Descendant { parent, .. }) => Some(parent),
            _ => None,
        }
    }

    /// Produce an alias proxy sharing the same fields but addressed under a
    /// distinct name; all field references through the alias carry the
    /// alias in compiled SQL (§4.3 "Aliasing").
    pub fn with_alias(&self, alias: impl Into<String>) -> Entity {
        let mut aliased = self.clone();
        aliased.alias = Some(alias.into());
        aliased
    }
}

/// A non-entity base contributing fields to every concrete entity that
/// inherits it. Fields are re-bound per-entity, not shared (§4.3 "Mixins").
#[derive(Debug, Clone, Default)]
pub struct Mixin {
    pub fields: Vec<Field>,
    pub relations: Vec<Relation>,
}

impl Mixin {
    pub fn new() -> Self {
        Mixin::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }
}

/// Builds an [`Entity`] across the collection phase (§4.3 step 1):
/// accumulate declared attributes (including mixin-contributed ones),
/// assign each an `_index_`, dedup by key keeping the first declaration.
/// Extension binding (step 2) and dependency computation (step 3) happen
/// when the entity is added to a [`Registry`](crate::Registry).
pub struct EntityBuilder {
    schema: Option<String>,
    name: String,
    ownership: TableOwnership,
    fields: Vec<Field>,
    relations: Vec<Relation>,
    virtuals: Vec<VirtualAttribute>,
    polymorph: Option<PolymorphRole>,
    fix_entries: Vec<FixEntry>,
    triggers: Vec<Trigger>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        EntityBuilder {
            schema: None,
            name: name.into(),
            ownership: TableOwnership::Owned,
            fields: Vec::new(),
            relations: Vec::new(),
            virtuals: Vec::new(),
            polymorph: None,
            fix_entries: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn ownership(mut self, ownership: TableOwnership) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn virtual_attr(mut self, attr: VirtualAttribute) -> Self {
        self.virtuals.push(attr);
        self
    }

    pub fn polymorph_base(mut self, discriminator_column: impl Into<String>) -> Self {
        self.polymorph = Some(PolymorphRole::Base {
            discriminator_column: discriminator_column.into(),
        });
        self
    }

    pub fn polymorph_descendant(mut self, parent: impl Into<String>, discriminator_value: Value) -> Self {
        self.polymorph = Some(PolymorphRole::Descendant {
            parent: parent.into(),
            discriminator_value,
        });
        self
    }

    pub fn fix_entries(mut self, entries: Vec<FixEntry>) -> Self {
        self.fix_entries = entries;
        self
    }

    /// Pull in a mixin's fields/relations, re-binding them to this entity
    /// (mixin fields are appended before this builder's own, matching
    /// declaration order for a base-then-own layout).
    pub fn mixin(mut self, mixin: &Mixin) -> Self {
        let mut fields = mixin.fields.clone();
        fields.append(&mut self.fields);
        self.fields = fields;

        let mut relations = mixin.relations.clone();
        relations.append(&mut self.relations);
        self.relations = relations;
        self
    }

    pub fn build(mut self) -> Entity {
        let mut seen = std::collections::HashSet::new();
        self.fields.retain(|f| seen.insert(f.key.clone()));
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.index = i;
        }

        let mut seen = std::collections::HashSet::new();
        self.relations.retain(|r| seen.insert(r.key.clone()));
        for (i, relation) in self.relations.iter_mut().enumerate() {
            relation.index = i;
        }

        let mut seen = std::collections::HashSet::new();
        self.virtuals.retain(|v| seen.insert(v.key.clone()));
        for (i, attr) in self.virtuals.iter_mut().enumerate() {
            attr.index = i;
        }

        Entity {
            schema: self.schema,
            name: self.name,
            alias: None,
            ownership: self.ownership,
            fields: self.fields,
            relations: self.relations,
            virtuals: self.virtuals,
            polymorph: self.polymorph,
            fix_entries: self.fix_entries,
            owned_sequences: Vec::new(),
            composite_foreign_keys: Vec::new(),
            composite_uniques: Vec::new(),
            composite_checks: Vec::new(),
            triggers: self.triggers,
        }
    }
}
