//! Per-type declaration accumulator.
//!
//! A builder only holds the facts declared against its own type. Every
//! concern is an independent write slot, so declarations commute: the table
//! name, the id marking, each property's column / join column / many-to-one
//! target, each one-to-many relation and each callback.

use crate::error::{Error, Result};
use crate::metadata::{
    EntityCallback, EntityField, EntityFieldType, EntityMetadata, EntityRelationManyToOne,
    EntityRelationOneToMany, EntityType,
};

/// Lifecycle of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Entry exists but nothing has been declared yet.
    Uninitialized,
    /// At least one declaration has been applied.
    Building,
    /// Metadata has been served; the entry is frozen.
    Served,
}

/// Join column declared on a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JoinColumn {
    pub name: String,
    pub nullable: bool,
}

/// Independent slots for one property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PropertySlot {
    pub column: Option<String>,
    pub nullable: Option<bool>,
    pub join_column: Option<JoinColumn>,
    pub many_to_one: Option<EntityType>,
}

impl PropertySlot {
    /// Overlay `other` on top of `self`, slot by slot.
    fn overlay(&mut self, other: &PropertySlot) {
        if other.column.is_some() {
            self.column = other.column.clone();
        }
        if other.nullable.is_some() {
            self.nullable = other.nullable;
        }
        if other.join_column.is_some() {
            self.join_column = other.join_column.clone();
        }
        if other.many_to_one.is_some() {
            self.many_to_one = other.many_to_one;
        }
    }

    fn to_field(&self, entity: EntityType, property_name: &str) -> Result<EntityField> {
        let (column_name, nullable) = match (&self.join_column, &self.column) {
            (Some(join), _) => (join.name.clone(), join.nullable),
            (None, Some(column)) => (column.clone(), self.nullable.unwrap_or(true)),
            (None, None) => {
                return Err(Error::invalid(
                    entity.short_name(),
                    format!("property {property_name} has no column or join column"),
                ))
            }
        };
        let field_type = if self.many_to_one.is_some() {
            EntityFieldType::JoinedEntity
        } else {
            EntityFieldType::Regular
        };

        Ok(EntityField {
            property_name: property_name.to_string(),
            column_name,
            nullable,
            field_type,
        })
    }
}

/// The facts declared against one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Declarations {
    pub parent: Option<EntityType>,
    pub table_name: Option<String>,
    pub id_property_name: Option<String>,
    /// Property slots in first-declaration order.
    pub properties: Vec<(String, PropertySlot)>,
    pub one_to_many: Vec<EntityRelationOneToMany>,
    pub callbacks: Vec<EntityCallback>,
}

impl Declarations {
    fn slot_mut(&mut self, property_name: &str) -> &mut PropertySlot {
        let index = match self
            .properties
            .iter()
            .position(|(name, _)| name == property_name)
        {
            Some(index) => index,
            None => {
                self.properties
                    .push((property_name.to_string(), PropertySlot::default()));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index].1
    }
}

/// Mutable registry entry for one entity type.
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    entity_type: EntityType,
    state: BuilderState,
    registered: bool,
    pub(crate) declarations: Declarations,
}

impl EntityBuilder {
    pub(crate) fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            state: BuilderState::Uninitialized,
            registered: false,
            declarations: Declarations::default(),
        }
    }

    /// Type this builder accumulates declarations for.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Table name declared on this type itself (not inherited).
    pub fn own_table_name(&self) -> Option<&str> {
        self.declarations.table_name.as_deref()
    }

    /// Declared parent type.
    pub fn parent(&self) -> Option<EntityType> {
        self.declarations.parent
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.registered
    }

    pub(crate) fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    pub(crate) fn mark_building(&mut self) {
        if self.state == BuilderState::Uninitialized {
            self.state = BuilderState::Building;
        }
    }

    pub(crate) fn mark_served(&mut self) {
        self.state = BuilderState::Served;
    }

    fn entity_name(&self) -> &'static str {
        self.entity_type.short_name()
    }

    pub(crate) fn set_parent(&mut self, parent: EntityType) -> Result<()> {
        if parent == self.entity_type {
            return Err(Error::InheritanceCycle {
                entity: self.entity_name().to_string(),
            });
        }
        match self.declarations.parent {
            Some(existing) if existing != parent => Err(Error::invalid(
                self.entity_name(),
                format!("already extends {existing}, cannot also extend {parent}"),
            )),
            _ => {
                self.declarations.parent = Some(parent);
                Ok(())
            }
        }
    }

    pub(crate) fn set_table(&mut self, table_name: &str) -> Result<()> {
        match self.declarations.table_name.as_deref() {
            Some(existing) if existing != table_name => Err(Error::invalid(
                self.entity_name(),
                format!("already bound to table {existing}, cannot bind to {table_name}"),
            )),
            _ => {
                self.declarations.table_name = Some(table_name.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn bind_column(
        &mut self,
        property_name: &str,
        column_name: &str,
        nullable: Option<bool>,
    ) {
        let slot = self.declarations.slot_mut(property_name);
        slot.column = Some(column_name.to_string());
        if nullable.is_some() {
            slot.nullable = nullable;
        }
    }

    pub(crate) fn mark_id(&mut self, property_name: &str) -> Result<()> {
        match self.declarations.id_property_name.as_deref() {
            Some(existing) if existing != property_name => Err(Error::DuplicatePrimaryKey {
                entity: self.entity_name().to_string(),
                existing: existing.to_string(),
                requested: property_name.to_string(),
            }),
            _ => {
                self.declarations.id_property_name = Some(property_name.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn add_one_to_many(&mut self, relation: EntityRelationOneToMany) {
        let relations = &mut self.declarations.one_to_many;
        match relations
            .iter_mut()
            .find(|r| r.property_name == relation.property_name)
        {
            Some(existing) => *existing = relation,
            None => relations.push(relation),
        }
    }

    pub(crate) fn set_many_to_one(&mut self, property_name: &str, related: EntityType) {
        self.declarations.slot_mut(property_name).many_to_one = Some(related);
    }

    pub(crate) fn set_join_column(&mut self, property_name: &str, column_name: &str, nullable: bool) {
        self.declarations.slot_mut(property_name).join_column = Some(JoinColumn {
            name: column_name.to_string(),
            nullable,
        });
    }

    pub(crate) fn add_callback(&mut self, callback: EntityCallback) {
        if !self.declarations.callbacks.contains(&callback) {
            self.declarations.callbacks.push(callback);
        }
    }
}

/// Merge a chain of builders, most distant ancestor first, into the served
/// metadata of the last one.
pub(crate) fn merge_chain(chain: &[EntityBuilder]) -> Result<EntityMetadata> {
    let concrete = match chain.last() {
        Some(builder) => builder.entity_type,
        None => return Err(Error::invalid("<unknown>", "empty inheritance chain")),
    };
    let name = concrete.short_name();

    let mut merged = Declarations::default();
    for builder in chain {
        let own = &builder.declarations;
        if own.table_name.is_some() {
            merged.table_name = own.table_name.clone();
        }
        if own.id_property_name.is_some() {
            merged.id_property_name = own.id_property_name.clone();
        }
        for (property_name, slot) in &own.properties {
            merged.slot_mut(property_name).overlay(slot);
        }
        for relation in &own.one_to_many {
            match merged
                .one_to_many
                .iter_mut()
                .find(|r| r.property_name == relation.property_name)
            {
                Some(existing) => *existing = relation.clone(),
                None => merged.one_to_many.push(relation.clone()),
            }
        }
        for callback in &own.callbacks {
            if !merged.callbacks.contains(callback) {
                merged.callbacks.push(callback.clone());
            }
        }
    }

    let table_name = merged
        .table_name
        .ok_or_else(|| Error::invalid(name, "no table name declared"))?;

    let mut metadata = EntityMetadata::new(concrete, table_name);
    for (property_name, slot) in &merged.properties {
        let field = slot.to_field(concrete, property_name)?;
        if let Some(related) = slot.many_to_one {
            metadata
                .many_to_one_relations
                .push(EntityRelationManyToOne::new(property_name.clone(), related));
        }
        metadata.fields.push(field);
    }

    if let Some(id) = &merged.id_property_name {
        if metadata.get_field(id).is_none() {
            return Err(Error::invalid(
                name,
                format!("id property {id} is not mapped to a column"),
            ));
        }
    }
    for relation in &merged.one_to_many {
        if metadata.get_field(&relation.property_name).is_some() {
            return Err(Error::invalid(
                name,
                format!(
                    "property {} cannot be both a column and a one-to-many relation",
                    relation.property_name
                ),
            ));
        }
    }

    metadata.id_property_name = merged.id_property_name;
    metadata.one_to_many_relations = merged.one_to_many;
    metadata.callbacks = merged.callbacks;
    Ok(metadata)
}
