use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PrimaryKeyToColumn,
};

use crate::key::PrimaryKey;

/// How a persisted field reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain column value (integers, strings, timestamps, ...).
    Scalar,
    /// Single relationship reference, persisted through its foreign-key
    /// column.
    SingleReference,
    /// Collection relationship, persisted through
    /// [`CrudModel::save_collection`].
    CollectionReference,
}

/// Static classification of one persisted field, computed once per entity
/// type instead of discovered by trial and error at runtime.
///
/// Fields without a descriptor are not persisted and are never written by
/// the engine.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    #[must_use]
    pub const fn reference(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::SingleReference,
        }
    }

    #[must_use]
    pub const fn collection(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::CollectionReference,
        }
    }
}

/// Capability set an entity type implements to be driven by
/// [`Crud`](crate::Crud).
///
/// An implementor is a read/write view over one mapped table: it knows its
/// composite primary key, can have store-generated key fields cleared and
/// reassigned, and declares which of its fields are persisted and how. Two
/// entities are the same identity iff their [`PrimaryKey`]s are equal under
/// set equality.
#[async_trait]
pub trait CrudModel: Clone + Send + Sync + Sized + 'static
where
    Self: From<<Self::Entity as EntityTrait>::Model> + IntoActiveModel<Self::ActiveModel>,
    <Self::Entity as EntityTrait>::Model: Send + Sync + IntoActiveModel<Self::ActiveModel>,
    <Self::Entity as EntityTrait>::PrimaryKey:
        PrimaryKeyToColumn<Column = <Self::Entity as EntityTrait>::Column>,
{
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send + Sync;

    /// Singular name used in error messages.
    const ENTITY_NAME: &'static str;

    /// Current primary key. Cardinality and field names are fixed per type.
    fn primary_key(&self) -> PrimaryKey;

    /// Overwrite the primary key, e.g. with store-assigned values after an
    /// auto-increment insert.
    fn set_primary_key(&mut self, key: PrimaryKey);

    /// Clear store-generated key fields so the backing store assigns fresh
    /// values on insert. No-op for types whose keys are always
    /// caller-supplied.
    fn clear_auto_increment_key(&mut self);

    /// Persisted-field descriptor table for this type.
    fn fields() -> &'static [FieldDescriptor];

    /// Replace the stored rows behind a collection field.
    ///
    /// Invoked once per [`FieldKind::CollectionReference`] descriptor,
    /// inside the surrounding write transaction. The default does nothing.
    async fn save_collection<C>(&self, db: &C, field: &'static str) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        let _ = (db, field);
        Ok(())
    }
}

/// Optional eager-load projection installed at engine construction.
///
/// When present, every read passes through [`EagerLoad::load`] so
/// relationship fields come back resolved. Without a loader they stay in
/// whatever unresolved state [`From`]-conversion from the raw model leaves
/// them in.
#[async_trait]
pub trait EagerLoad<T>: Send + Sync {
    async fn load(&self, db: &DatabaseConnection, entities: Vec<T>) -> Result<Vec<T>, DbErr>;
}
