use futures::future::try_join_all;
use sea_orm::sea_query::{Iden, IntoValueTuple, ValueTuple};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    TransactionTrait, Value,
};

use crate::error::{Error, Result};
use crate::key::{KeyField, PrimaryKey};
use crate::model::{CrudModel, EagerLoad, FieldKind};

/// Create/read/update/delete operations over one entity type, bound to a
/// single database session.
///
/// The engine takes no locks, performs no retries and never logs; each
/// operation's atomicity boundary is the transaction it commits. Engines
/// working the same rows concurrently serialize only through the store
/// itself.
pub struct Crud<T>
where
    T: CrudModel,
{
    db: DatabaseConnection,
    eager: Option<Box<dyn EagerLoad<T>>>,
}

impl<T> Crud<T>
where
    T: CrudModel,
    <T::Entity as EntityTrait>::Model: Send + Sync + IntoActiveModel<T::ActiveModel>,
    <T::Entity as EntityTrait>::PrimaryKey:
        PrimaryKeyToColumn<Column = <T::Entity as EntityTrait>::Column>,
{
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, eager: None }
    }

    /// Engine whose reads resolve relationship fields through `loader`.
    #[must_use]
    pub fn with_eager_load<L>(db: DatabaseConnection, loader: L) -> Self
    where
        L: EagerLoad<T> + 'static,
    {
        Self {
            db,
            eager: Some(Box::new(loader)),
        }
    }

    /// Adds entities in one atomic batch.
    ///
    /// With `auto_increment` set, each entity's generated key fields are
    /// cleared first so the store assigns fresh values; the assigned keys
    /// are written back into the returned entities. Collection fields are
    /// persisted through [`CrudModel::save_collection`] once the owning row
    /// exists. An identity collision surfaces as [`Error::DuplicateKey`]
    /// and rolls back the whole batch.
    pub async fn add(&self, auto_increment: bool, entities: Vec<T>) -> Result<Vec<T>> {
        let txn = self.db.begin().await?;
        let mut added = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if auto_increment {
                entity.clear_auto_increment_key();
            }
            let inserted = T::Entity::insert(entity.clone().into_active_model())
                .exec(&txn)
                .await
                .map_err(|err| Error::from_insert(T::ENTITY_NAME, err))?;
            if auto_increment {
                entity.set_primary_key(Self::assigned_key(inserted.last_insert_id));
            }
            for field in T::fields() {
                if field.kind == FieldKind::CollectionReference {
                    entity.save_collection(&txn, field.name).await?;
                }
            }
            added.push(entity);
        }
        txn.commit().await?;
        Ok(added)
    }

    /// Like [`Crud::add`], but a duplicate identity yields `Ok(None)`
    /// instead of an error.
    pub async fn try_add(&self, auto_increment: bool, entities: Vec<T>) -> Result<Option<Vec<T>>> {
        match self.add(auto_increment, entities).await {
            Ok(added) => Ok(Some(added)),
            Err(err) if err.is_duplicate_key() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Every entity in the table, through the eager view when one is
    /// configured.
    pub async fn get_all(&self) -> Result<Vec<T>> {
        let models = T::Entity::find().all(&self.db).await?;
        self.resolve(models.into_iter().map(T::from).collect())
            .await
    }

    /// Entities matching `predicate`, evaluated against the same source as
    /// [`Crud::get_all`].
    pub async fn get_filtered<F>(&self, predicate: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> bool + Send,
    {
        let entities = self.get_all().await?;
        Ok(entities
            .into_iter()
            .filter(|entity| predicate(entity))
            .collect())
    }

    /// The single entity whose primary key set-equals `key`.
    ///
    /// The key condition is pushed down to the store, so this is a
    /// single-record lookup rather than a full-table scan.
    pub async fn get(&self, key: &PrimaryKey) -> Result<T> {
        let not_found = || Error::NotFound {
            entity: T::ENTITY_NAME,
            key: key.clone(),
        };
        let model = T::Entity::find()
            .filter(Self::key_condition(key)?)
            .one(&self.db)
            .await?
            .ok_or_else(not_found)?;
        let mut entities = self.resolve(vec![T::from(model)]).await?;
        entities.pop().ok_or_else(not_found)
    }

    /// Like [`Crud::get`], but a missing key yields `Ok(None)`.
    pub async fn try_get(&self, key: &PrimaryKey) -> Result<Option<T>> {
        match self.get(key).await {
            Ok(entity) => Ok(Some(entity)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves each key concurrently; results come back in input order.
    ///
    /// All-or-nothing: if any key is missing the whole batch fails with
    /// [`Error::NotFound`], no partial result.
    pub async fn get_many(&self, keys: &[PrimaryKey]) -> Result<Vec<T>> {
        try_join_all(keys.iter().map(|key| self.get(key))).await
    }

    /// Like [`Crud::get_many`], but a missing key yields `Ok(None)` for the
    /// entire batch.
    pub async fn try_get_many(&self, keys: &[PrimaryKey]) -> Result<Option<Vec<T>>> {
        match self.get_many(keys).await {
            Ok(entities) => Ok(Some(entities)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Updates the stored entity identified by `entity`'s primary key.
    ///
    /// Every descriptor-listed field is written: scalar and
    /// single-reference fields through their columns, collections through
    /// [`CrudModel::save_collection`]. Fields without a descriptor are
    /// skipped. After the commit the entity is re-fetched by key so the
    /// caller observes the store-normalized state, not merely the input.
    pub async fn update(&self, entity: T) -> Result<T> {
        let key = entity.primary_key();
        let condition = Self::key_condition(&key)?;
        let txn = self.db.begin().await?;
        let current = T::Entity::find()
            .filter(condition)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: T::ENTITY_NAME,
                key: key.clone(),
            })?;
        let mut tracked = current.into_active_model();
        let incoming = entity.clone().into_active_model();
        for field in T::fields() {
            match field.kind {
                FieldKind::Scalar | FieldKind::SingleReference => {
                    let column = Self::column(field.name)?;
                    if let ActiveValue::Set(value) = incoming.get(column) {
                        tracked.set(column, value);
                    }
                }
                FieldKind::CollectionReference => {}
            }
        }
        tracked.update(&txn).await?;
        for field in T::fields() {
            if field.kind == FieldKind::CollectionReference {
                entity.save_collection(&txn, field.name).await?;
            }
        }
        txn.commit().await?;
        self.get(&key).await
    }

    /// Concurrent independent single-entity updates; results in input
    /// order.
    ///
    /// No cross-entity atomicity: entities whose updates committed stay
    /// committed even if a later one fails.
    pub async fn update_many(&self, entities: Vec<T>) -> Result<Vec<T>> {
        try_join_all(entities.into_iter().map(|entity| self.update(entity))).await
    }

    /// Deletes the entities behind `keys`.
    ///
    /// All keys are resolved before any mutation is staged; a missing key,
    /// a failed lookup or a failed commit all yield `false`. `true` is
    /// reported only when the commit succeeded.
    pub async fn delete(&self, keys: &[PrimaryKey]) -> bool {
        let Ok(Some(entities)) = self.try_get_many(keys).await else {
            return false;
        };
        self.remove_all(&entities).await.is_ok()
    }

    async fn remove_all(&self, entities: &[T]) -> Result<()> {
        // An empty OR-set would render as an unfiltered DELETE.
        if entities.is_empty() {
            return Ok(());
        }
        let mut matched = Condition::any();
        for entity in entities {
            matched = matched.add(Self::key_condition(&entity.primary_key())?);
        }
        let txn = self.db.begin().await?;
        T::Entity::delete_many().filter(matched).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn resolve(&self, entities: Vec<T>) -> Result<Vec<T>> {
        match &self.eager {
            Some(loader) => Ok(loader.load(&self.db, entities).await?),
            None => Ok(entities),
        }
    }

    /// Column condition matching every component of `key`.
    fn key_condition(key: &PrimaryKey) -> Result<Condition> {
        // An empty key would render as an unfiltered condition; treat it as
        // unmatchable instead.
        if key.is_empty() {
            return Err(Error::NotFound {
                entity: T::ENTITY_NAME,
                key: key.clone(),
            });
        }
        let mut condition = Condition::all();
        for field in key.fields() {
            let column = Self::column(field.name())?;
            condition = condition.add(column.eq(field.value().clone()));
        }
        Ok(condition)
    }

    fn column(name: &str) -> Result<<T::Entity as EntityTrait>::Column> {
        <T::Entity as EntityTrait>::Column::iter()
            .find(|column| column.as_str() == name)
            .ok_or_else(|| Error::UnknownField {
                entity: T::ENTITY_NAME,
                field: name.to_owned(),
            })
    }

    /// Primary key assigned by the store for an insert, rebuilt from the
    /// mapper's last-insert id.
    fn assigned_key(
        id: <<T::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType,
    ) -> PrimaryKey {
        let values: Vec<Value> = match id.into_value_tuple() {
            ValueTuple::One(a) => vec![a],
            ValueTuple::Two(a, b) => vec![a, b],
            ValueTuple::Three(a, b, c) => vec![a, b, c],
            ValueTuple::Many(values) => values,
        };
        <T::Entity as EntityTrait>::PrimaryKey::iter()
            .map(|pk| Iden::to_string(&pk.into_column()))
            .zip(values)
            .map(|(name, value)| KeyField::new(name, value))
            .collect()
    }
}
