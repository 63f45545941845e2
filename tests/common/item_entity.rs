use async_trait::async_trait;
// The derived entity brings its own `PrimaryKey` enum into this module, so
// the engine's key type comes in under an alias.
use crudkit::{CrudModel, EagerLoad, FieldDescriptor, PrimaryKey as CrudKey};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, DbErr, IntoActiveModel, QueryOrder, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub other_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::other_entity::Entity",
        from = "Column::OtherId",
        to = "super::other_entity::Column::Id"
    )]
    Other,
    #[sea_orm(has_many = "super::tag_entity::Entity")]
    Tags,
}

impl Related<super::other_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Other.def()
    }
}

impl Related<super::tag_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Read/write view over `items`.
///
/// `other` and `tags` stay unresolved unless the engine is built with
/// [`ItemEagerLoad`]; `tags` is written back through `save_collection`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<i32>,
    pub name: String,
    pub other_id: Option<i32>,
    #[serde(default)]
    pub other: Option<super::other_entity::Other>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            other_id: model.other_id,
            other: None,
            tags: Vec::new(),
        }
    }
}

impl IntoActiveModel<ActiveModel> for Item {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: match self.id {
                Some(id) => ActiveValue::Set(id),
                None => ActiveValue::NotSet,
            },
            name: ActiveValue::Set(self.name),
            other_id: ActiveValue::Set(self.other_id),
        }
    }
}

#[async_trait]
impl CrudModel for Item {
    type Entity = Entity;
    type ActiveModel = ActiveModel;

    const ENTITY_NAME: &'static str = "item";

    fn primary_key(&self) -> CrudKey {
        CrudKey::single("id", self.id)
    }

    fn set_primary_key(&mut self, key: CrudKey) {
        if let Some(Value::Int(id)) = key.value("id") {
            self.id = *id;
        }
    }

    fn clear_auto_increment_key(&mut self) {
        self.id = None;
    }

    fn fields() -> &'static [FieldDescriptor] {
        const FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::scalar("id"),
            FieldDescriptor::scalar("name"),
            FieldDescriptor::reference("other_id"),
            FieldDescriptor::collection("tags"),
        ];
        FIELDS
    }

    async fn save_collection<C>(&self, db: &C, field: &'static str) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        if field != "tags" {
            return Ok(());
        }
        let Some(id) = self.id else {
            return Ok(());
        };
        super::tag_entity::Entity::delete_many()
            .filter(super::tag_entity::Column::ItemId.eq(id))
            .exec(db)
            .await?;
        for value in &self.tags {
            super::tag_entity::Entity::insert(super::tag_entity::ActiveModel {
                id: ActiveValue::NotSet,
                item_id: ActiveValue::Set(id),
                value: ActiveValue::Set(value.clone()),
            })
            .exec(db)
            .await?;
        }
        Ok(())
    }
}

/// Resolves `other` and `tags` on every read.
pub struct ItemEagerLoad;

#[async_trait]
impl EagerLoad<Item> for ItemEagerLoad {
    async fn load(&self, db: &DatabaseConnection, entities: Vec<Item>) -> Result<Vec<Item>, DbErr> {
        let mut loaded = Vec::with_capacity(entities.len());
        for mut item in entities {
            if let Some(other_id) = item.other_id {
                item.other = super::other_entity::Entity::find_by_id(other_id)
                    .one(db)
                    .await?
                    .map(super::other_entity::Other::from);
            }
            if let Some(id) = item.id {
                item.tags = super::tag_entity::Entity::find()
                    .filter(super::tag_entity::Column::ItemId.eq(id))
                    .order_by_asc(super::tag_entity::Column::Id)
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|tag| tag.value)
                    .collect();
            }
            loaded.push(item);
        }
        Ok(loaded)
    }
}
