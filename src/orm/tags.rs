//! SeaORM Entity for tags table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub created_date: DateTime,
    pub updated_date: DateTime,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lesson_tags::Entity")]
    LessonTags,
}

impl Related<super::lesson_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonTags.def()
    }
}

impl Related<super::lessons::Entity> for Entity {
    fn to() -> RelationDef {
        super::lesson_tags::Relation::Lesson.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::lesson_tags::Relation::Tag.def().rev())
    }
}

super::lifecycle::impl_lifecycle!();
