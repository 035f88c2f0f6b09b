//! SeaORM Entity for lessons table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subject: String,
    /// Rich text (HTML).
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub image: String,
    pub course_id: i32,
    pub created_date: DateTime,
    pub updated_date: DateTime,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::lesson_tags::Entity")]
    LessonTags,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::likes::Entity")]
    Likes,
    #[sea_orm(has_many = "super::ratings::Entity")]
    Ratings,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::lesson_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonTags.def()
    }
}

/// Lesson <-> Tag through the `lesson_tags` junction.
impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::lesson_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::lesson_tags::Relation::Lesson.def().rev())
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::ratings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

super::lifecycle::impl_lifecycle!();
