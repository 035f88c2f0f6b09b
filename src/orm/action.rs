//! Rows recording what one user did to one lesson (likes, ratings).

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

/// The `(lesson, user)` pair an action row is keyed on. Unique per table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LessonAction {
    pub lesson_id: i32,
    pub user_id: i32,
}

pub trait ActionEntity: EntityTrait {
    fn lesson_column() -> Self::Column;
    fn user_column() -> Self::Column;

    /// The row for this pair, if any.
    fn find_for(action: LessonAction) -> Select<Self> {
        Self::find()
            .filter(Self::lesson_column().eq(action.lesson_id))
            .filter(Self::user_column().eq(action.user_id))
    }
}

macro_rules! impl_action {
    () => {
        impl Model {
            pub fn action(&self) -> $crate::orm::action::LessonAction {
                $crate::orm::action::LessonAction {
                    lesson_id: self.lesson_id,
                    user_id: self.user_id,
                }
            }
        }

        impl $crate::orm::action::ActionEntity for Entity {
            fn lesson_column() -> Column {
                Column::LessonId
            }

            fn user_column() -> Column {
                Column::UserId
            }
        }
    };
}

pub(crate) use impl_action;
