//! Timestamps and soft-delete state shared by every catalog table.
//!
//! Each entity carries the same three columns. Rather than repeating the
//! filtering and bookkeeping per table, the columns are read into a
//! [`Lifecycle`] value and queried through [`SoftDelete`].

use chrono::{NaiveDateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};

/// Creation/update timestamps and the `active` flag of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    pub created_date: NaiveDateTime,
    pub updated_date: NaiveDateTime,
    pub active: bool,
}

impl Lifecycle {
    /// State of a row that is about to be inserted.
    pub fn fresh() -> Self {
        let now = now();
        Self {
            created_date: now,
            updated_date: now,
            active: true,
        }
    }
}

/// Models that embed a [`Lifecycle`].
pub trait HasLifecycle {
    fn lifecycle(&self) -> Lifecycle;
}

/// Entities whose rows are hidden rather than removed.
pub trait SoftDelete: EntityTrait {
    fn active_column() -> Self::Column;
    fn id_column() -> Self::Column;

    /// Active rows, ordered by identifier.
    fn find_active() -> Select<Self> {
        Self::find()
            .filter(Self::active_column().eq(true))
            .order_by_asc(Self::id_column())
    }
}

/// Timestamp used for `created_date`/`updated_date` columns.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Implements [`HasLifecycle`], [`SoftDelete`] and the `updated_date` bump on save
/// for an entity module with `created_date`, `updated_date` and `active` columns.
macro_rules! impl_lifecycle {
    () => {
        impl $crate::orm::lifecycle::HasLifecycle for Model {
            fn lifecycle(&self) -> $crate::orm::lifecycle::Lifecycle {
                $crate::orm::lifecycle::Lifecycle {
                    created_date: self.created_date,
                    updated_date: self.updated_date,
                    active: self.active,
                }
            }
        }

        impl $crate::orm::lifecycle::SoftDelete for Entity {
            fn active_column() -> Column {
                Column::Active
            }

            fn id_column() -> Column {
                Column::Id
            }
        }

        impl sea_orm::ActiveModelBehavior for ActiveModel {
            fn before_save(mut self, insert: bool) -> Result<Self, sea_orm::DbErr> {
                let fresh = $crate::orm::lifecycle::Lifecycle::fresh();
                if insert && self.created_date.is_not_set() {
                    self.created_date = sea_orm::ActiveValue::Set(fresh.created_date);
                }
                if insert && self.active.is_not_set() {
                    self.active = sea_orm::ActiveValue::Set(fresh.active);
                }
                self.updated_date = sea_orm::ActiveValue::Set(fresh.updated_date);
                Ok(self)
            }
        }
    };
}

pub(crate) use impl_lifecycle;
