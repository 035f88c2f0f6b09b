//! Owner-only edits of lesson comments.

use crate::orm::lifecycle::SoftDelete;
use crate::orm::{comments, users};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// An active comment together with its author.
pub async fn get_active_comment<C: ConnectionTrait>(
    db: &C,
    comment_id: i32,
) -> Result<Option<(comments::Model, users::Model)>, DbErr> {
    Ok(comments::Entity::find_active()
        .filter(comments::Column::Id.eq(comment_id))
        .find_also_related(users::Entity)
        .one(db)
        .await?
        .and_then(|(comment, user)| user.map(|user| (comment, user))))
}

pub async fn update_comment<C: ConnectionTrait>(
    db: &C,
    comment: comments::Model,
    content: &str,
) -> Result<comments::Model, DbErr> {
    let mut active: comments::ActiveModel = comment.into();
    active.content = Set(content.to_owned());
    let comment = active.update(db).await?;
    log::info!("Comment {} updated by user_id={}", comment.id, comment.user_id);
    Ok(comment)
}

/// Removes the row. Comments are the one resource that is deleted outright.
pub async fn delete_comment<C: ConnectionTrait>(db: &C, comment: comments::Model) -> Result<(), DbErr> {
    let (id, user_id) = (comment.id, comment.user_id);
    comment.delete(db).await?;
    log::info!("Comment {} deleted by user_id={}", id, user_id);
    Ok(())
}
