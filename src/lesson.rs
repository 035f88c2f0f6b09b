//! Lesson detail and the actions a user takes on a lesson: tagging,
//! commenting, liking and rating.

use crate::orm::action::{ActionEntity, LessonAction};
use crate::orm::lifecycle::SoftDelete;
use crate::orm::{comments, lesson_tags, lessons, likes, ratings, tags, users};
use crate::serializer::{TagRepr, ViewerState};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

pub async fn get_active_lesson<C: ConnectionTrait>(
    db: &C,
    lesson_id: i32,
) -> Result<Option<lessons::Model>, DbErr> {
    lessons::Entity::find_active()
        .filter(lessons::Column::Id.eq(lesson_id))
        .one(db)
        .await
}

/// Active tags linked to the lesson, ordered by id.
pub async fn lesson_tags<C: ConnectionTrait>(
    db: &C,
    lesson: &lessons::Model,
) -> Result<Vec<TagRepr>, DbErr> {
    Ok(lesson
        .find_related(tags::Entity)
        .filter(tags::Column::Active.eq(true))
        .order_by_asc(tags::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(TagRepr::from)
        .collect())
}

/// Whether the user liked the lesson and how they rated it.
pub async fn viewer_state<C: ConnectionTrait>(
    db: &C,
    action: LessonAction,
) -> Result<ViewerState, DbErr> {
    let like = likes::Entity::find_for(action).one(db).await?;
    let rating = ratings::Entity::find_for(action).one(db).await?;

    Ok(ViewerState {
        liked: like.map_or(false, |l| l.liked),
        rating: rating.map_or(0, |r| r.rate),
    })
}

/// Trims tag names, drops blanks and repeats. Order of first appearance is kept.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_owned());
        }
    }
    seen
}

async fn find_or_create_tag<C: ConnectionTrait>(db: &C, name: &str) -> Result<tags::Model, DbErr> {
    let existing = tags::Entity::find()
        .filter(tags::Column::Name.eq(name))
        .order_by_asc(tags::Column::Id)
        .one(db)
        .await?;

    match existing {
        Some(tag) => Ok(tag),
        None => {
            log::debug!("Creating tag {:?}", name);
            tags::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    }
}

/// Links each named tag to the lesson, creating missing tags.
/// Tags already linked are left alone.
pub async fn assign_tags(
    db: &DatabaseConnection,
    lesson_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    let names = normalize_tag_names(names);
    let txn = db.begin().await?;

    for name in &names {
        let tag = find_or_create_tag(&txn, name).await?;
        let linked = lesson_tags::Entity::find()
            .filter(lesson_tags::Column::LessonId.eq(lesson_id))
            .filter(lesson_tags::Column::TagId.eq(tag.id))
            .count(&txn)
            .await?;

        if linked == 0 {
            lesson_tags::ActiveModel {
                lesson_id: Set(lesson_id),
                tag_id: Set(tag.id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    log::info!("Assigned tags {:?} to lesson_id={}", names, lesson_id);
    Ok(())
}

/// Active comments of the lesson with their authors, oldest first.
pub async fn list_comments<C: ConnectionTrait>(
    db: &C,
    lesson_id: i32,
) -> Result<Vec<(comments::Model, users::Model)>, DbErr> {
    Ok(comments::Entity::find_active()
        .filter(comments::Column::LessonId.eq(lesson_id))
        .find_also_related(users::Entity)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(comment, user)| user.map(|user| (comment, user)))
        .collect())
}

pub async fn create_comment<C: ConnectionTrait>(
    db: &C,
    action: LessonAction,
    content: &str,
) -> Result<comments::Model, DbErr> {
    let comment = comments::ActiveModel {
        content: Set(content.to_owned()),
        lesson_id: Set(action.lesson_id),
        user_id: Set(action.user_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!(
        "Comment {} created on lesson_id={} by user_id={}",
        comment.id,
        action.lesson_id,
        action.user_id
    );
    Ok(comment)
}

async fn flip_like<C: ConnectionTrait>(db: &C, like: likes::Model) -> Result<likes::Model, DbErr> {
    let liked = !like.liked;
    log::debug!("{:?} flipped to liked={}", like.action(), liked);
    let mut active: likes::ActiveModel = like.into();
    active.liked = Set(liked);
    active.update(db).await
}

/// Creates the like as `liked`, or flips an existing one.
///
/// Two concurrent first likes race on the `(lesson, user)` unique key. The
/// loser finds the winner's row and flips it.
pub async fn toggle_like<C: ConnectionTrait>(
    db: &C,
    action: LessonAction,
) -> Result<likes::Model, DbErr> {
    if let Some(like) = likes::Entity::find_for(action).one(db).await? {
        return flip_like(db, like).await;
    }

    let inserted = likes::ActiveModel {
        liked: Set(true),
        lesson_id: Set(action.lesson_id),
        user_id: Set(action.user_id),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(like) => Ok(like),
        Err(e) => match likes::Entity::find_for(action).one(db).await? {
            Some(like) => {
                log::debug!("Like for {:?} was created concurrently", action);
                flip_like(db, like).await
            }
            None => Err(e),
        },
    }
}

async fn update_rate<C: ConnectionTrait>(
    db: &C,
    rating: ratings::Model,
    rate: i16,
) -> Result<ratings::Model, DbErr> {
    log::debug!("{:?} changed rating {} -> {}", rating.action(), rating.rate, rate);
    let mut active: ratings::ActiveModel = rating.into();
    active.rate = Set(rate);
    active.update(db).await
}

/// Stores the user's rating of the lesson, replacing any earlier one.
pub async fn set_rating<C: ConnectionTrait>(
    db: &C,
    action: LessonAction,
    rate: i16,
) -> Result<ratings::Model, DbErr> {
    if let Some(rating) = ratings::Entity::find_for(action).one(db).await? {
        return update_rate(db, rating, rate).await;
    }

    let inserted = ratings::ActiveModel {
        rate: Set(rate),
        lesson_id: Set(action.lesson_id),
        user_id: Set(action.user_id),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(rating) => Ok(rating),
        Err(e) => match ratings::Entity::find_for(action).one(db).await? {
            Some(rating) => update_rate(db, rating, rate).await,
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_tag_names() {
        assert_eq!(
            normalize_tag_names(&names(&["python", " django ", "python", ""])),
            names(&["python", "django"])
        );
    }

    #[test]
    fn test_normalize_tag_names_is_case_sensitive() {
        assert_eq!(
            normalize_tag_names(&names(&["Rust", "rust"])),
            names(&["Rust", "rust"])
        );
    }
}
