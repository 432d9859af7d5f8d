//! Generic persistence for list sections.
//!
//! Every statement is assembled from `Section::TABLE` / `Section::COLUMNS`,
//! which are compile-time constants, and all values go through binds.

use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::sections::{Section, SectionRow};
use crate::resumes::store::touch_resume;

pub async fn list<'e, T: Section>(
    db: impl PgExecutor<'e>,
    resume_id: Uuid,
) -> Result<Vec<SectionRow<T>>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE resume_id = $1 ORDER BY sort_order, {}, id",
        T::TABLE,
        T::NATURAL_ORDER
    );
    sqlx::query_as::<_, SectionRow<T>>(&sql)
        .bind(resume_id)
        .fetch_all(db)
        .await
}

pub async fn get<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    item_id: i64,
) -> Result<Option<SectionRow<T>>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = $1 AND resume_id = $2",
        T::TABLE
    );
    sqlx::query_as::<_, SectionRow<T>>(&sql)
        .bind(item_id)
        .bind(resume_id)
        .fetch_optional(db)
        .await
}

async fn next_order<T: Section>(conn: &mut PgConnection, resume_id: Uuid) -> Result<i32, sqlx::Error> {
    let sql = format!(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {} WHERE resume_id = $1",
        T::TABLE
    );
    sqlx::query_scalar::<_, i32>(&sql)
        .bind(resume_id)
        .fetch_one(conn)
        .await
}

async fn insert_row<T: Section>(
    conn: &mut PgConnection,
    resume_id: Uuid,
    order: i32,
    item: &T,
) -> Result<SectionRow<T>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "INSERT INTO {} (resume_id, sort_order, {}) VALUES (",
        T::TABLE,
        T::COLUMNS.join(", ")
    ));
    {
        let mut values = qb.separated(", ");
        values.push_bind(resume_id).push_bind(order);
        item.push_binds(&mut values);
    }
    qb.push(") RETURNING *");

    qb.build_query_as::<SectionRow<T>>().fetch_one(conn).await
}

/// Appends after the current last entry when `order` is not given.
pub async fn create<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    order: Option<i32>,
    item: &T,
) -> Result<SectionRow<T>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let order = match order {
        Some(order) => order,
        None => next_order::<T>(&mut tx, resume_id).await?,
    };
    let row = insert_row(&mut tx, resume_id, order, item).await?;
    touch_resume(&mut *tx, resume_id).await?;
    tx.commit().await?;
    Ok(row)
}

/// Overwrites every data column of one entry. Returns `None` if the entry is
/// not part of the resume.
pub async fn update<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    item_id: i64,
    order: i32,
    item: &T,
) -> Result<Option<SectionRow<T>>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "UPDATE {} SET (sort_order, {}) = ROW(",
        T::TABLE,
        T::COLUMNS.join(", ")
    ));
    {
        let mut values = qb.separated(", ");
        values.push_bind(order);
        item.push_binds(&mut values);
    }
    qb.push(") WHERE id = ")
        .push_bind(item_id)
        .push(" AND resume_id = ")
        .push_bind(resume_id)
        .push(" RETURNING *");

    let mut tx = db.begin().await?;
    let row = qb
        .build_query_as::<SectionRow<T>>()
        .fetch_optional(&mut *tx)
        .await?;
    if row.is_some() {
        touch_resume(&mut *tx, resume_id).await?;
    }
    tx.commit().await?;
    Ok(row)
}

pub async fn delete<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    item_id: i64,
) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = $1 AND resume_id = $2", T::TABLE);
    let mut tx = db.begin().await?;
    let deleted = sqlx::query(&sql)
        .bind(item_id)
        .bind(resume_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;
    if deleted {
        touch_resume(&mut *tx, resume_id).await?;
    }
    tx.commit().await?;
    Ok(deleted)
}

/// Replaces the whole section in one transaction. Items keep their input
/// position as `order`.
pub async fn replace_all<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    items: &[T],
) -> Result<Vec<SectionRow<T>>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let sql = format!("DELETE FROM {} WHERE resume_id = $1", T::TABLE);
    sqlx::query(&sql).bind(resume_id).execute(&mut *tx).await?;

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let order = i32::try_from(index).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        rows.push(insert_row(&mut tx, resume_id, order, item).await?);
    }

    touch_resume(&mut *tx, resume_id).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Sets `order = position` for each listed id of this resume. Ids belonging
/// to another resume are ignored; unlisted entries keep their order.
pub async fn reorder<T: Section>(
    db: &PgPool,
    resume_id: Uuid,
    ids: &[i64],
) -> Result<Vec<SectionRow<T>>, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET sort_order = $1 WHERE id = $2 AND resume_id = $3",
        T::TABLE
    );

    let mut tx = db.begin().await?;
    for (index, id) in ids.iter().enumerate() {
        let order = i32::try_from(index).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query(&sql)
            .bind(order)
            .bind(id)
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;
    }
    touch_resume(&mut *tx, resume_id).await?;
    let rows = list::<T>(&mut *tx, resume_id).await?;
    tx.commit().await?;
    Ok(rows)
}

/// Copies every entry of one resume's section onto another, inside the caller's transaction.
pub async fn copy_all<T: Section>(
    conn: &mut PgConnection,
    from: Uuid,
    to: Uuid,
) -> Result<u64, sqlx::Error> {
    let columns = T::COLUMNS.join(", ");
    let sql = format!(
        "INSERT INTO {table} (resume_id, sort_order, {columns}) \
         SELECT $1, sort_order, {columns} FROM {table} WHERE resume_id = $2 ORDER BY id",
        table = T::TABLE,
    );
    Ok(sqlx::query(&sql)
        .bind(to)
        .bind(from)
        .execute(conn)
        .await?
        .rows_affected())
}
