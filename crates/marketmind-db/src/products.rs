//! Database operations for the `products` catalog.

use chrono::{DateTime, Utc};
use marketmind_core::Product;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    /// Catalog identifier supplied by the importer; unique.
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub product_category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            product_id: row.product_id,
            product_name: row.product_name,
            product_description: row.product_description,
            product_category: row.product_category,
        }
    }
}

/// Catalog order is the order rows were first inserted. `product_id` is free
/// text, so sorting on it would put `"10"` before `"2"`.
pub(crate) const FETCH_PRODUCTS_SQL: &str =
    "SELECT id, product_id, product_name, product_description, product_category, \
            created_at, updated_at \
     FROM products \
     ORDER BY id \
     LIMIT $1";

/// Fetch up to `limit` products in catalog (first-insert) order.
///
/// An empty catalog yields an empty vector.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_products(pool: &PgPool, limit: i64) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(FETCH_PRODUCTS_SQL)
        .bind(limit.max(0))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Upserts a product keyed by `product_id`.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, product: &Product) -> Result<i64, DbError> {
    let id = upsert_with(pool, product).await?;
    Ok(id)
}

/// Upserts every product in one transaction. Returns the number written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails; nothing is committed then.
pub async fn import_products(pool: &PgPool, products: &[Product]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    for product in products {
        upsert_with(&mut *tx, product).await?;
    }
    tx.commit().await?;
    Ok(products.len())
}

async fn upsert_with<'e, E>(executor: E, product: &Product) -> Result<i64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (product_id, product_name, product_description, product_category) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (product_id) DO UPDATE SET \
             product_name        = EXCLUDED.product_name, \
             product_description = EXCLUDED.product_description, \
             product_category    = EXCLUDED.product_category, \
             updated_at          = NOW() \
         RETURNING id",
    )
    .bind(&product.product_id)
    .bind(&product.product_name)
    .bind(&product.product_description)
    .bind(&product.product_category)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_fetched_in_insert_order() {
        assert!(FETCH_PRODUCTS_SQL.contains("ORDER BY id "));
        assert!(!FETCH_PRODUCTS_SQL.contains("ORDER BY product_id"));
    }
}
