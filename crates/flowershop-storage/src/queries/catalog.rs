// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog reads, plus inserts used for seeding.

use flowershop_core::types::{CatalogItem, Category, CategoryId, ItemId};
use flowershop_core::FlowerError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::parsed;

const ITEM_COLUMNS: &str = "id, name, description, structure, price, category_id, photo";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogItem> {
    Ok(CatalogItem {
        id: ItemId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        structure: row.get(3)?,
        price: parsed(row, 4)?,
        category_id: CategoryId(row.get(5)?),
        photo: row.get(6)?,
    })
}

/// All categories in insertion order.
pub async fn list_categories(db: &Database) -> Result<Vec<Category>, FlowerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(Category {
                    id: CategoryId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All items ordered by id.
pub async fn list_items(db: &Database) -> Result<Vec<CatalogItem>, FlowerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))?;
            let rows = stmt.query_map([], item_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// One item by id.
pub async fn get_item(db: &Database, id: ItemId) -> Result<Option<CatalogItem>, FlowerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id.0],
                item_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a category and return its id.
pub async fn insert_category(db: &Database, name: &str) -> Result<CategoryId, FlowerError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
            Ok(CategoryId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert an item (its `id` is ignored) and return the assigned id.
pub async fn insert_item(db: &Database, item: &CatalogItem) -> Result<ItemId, FlowerError> {
    let item = item.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO items (name, description, structure, price, category_id, photo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    item.name,
                    item.description,
                    item.structure,
                    item.price.to_string(),
                    item.category_id.0,
                    item.photo,
                ],
            )?;
            Ok(ItemId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    use super::*;

    fn item(name: &str, price: i64, category: CategoryId) -> CatalogItem {
        CatalogItem {
            id: ItemId(0),
            name: name.into(),
            description: "desc".into(),
            structure: "розы".into(),
            price: Decimal::from(price),
            category_id: category,
            photo: None,
        }
    }

    #[tokio::test]
    async fn inserted_items_read_back_in_order() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("cat.db").to_str().unwrap())
            .await
            .unwrap();

        let birthday = insert_category(&db, "День Рождения").await.unwrap();
        let wedding = insert_category(&db, "Свадьба").await.unwrap();
        let a = insert_item(&db, &item("Нежность", 500, birthday)).await.unwrap();
        let b = insert_item(&db, &item("Страсть", 2500, wedding)).await.unwrap();
        assert!(a < b);

        let cats = list_categories(&db).await.unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "День Рождения");

        let items = list_items(&db).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, a);
        assert_eq!(items[1].price, Decimal::from(2500));

        let fetched = get_item(&db, b).await.unwrap().unwrap();
        assert_eq!(fetched.category_id, wedding);
        assert!(get_item(&db, ItemId(999)).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fractional_prices_are_preserved() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("price.db").to_str().unwrap())
            .await
            .unwrap();
        let cat = insert_category(&db, "Без повода").await.unwrap();
        let mut it = item("Тюльпаны", 0, cat);
        it.price = Decimal::new(99950, 2);
        let id = insert_item(&db, &it).await.unwrap();
        let fetched = get_item(&db, id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::new(99950, 2));
        db.close().await.unwrap();
    }
}
