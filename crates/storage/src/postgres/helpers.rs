//! Shared helpers for PostgreSQL statements and row conversion.

use std::collections::HashMap;
use std::hash::Hash;

use gavel_core::error::{StorageError, StorageResult};
use gavel_core::models::{Coin, DecCoin, Height};

/// Postgres accepts at most this many bind parameters per statement.
pub const BIND_LIMIT: usize = u16::MAX as usize;

/// Largest number of rows a multi-row `INSERT` of `columns` columns can carry.
pub fn rows_per_statement(columns: usize) -> usize {
    (BIND_LIMIT / columns.max(1)).max(1)
}

/// `BIGINT` value of an unsigned id or height.
pub fn to_db_int(value: u64, column: &'static str) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| {
        StorageError::SerializationError(format!("{column} {value} does not fit in BIGINT"))
    })
}

// =============================================================================
// Composite types
// =============================================================================

/// Row shape of the `COIN` composite type.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "coin")]
pub struct DbCoin {
    pub denom: String,
    pub amount: String,
}

impl From<&Coin> for DbCoin {
    fn from(coin: &Coin) -> Self {
        Self {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

impl From<DbCoin> for Coin {
    fn from(coin: DbCoin) -> Self {
        Coin::new(coin.denom, coin.amount)
    }
}

/// Row shape of the `DEC_COIN` composite type.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "dec_coin")]
pub struct DbDecCoin {
    pub denom: String,
    pub amount: String,
}

impl From<&DecCoin> for DbDecCoin {
    fn from(coin: &DecCoin) -> Self {
        Self {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

impl From<DbDecCoin> for DecCoin {
    fn from(coin: DbDecCoin) -> Self {
        DecCoin::new(coin.denom, coin.amount)
    }
}

pub fn coins_to_db(coins: &[Coin]) -> Vec<DbCoin> {
    coins.iter().map(DbCoin::from).collect()
}

pub fn dec_coins_to_db(coins: &[DecCoin]) -> Vec<DbDecCoin> {
    coins.iter().map(DbDecCoin::from).collect()
}

// =============================================================================
// Statement builders
// =============================================================================

/// Height-guarded upsert of a singleton table keyed by `one_row_id`.
///
/// `columns` excludes `height`, which is always bound last. The `WHERE`
/// clause turns an older write into a no-op reporting zero affected rows.
pub fn singleton_upsert_sql(table: &str, columns: &[&str]) -> String {
    let mut all: Vec<&str> = columns.to_vec();
    all.push("height");

    let placeholders: Vec<String> = (1..=all.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = all
        .iter()
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();

    format!(
        "INSERT INTO {table} ({}) VALUES ({}) \
         ON CONFLICT (one_row_id) DO UPDATE SET {} \
         WHERE {table}.height <= EXCLUDED.height",
        all.join(", "),
        placeholders.join(", "),
        updates.join(", "),
    )
}

/// Conflict clause replacing `columns` when the incoming height is not older.
pub fn height_guarded_conflict(table: &str, key: &[&str], columns: &[&str]) -> String {
    let updates: Vec<String> = columns
        .iter()
        .chain(std::iter::once(&"height"))
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();

    format!(
        " ON CONFLICT ({}) DO UPDATE SET {} WHERE {table}.height <= EXCLUDED.height",
        key.join(", "),
        updates.join(", "),
    )
}

/// Conflict clause skipping rows whose key already exists.
pub fn skip_conflict(key: &[&str]) -> String {
    format!(" ON CONFLICT ({}) DO NOTHING", key.join(", "))
}

// =============================================================================
// Batch collapsing
// =============================================================================

/// Keep one row per key: the highest height, later entry on a tie.
///
/// Keys keep the order of their first appearance.
pub fn latest_by_key<T, K, FK, FH>(rows: &[T], key: FK, height: FH) -> Vec<&T>
where
    K: Eq + Hash,
    FK: Fn(&T) -> K,
    FH: Fn(&T) -> Height,
{
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<&T> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(&key(row)) {
            Some(&pos) => {
                if height(row) >= height(kept[pos]) {
                    kept[pos] = row;
                }
            }
            None => {
                positions.insert(key(row), kept.len());
                kept.push(row);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_upsert_guards_height() {
        let sql = singleton_upsert_sql("gov_params", &["deposit_params", "tally_params"]);
        assert_eq!(
            sql,
            "INSERT INTO gov_params (deposit_params, tally_params, height) VALUES ($1, $2, $3) \
             ON CONFLICT (one_row_id) DO UPDATE SET deposit_params = EXCLUDED.deposit_params, \
             tally_params = EXCLUDED.tally_params, height = EXCLUDED.height \
             WHERE gov_params.height <= EXCLUDED.height"
        );
    }

    #[test]
    fn test_height_guarded_conflict_clause() {
        let clause = height_guarded_conflict(
            "proposal_vote",
            &["proposal_id", "voter_address"],
            &["option"],
        );
        assert_eq!(
            clause,
            " ON CONFLICT (proposal_id, voter_address) DO UPDATE SET option = EXCLUDED.option, \
             height = EXCLUDED.height WHERE proposal_vote.height <= EXCLUDED.height"
        );
    }

    #[test]
    fn test_skip_conflict_clause() {
        assert_eq!(skip_conflict(&["id"]), " ON CONFLICT (id) DO NOTHING");
    }

    // Test critique: jamais deux lignes de même clé dans un seul INSERT ... DO UPDATE
    #[test]
    fn test_latest_by_key_highest_height_wins() {
        let rows = vec![(1u64, 5u64, "a"), (2, 3, "b"), (1, 8, "c"), (1, 2, "d")];
        let kept = latest_by_key(&rows, |r| r.0, |r| r.1);
        assert_eq!(kept, vec![&(1, 8, "c"), &(2, 3, "b")]);
    }

    #[test]
    fn test_latest_by_key_tie_keeps_later_entry() {
        let rows = vec![(7u64, 4u64, "first"), (7, 4, "second")];
        let kept = latest_by_key(&rows, |r| r.0, |r| r.1);
        assert_eq!(kept, vec![&(7, 4, "second")]);
    }

    // Test critique: une hauteur hors BIGINT est refusée, jamais tronquée en négatif
    #[test]
    fn test_to_db_int_rejects_values_above_bigint() {
        assert_eq!(to_db_int(i64::MAX as u64, "height").unwrap(), i64::MAX);
        assert_eq!(to_db_int(0, "height").unwrap(), 0);

        let err = to_db_int(u64::MAX, "height").unwrap_err();
        assert!(matches!(err, StorageError::SerializationError(_)));
        assert!(err.to_string().contains("height 18446744073709551615"));

        assert!(to_db_int(i64::MAX as u64 + 1, "proposal_id").is_err());
    }

    #[test]
    fn test_coin_arrays_bind_as_postgres_types() {
        fn assert_pg_type<T: sqlx::Type<sqlx::Postgres>>() {}
        assert_pg_type::<Vec<DbCoin>>();
        assert_pg_type::<Vec<DbDecCoin>>();
    }

    #[test]
    fn test_rows_per_statement_respects_bind_limit() {
        assert_eq!(rows_per_statement(4), 16383);
        assert!(rows_per_statement(10) * 10 <= BIND_LIMIT);
        assert_eq!(rows_per_statement(0), BIND_LIMIT);
    }
}
