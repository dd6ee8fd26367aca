use std::cell::Cell;
use std::rc::Rc;

use lbm_util_error::Whatever;
use redb_bincode::TableDefinition;
use snafu::{FromString as _, ResultExt as _};

use super::Database;
use crate::error::TxSnafu;

const TABLE: TableDefinition<'static, u32, u64> = TableDefinition::new("test");

#[tokio::test(flavor = "multi_thread")]
async fn failed_write_leaves_no_trace() {
    let db = Database::new_in_memory().await.expect("Can't fail");

    db.write_with_expect(|dbtx| {
        dbtx.open_table(&TABLE)?.insert(&1, &10)?;
        Ok(())
    })
    .await;

    let res: Result<(), Whatever> = db
        .write_with_expect_falliable(|dbtx| {
            dbtx.open_table(&TABLE)?.insert(&1, &20)?;
            Err(Whatever::without_source("nope".into())).context(TxSnafu)
        })
        .await;
    assert!(res.is_err());

    let value = db
        .read_with_expect(|dbtx| Ok(dbtx.open_table(&TABLE)?.get(&1)?.map(|g| g.value())))
        .await;
    assert_eq!(value, Some(10));
}

#[tokio::test(flavor = "multi_thread")]
async fn commit_hooks_run_only_on_commit() {
    let db = Database::new_in_memory().await.expect("Can't fail");
    let counter = Rc::new(Cell::new(0));

    let c = counter.clone();
    let _: Result<(), Whatever> = db
        .write_with_expect_falliable(move |dbtx| {
            dbtx.on_commit(move || c.set(c.get() + 1));
            Err(Whatever::without_source("abort".into())).context(TxSnafu)
        })
        .await;
    assert_eq!(counter.get(), 0);

    let c = counter.clone();
    db.write_with_expect(move |dbtx| {
        dbtx.on_commit(move || c.set(c.get() + 1));
        Ok(())
    })
    .await;
    assert_eq!(counter.get(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn simulation_is_rolled_back() {
    let db = Database::new_in_memory().await.expect("Can't fail");

    db.write_with_expect(|dbtx| {
        dbtx.open_table(&TABLE)?.insert(&1, &10)?;
        Ok(())
    })
    .await;

    let seen = db
        .simulate_with_expect(|dbtx| {
            let mut tbl = dbtx.open_table(&TABLE)?;
            tbl.insert(&1, &30)?;
            let value = tbl.get(&1)?.map(|g| g.value());
            Ok(value)
        })
        .await;
    assert_eq!(seen, Some(30));

    let value = db
        .read_with_expect(|dbtx| Ok(dbtx.open_table(&TABLE)?.get(&1)?.map(|g| g.value())))
        .await;
    assert_eq!(value, Some(10));
}
