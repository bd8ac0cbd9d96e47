use anyhow::Result;
use chrono::{NaiveDate, Utc};
use fundbook::models::SchemeCode;
use fundbook::navdata::{JsonlNavStore, MemoryNavStore, NavPoint, NavStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn point(scheme: u32, d: NaiveDate, nav: Decimal) -> NavPoint {
    NavPoint::new(SchemeCode::new(scheme), d, nav, "test", Utc::now())
}

/// Deliberately out of order, spanning two years and two schemes.
fn scattered_batch() -> Vec<NavPoint> {
    vec![
        point(120503, date(2024, 1, 2), dec!(11)),
        point(120503, date(2023, 6, 1), dec!(9)),
        point(120503, date(2023, 12, 29), dec!(10)),
        point(100356, date(2024, 1, 2), dec!(25)),
    ]
}

async fn assert_same_answers(a: &dyn NavStore, b: &dyn NavStore) -> Result<()> {
    let scheme = SchemeCode::new(120503);

    let probes = [
        date(2023, 1, 1),
        date(2023, 6, 1),
        date(2023, 12, 31),
        date(2024, 1, 2),
        date(2024, 6, 1),
    ];
    for probe in probes {
        let from_a = a
            .nav_on_or_before(scheme, probe)
            .await?
            .map(|p| (p.date, p.nav));
        let from_b = b
            .nav_on_or_before(scheme, probe)
            .await?
            .map(|p| (p.date, p.nav));
        assert_eq!(from_a, from_b, "nav_on_or_before({probe}) diverged");
    }

    let dates_a: Vec<NaiveDate> = a.get_all(scheme).await?.iter().map(|p| p.date).collect();
    let dates_b: Vec<NaiveDate> = b.get_all(scheme).await?.iter().map(|p| p.date).collect();
    assert_eq!(dates_a, dates_b);

    assert_eq!(a.coverage(scheme).await?, b.coverage(scheme).await?);
    Ok(())
}

#[tokio::test]
async fn memory_and_jsonl_stores_agree_on_the_same_history() -> Result<()> {
    let dir = TempDir::new()?;
    let memory = MemoryNavStore::new();
    let jsonl = JsonlNavStore::new(dir.path());

    memory.put_navs(&scattered_batch()).await?;
    jsonl.put_navs(&scattered_batch()).await?;

    assert_same_answers(&memory, &jsonl).await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_puts_keep_the_first_write_in_both_stores() -> Result<()> {
    let dir = TempDir::new()?;
    let memory = MemoryNavStore::new();
    let jsonl = JsonlNavStore::new(dir.path());
    let scheme = SchemeCode::new(120503);

    for store in [&memory as &dyn NavStore, &jsonl] {
        store
            .put_navs(&[point(120503, date(2024, 1, 5), dec!(10))])
            .await?;
        // A second write for the same day never repriced a cached NAV.
        store
            .put_navs(&[point(120503, date(2024, 1, 5), dec!(99))])
            .await?;

        let cached = store.get_nav(scheme, date(2024, 1, 5)).await?.unwrap();
        assert_eq!(cached.nav, dec!(10));
    }
    Ok(())
}

#[tokio::test]
async fn schemes_do_not_leak_into_each_other() -> Result<()> {
    let dir = TempDir::new()?;
    let memory = MemoryNavStore::new();
    let jsonl = JsonlNavStore::new(dir.path());
    let other = SchemeCode::new(100356);

    for store in [&memory as &dyn NavStore, &jsonl] {
        store.put_navs(&scattered_batch()).await?;

        let all = store.get_all(other).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].date, date(2024, 1, 2));
        // The other scheme's 2023 history must not answer for this one.
        assert!(store
            .nav_on_or_before(other, date(2023, 12, 31))
            .await?
            .is_none());
    }
    Ok(())
}

#[tokio::test]
async fn jsonl_history_survives_reopening_from_disk() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let store = JsonlNavStore::new(dir.path());
        store.put_navs(&scattered_batch()).await?;
    }

    let reopened = JsonlNavStore::new(dir.path());
    let all = reopened.get_all(SchemeCode::new(120503)).await?;
    assert_eq!(all.len(), 3);
    assert_eq!(
        reopened.coverage(SchemeCode::new(120503)).await?,
        Some((date(2023, 6, 1), date(2024, 1, 2)))
    );

    // One shard per scheme and year.
    assert!(dir.path().join("navs/120503/2023.jsonl").exists());
    assert!(dir.path().join("navs/120503/2024.jsonl").exists());
    assert!(dir.path().join("navs/100356/2024.jsonl").exists());
    Ok(())
}
