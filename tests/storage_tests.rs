//! SeaOrmStorage tests against a temporary SQLite database

mod common;

use common::temp_storage;
use geolocator::errors::GeoError;
use geolocator::identity::Identity;
use geolocator::storage::{Coordinates, GeoMetadata, GeoStore, NewGeoRecord};

fn ip_record(ip: &str) -> NewGeoRecord {
    NewGeoRecord::new(Some(ip.to_string()), None, Coordinates::new(10.0, 20.0))
}

fn url_record(url: &str) -> NewGeoRecord {
    NewGeoRecord::new(None, Some(url.to_string()), Coordinates::new(-0.12, 51.5))
}

#[tokio::test]
async fn test_insert_and_lookup_by_ip() {
    let (_dir, storage) = temp_storage().await;

    let stored = storage
        .insert(ip_record("8.8.8.8").with_metadata(GeoMetadata {
            country_code: Some("US".into()),
            city: Some("Mountain View".into()),
            ..GeoMetadata::default()
        }))
        .await
        .unwrap();
    assert!(stored.id > 0);

    let found = storage
        .lookup(&Identity::Ip("8.8.8.8".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, stored.id);
    assert_eq!(found.coordinates, Coordinates::new(10.0, 20.0));
    assert_eq!(found.metadata.city.as_deref(), Some("Mountain View"));

    assert!(
        storage
            .lookup(&Identity::Ip("8.8.4.4".into()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_lookup_is_exact_match() {
    let (_dir, storage) = temp_storage().await;
    storage.insert(url_record("example.com")).await.unwrap();

    for near_miss in ["example.co", "xample.com", "example.com.au"] {
        assert!(
            storage
                .lookup(&Identity::Url(near_miss.into()))
                .await
                .unwrap()
                .is_none(),
            "{near_miss} must not match"
        );
    }
    // An IP lookup never matches the url column
    assert!(
        storage
            .lookup(&Identity::Ip("example.com".into()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_duplicate_ip_is_uniqueness_conflict() {
    let (_dir, storage) = temp_storage().await;
    storage.insert(ip_record("1.1.1.1")).await.unwrap();

    let result = storage.insert(ip_record("1.1.1.1")).await;
    assert!(matches!(result, Err(GeoError::UniquenessConflict(_))), "{result:?}");
    assert_eq!(storage.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_url_is_uniqueness_conflict() {
    let (_dir, storage) = temp_storage().await;
    storage.insert(url_record("example.com")).await.unwrap();

    let result = storage.insert(url_record("example.com")).await;
    assert!(matches!(result, Err(GeoError::UniquenessConflict(_))));
}

#[tokio::test]
async fn test_absent_identities_do_not_collide() {
    let (_dir, storage) = temp_storage().await;

    // Both rows have a NULL url, and the url rows have NULL ips
    storage.insert(ip_record("1.1.1.1")).await.unwrap();
    storage.insert(ip_record("1.0.0.1")).await.unwrap();
    storage.insert(url_record("example.com")).await.unwrap();
    storage.insert(url_record("example.org")).await.unwrap();

    assert_eq!(storage.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_delete_reports_removal() {
    let (_dir, storage) = temp_storage().await;
    storage.insert(url_record("example.com")).await.unwrap();

    let identity = Identity::Url("example.com".into());
    assert!(storage.delete(&identity).await.unwrap());
    assert!(!storage.delete(&identity).await.unwrap());
    assert!(storage.lookup(&identity).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_recent_respects_limit() {
    let (_dir, storage) = temp_storage().await;
    for i in 1..=5 {
        storage.insert(ip_record(&format!("10.0.0.{i}"))).await.unwrap();
    }

    let recent = storage.list_recent(3).await.unwrap();
    let ips: Vec<_> = recent.iter().filter_map(|r| r.ip.as_deref()).collect();
    assert_eq!(ips, vec!["10.0.0.5", "10.0.0.4", "10.0.0.3"]);
    assert_eq!(storage.backend_config().storage_type, "sqlite");
}

#[tokio::test]
async fn test_backend_constraint_rejection_is_persist_failure() {
    use sea_orm::ConnectionTrait;

    let (_dir, storage) = temp_storage().await;

    let err = storage
        .get_db()
        .execute_unprepared(
            "INSERT INTO geolocations (ip, longitude, latitude, created_at) \
             VALUES ('1.1.1.1', NULL, 0.0, '2024-01-01T00:00:00Z')",
        )
        .await
        .unwrap_err();

    match GeoError::from(err) {
        GeoError::PersistFailed(messages) => {
            assert_eq!(messages.len(), 1);
            assert!(messages[0].to_lowercase().contains("not null"), "{messages:?}");
        }
        other => panic!("expected persist failure, got {other:?}"),
    }
}
