use costtarget::db::{CostTargetQuery, Store, StoreError};
use costtarget::domain::{Role, SortField, SortOrder};

async fn test_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to create in-memory store")
}

#[tokio::test]
async fn migration_seeds_admin_and_departments() {
    let store = test_store().await;

    let admin = store
        .get_user("admin")
        .await
        .unwrap()
        .expect("admin user seeded");
    assert_eq!(admin.role, "admin");
    assert!(admin.is_active);
    assert_eq!(admin.displayname, "Administrator");

    let departments = store.list_departments().await.unwrap();
    assert_eq!(departments.len(), 9);
    assert_eq!(departments[0].department_id, 1);
    assert_eq!(departments[8].department_id, 9);
    assert!(departments.iter().all(|d| d.is_active));
}

#[tokio::test]
async fn insert_then_listed_exactly_once() {
    let store = test_store().await;

    store
        .insert_cost_target(5123, 10, 100.0, "first", Some(5), "jdoe")
        .await
        .unwrap();

    let rows = store
        .list_cost_targets(&CostTargetQuery::default())
        .await
        .unwrap();
    let matching: Vec<_> = rows
        .iter()
        .filter(|r| r.prodnum == 5123 && r.buildcatnum == 10)
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].created_by, "jdoe");
    assert_eq!(matching[0].updated_by, "jdoe");
    assert_eq!(matching[0].department_name.as_deref(), Some("Department 5"));
}

#[tokio::test]
async fn duplicate_pair_is_rejected_without_a_second_row() {
    let store = test_store().await;

    store
        .insert_cost_target(5123, 10, 100.0, "", Some(5), "jdoe")
        .await
        .unwrap();

    let err = store
        .insert_cost_target(5123, 10, 999.0, "other cost", Some(9), "asmith")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate));

    // Same product with a different category is a different pair.
    store
        .insert_cost_target(5123, 11, 100.0, "", Some(5), "jdoe")
        .await
        .unwrap();

    let rows = store
        .list_cost_targets(&CostTargetQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn sorting_by_cost_desc_is_non_increasing() {
    let store = test_store().await;

    for (prodnum, cost) in [(1200, 50.0), (5123, 300.0), (9001, 125.0)] {
        store
            .insert_cost_target(prodnum, 1, cost, "", None, "jdoe")
            .await
            .unwrap();
    }

    let query = CostTargetQuery {
        sort: SortField::TargetCost,
        order: SortOrder::Desc,
        ..Default::default()
    };
    let rows = store.list_cost_targets(&query).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|w| w[0].target_cost >= w[1].target_cost));

    // An unknown sort value parses to the prodnum fallback.
    let fallback = CostTargetQuery {
        sort: SortField::parse("no_such_column"),
        ..Default::default()
    };
    let rows = store.list_cost_targets(&fallback).await.unwrap();
    assert!(rows.windows(2).all(|w| w[0].prodnum <= w[1].prodnum));
}

#[tokio::test]
async fn prodnum_glob_filter_matches_prefix() {
    let store = test_store().await;

    for prodnum in [1200, 1250, 5123] {
        store
            .insert_cost_target(prodnum, 1, 10.0, "", None, "jdoe")
            .await
            .unwrap();
    }

    let query = CostTargetQuery {
        prodnum_filter: Some("12*".to_string()),
        ..Default::default()
    };
    let rows = store.list_cost_targets(&query).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.prodnum.to_string().starts_with("12")));
}

#[tokio::test]
async fn department_filter_narrows_to_one_department() {
    let store = test_store().await;

    store
        .insert_cost_target(5123, 1, 10.0, "", Some(5), "jdoe")
        .await
        .unwrap();
    store
        .insert_cost_target(9001, 1, 10.0, "", Some(9), "jdoe")
        .await
        .unwrap();

    let query = CostTargetQuery {
        department: Some(5),
        ..Default::default()
    };
    let rows = store.list_cost_targets(&query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].prodnum, 5123);
}

#[tokio::test]
async fn update_overwrites_and_stamps_the_editor() {
    let store = test_store().await;

    store
        .insert_cost_target(5123, 10, 100.0, "initial", Some(5), "jdoe")
        .await
        .unwrap();
    let id = store
        .list_cost_targets(&CostTargetQuery::default())
        .await
        .unwrap()[0]
        .id;

    let updated = store
        .update_cost_target(id, 150.0, "revised", Some(6), "asmith")
        .await
        .unwrap();
    assert!(updated);

    let record = store.get_cost_target(id).await.unwrap().unwrap();
    assert!((record.target_cost - 150.0).abs() < f64::EPSILON);
    assert_eq!(record.comments, "revised");
    assert_eq!(record.department_id, Some(6));
    assert_eq!(record.updated_by, "asmith");
    assert_eq!(record.created_by, "jdoe");

    let missing = store
        .update_cost_target(9999, 1.0, "", None, "asmith")
        .await
        .unwrap();
    assert!(!missing);
}

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let store = test_store().await;

    let first = store.get_or_create_user("jdoe", "jdoe").await.unwrap();
    assert_eq!(first.role, Role::User.as_str());
    assert!(first.is_active);
    assert!(first.last_login_at.is_none());

    let second = store.get_or_create_user("jdoe", "someone else").await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.displayname, "jdoe");

    let users = store.list_users().await.unwrap();
    assert_eq!(users.iter().filter(|u| u.username == "jdoe").count(), 1);
}

#[tokio::test]
async fn login_stamp_and_admin_edit() {
    let store = test_store().await;

    store.get_or_create_user("jdoe", "jdoe").await.unwrap();
    store.update_last_login("jdoe").await.unwrap();
    let user = store.get_user("jdoe").await.unwrap().unwrap();
    assert!(user.last_login_at.is_some());

    let updated = store
        .update_user_record("jdoe", "Jane Doe", Role::Admin, false)
        .await
        .unwrap();
    assert!(updated);
    let user = store.get_user("jdoe").await.unwrap().unwrap();
    assert_eq!(user.displayname, "Jane Doe");
    assert_eq!(user.role, "admin");
    assert!(!user.is_active);

    let missing = store
        .update_user_record("nobody", "x", Role::User, true)
        .await
        .unwrap();
    assert!(!missing);
}

#[tokio::test]
async fn users_list_is_ordered_by_username() {
    let store = test_store().await;

    store.get_or_create_user("zoe", "zoe").await.unwrap();
    store.get_or_create_user("bob", "bob").await.unwrap();

    let users = store.list_users().await.unwrap();
    let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["admin", "bob", "zoe"]);
}

#[tokio::test]
async fn department_rename_and_deactivate() {
    let store = test_store().await;

    let updated = store
        .update_department(5, "Powertrain", false)
        .await
        .unwrap();
    assert!(updated);

    let departments = store.list_departments().await.unwrap();
    let dept = departments.iter().find(|d| d.department_id == 5).unwrap();
    assert_eq!(dept.department_name, "Powertrain");
    assert!(!dept.is_active);

    assert!(!store.update_department(42, "Nope", true).await.unwrap());
}

#[tokio::test]
async fn change_log_is_append_only_newest_first() {
    let store = test_store().await;

    store
        .insert_log(5123, 10, None, 100.0, "jdoe", "10.1.2.3", "web01")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store
        .insert_log(5123, 10, Some(100.0), 150.0, "asmith", "10.1.2.4", "web01")
        .await
        .unwrap();

    let logs = store.list_logs().await.unwrap();
    assert_eq!(logs.len(), 2);

    let newest = &logs[0];
    assert_eq!(newest.old_value, Some(100.0));
    assert!((newest.new_value - 150.0).abs() < f64::EPSILON);
    assert_eq!(newest.changed_by, "asmith");
    assert_eq!(newest.source, "web");
    assert_eq!(newest.comment, None);
    assert_eq!(newest.hostname, "web01");
    assert_eq!(newest.ip_address, "10.1.2.4");

    let oldest = &logs[1];
    assert_eq!(oldest.old_value, None);
    assert_eq!(oldest.changed_by, "jdoe");
}
