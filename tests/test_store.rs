use campus_tt_notify::db::{
    add_favorite_teacher, ensure_user, get_favorite_teachers, get_user, is_favorite_teacher,
    remove_favorite_teacher, set_user_group, set_user_subgroup, users_with_alarm_enabled,
    users_with_notifications_enabled, set_alarm_enabled, set_notifications_enabled, MIGRATOR,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn test_pool() -> SqlitePool {
    // a single connection, otherwise every pooled connection would get its
    // own empty in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn ensure_user_is_idempotent() {
    let pool = test_pool().await;
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();
    // a repeated first interaction must not reset the chosen group
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();

    let user = get_user(&pool, "u1").await.unwrap().unwrap();
    assert_eq!(user.group_name.as_deref(), Some("ИС-21"));
    assert!(user.notify);
    assert!(user.events_enabled);
    assert!(!user.alarm_enabled);
}

#[tokio::test]
async fn subgroup_can_be_set_and_cleared() {
    let pool = test_pool().await;
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_subgroup(&pool, "u1", Some(2)).await.unwrap();
    assert_eq!(
        get_user(&pool, "u1").await.unwrap().unwrap().subgroup,
        Some(2)
    );
    set_user_subgroup(&pool, "u1", None).await.unwrap();
    assert_eq!(get_user(&pool, "u1").await.unwrap().unwrap().subgroup, None);
}

#[tokio::test]
async fn notification_queries_follow_the_toggles() {
    let pool = test_pool().await;
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    ensure_user(&pool, "u2", "Казимир Малевич", "blacksquare@gmail.com")
        .await
        .unwrap();
    set_notifications_enabled(&pool, "u2", false).await.unwrap();

    let notified: Vec<String> = users_with_notifications_enabled(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(notified, vec!["u1"]);

    // the alarm additionally needs notifications and a chosen group
    set_alarm_enabled(&pool, "u1", true).await.unwrap();
    assert!(users_with_alarm_enabled(&pool).await.unwrap().is_empty());
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();
    let with_alarm: Vec<String> = users_with_alarm_enabled(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(with_alarm, vec!["u1"]);
}

#[tokio::test]
async fn favorites_are_stored_normalized_and_deduplicated() {
    let pool = test_pool().await;
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();

    add_favorite_teacher(&pool, "u1", "доц. Петров П. П.").await.unwrap();
    // the same identity under a different raw spelling is a no-op
    add_favorite_teacher(&pool, "u1", "Петров П. П. (ДОТ)").await.unwrap();
    add_favorite_teacher(&pool, "u1", "Петров П. П.").await.unwrap();

    assert_eq!(
        get_favorite_teachers(&pool, "u1").await.unwrap(),
        vec!["Петров П. П."]
    );
    assert!(is_favorite_teacher(&pool, "u1", "Петров П. П.").await.unwrap());
    assert!(is_favorite_teacher(&pool, "u1", "доц. Петров П. П.").await.unwrap());
    assert!(!is_favorite_teacher(&pool, "u1", "Иванов И. И.").await.unwrap());

    remove_favorite_teacher(&pool, "u1", "Петров П. П.").await.unwrap();
    assert!(get_favorite_teachers(&pool, "u1").await.unwrap().is_empty());
}
