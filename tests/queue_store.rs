use smsmodem::modem::queue::start_queue;
use smsmodem::modem::{DispatchError, Message};
use std::time::Duration;

fn mk_msg(text: &str) -> Message {
    Message::to(&["+15550001234"], text)
}

#[tokio::test]
async fn overflow_keeps_most_recent_in_order() {
    let q = start_queue(3);
    for i in 0..5 {
        q.put(mk_msg(&format!("msg{i}"))).expect("put");
    }
    let stats = q.snapshot().await.expect("snapshot");
    assert_eq!(stats.queued, 3);
    assert_eq!(stats.accepted, 5);
    assert_eq!(stats.dropped_overflow, 2);

    let mut got = Vec::new();
    for _ in 0..3 {
        let m = tokio::time::timeout(Duration::from_millis(200), q.fetch())
            .await
            .expect("timeout")
            .expect("closed");
        got.push(m.text().to_string());
    }
    assert_eq!(got, vec!["msg2", "msg3", "msg4"]);
    assert!(!q.check().await);
}

#[tokio::test]
async fn parked_fetch_gets_next_put_directly() {
    let q = start_queue(3);
    let pending = q.fetch();

    let m = mk_msg("direct");
    let id = m.id();
    q.put(m).expect("put");

    let fetched = tokio::time::timeout(Duration::from_millis(200), pending)
        .await
        .expect("timeout")
        .expect("closed");
    assert_eq!(fetched.id(), id);
    assert!(!q.check().await, "handed-off message must not be in the backlog");

    let stats = q.snapshot().await.unwrap();
    assert_eq!(stats.handed_off, 1);
    assert_eq!(stats.queued, 0);
}

#[tokio::test]
async fn only_next_put_is_handed_off() {
    let q = start_queue(3);
    let pending = q.fetch();
    q.put(mk_msg("first")).unwrap();
    q.put(mk_msg("second")).unwrap();

    assert_eq!(pending.await.unwrap().text(), "first");
    assert!(q.check().await);
    assert_eq!(q.fetch().await.unwrap().text(), "second");
}

#[tokio::test]
async fn fifo_without_waiting_consumer() {
    let q = start_queue(10);
    for i in 0..4 {
        q.put(mk_msg(&format!("m{i}"))).unwrap();
    }
    for i in 0..4 {
        assert_eq!(q.fetch().await.unwrap().text(), format!("m{i}"));
    }
}

#[tokio::test]
async fn newer_fetch_replaces_parked_one() {
    let q = start_queue(3);
    let first = q.fetch();
    let second = q.fetch();
    q.put(mk_msg("only")).unwrap();

    assert_eq!(second.await.unwrap().text(), "only");
    assert!(first.await.is_none());
}

#[tokio::test]
async fn check_never_blocks_on_empty() {
    let q = start_queue(3);
    let res = tokio::time::timeout(Duration::from_millis(100), q.check()).await;
    assert_eq!(res.expect("check blocked"), false);
}

#[tokio::test]
async fn shutdown_releases_parked_fetch_and_rejects_puts() {
    let q = start_queue(3);
    let pending = q.fetch();
    q.shutdown().await;

    assert!(pending.await.is_none());
    assert!(matches!(q.put(mk_msg("late")), Err(DispatchError::Closed)));
    assert!(!q.check().await);
    assert!(q.snapshot().await.is_none());
}

#[tokio::test]
async fn concurrent_submitters_lose_nothing_under_capacity() {
    let q = start_queue(100);
    let mut tasks = Vec::new();
    for t in 0..4 {
        let q = q.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..10 {
                q.put(mk_msg(&format!("t{t}-{i}"))).unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    let stats = q.snapshot().await.unwrap();
    assert_eq!(stats.queued, 40);
    assert_eq!(stats.dropped_overflow, 0);
}
