mod common;

use std::time::Duration;

use common::{next_event, start_host, subscribe};
use inventory_hub::model::ProductCreate;

#[tokio::test]
async fn test_every_observer_sees_events_in_order() {
    let host = start_host().await;
    let mut first = subscribe(&host).await;
    let mut second = subscribe(&host).await;
    let service = host.service();

    let lamp = service
        .add_product(ProductCreate::new("Lamp", 30.0, 6))
        .await
        .unwrap();
    assert!(service.sell(lamp.id, 2).await.unwrap());

    for observer in [&mut first, &mut second] {
        assert_eq!(next_event(observer).await, "System: New product added - Lamp");
        assert_eq!(next_event(observer).await, "ALERT: Low stock for Lamp (Qty: 4)");
        assert_eq!(
            next_event(observer).await,
            format!("Sale: 2 units of item {} sold.", lamp.id)
        );
    }

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_departed_observer_does_not_disturb_others() {
    let host = start_host().await;
    let departed = subscribe(&host).await;
    let mut staying = subscribe(&host).await;
    assert_eq!(host.notifier().observer_count(), 2);

    drop(departed);
    for _ in 0..200 {
        if host.notifier().observer_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(host.notifier().observer_count(), 1);

    host.service()
        .add_product(ProductCreate::new("Chair", 45.0, 12))
        .await
        .unwrap();
    assert_eq!(next_event(&mut staying).await, "System: New product added - Chair");

    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_late_observer_misses_earlier_events() {
    let host = start_host().await;
    host.service()
        .add_product(ProductCreate::new("Desk", 120.0, 2))
        .await
        .unwrap();

    let mut late = subscribe(&host).await;
    host.service()
        .add_product(ProductCreate::new("Shelf", 60.0, 8))
        .await
        .unwrap();

    assert_eq!(next_event(&mut late).await, "System: New product added - Shelf");
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_notification_channel() {
    let host = start_host().await;
    let mut observer = subscribe(&host).await;

    host.shutdown().await.unwrap();

    let end = tokio::time::timeout(Duration::from_secs(2), observer.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(end, None);
}
