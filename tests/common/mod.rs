use std::time::Duration;

use inventory_hub::clients::NotificationSubscriber;
use inventory_hub::lifecycle::{ServiceHost, Settings};

pub async fn start_host() -> ServiceHost {
    ServiceHost::start(&Settings::ephemeral())
        .await
        .expect("host should start")
}

/// Connects an observer and waits until the host has registered it, so no later event is
/// missed.
pub async fn subscribe(host: &ServiceHost) -> NotificationSubscriber {
    let before = host.notifier().observer_count();
    let subscriber = NotificationSubscriber::connect(host.notify_addr())
        .await
        .expect("observer should connect");
    for _ in 0..200 {
        if host.notifier().observer_count() > before {
            return subscriber;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("observer was never registered");
}

pub async fn next_event(subscriber: &mut NotificationSubscriber) -> String {
    tokio::time::timeout(Duration::from_secs(2), subscriber.next_event())
        .await
        .expect("event should arrive")
        .expect("channel should stay readable")
        .expect("channel should stay open")
}
