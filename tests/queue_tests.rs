use product_queue::{Item, ListStore, MemoryStore, QueueDrainer, QueueError, queue_key};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ProductInfo {
    sku: String,
    qty: u32,
}

fn product(sku: &str, qty: u32) -> ProductInfo {
    ProductInfo {
        sku: sku.to_string(),
        qty,
    }
}

#[tokio::test]
async fn test_shop_scenario() {
    let mut drainer = QueueDrainer::new(MemoryStore::new());

    assert_ok!(drainer.publish(&json!({"sku": "A1", "qty": 3}), "shop").await);
    assert_ok!(drainer.publish(&json!({"sku": "B2", "qty": 1}), "shop").await);

    let items = drainer.drain("shop").unwrap().collect_all().await.unwrap();
    let decoded: Vec<ProductInfo> = items.iter().map(|item| item.decode().unwrap()).collect();

    assert_eq!(decoded, vec![product("A1", 3), product("B2", 1)]);
    assert_eq!(drainer.len("shop").await.unwrap(), 0);
}

#[tokio::test]
async fn test_n_pushes_drain_in_order() {
    let mut drainer = QueueDrainer::new(MemoryStore::new());
    let pushed: Vec<ProductInfo> = (0..25).map(|i| product(&format!("SKU{}", i), i)).collect();

    for p in &pushed {
        drainer.publish(p, "http://le-narguile.com").await.unwrap();
    }

    let mut drain = drainer.drain("http://le-narguile.com").unwrap();
    let mut drained = Vec::new();
    while let Some(item) = drain.next().await.unwrap() {
        drained.push(item.decode::<ProductInfo>().unwrap());
    }

    assert_eq!(drain.yielded(), pushed.len());
    assert_eq!(drained, pushed);
    assert_eq!(drainer.len("http://le-narguile.com").await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_name_is_rejected_everywhere() {
    let store = MemoryStore::new();
    let mut drainer = QueueDrainer::new(store.clone());

    assert!(matches!(drainer.drain(""), Err(QueueError::InvalidArgument { .. })));
    assert!(matches!(
        drainer.publish(&json!({"sku": "A1"}), "").await,
        Err(QueueError::InvalidArgument { .. })
    ));
    assert_err!(drainer.len("").await);
    assert_eq!(store.round_trips(), 0);
}

#[tokio::test]
async fn test_concurrent_drainers_split_items() {
    let store = MemoryStore::new();
    let mut producer = QueueDrainer::new(store.clone());
    producer.publish(&product("A1", 3), "shop").await.unwrap();
    producer.publish(&product("B2", 1), "shop").await.unwrap();

    let mut first = QueueDrainer::new(store.clone());
    let mut second = QueueDrainer::new(store.clone());

    let (a, b) = tokio::join!(
        async { first.drain("shop").unwrap().collect_all().await.unwrap() },
        async { second.drain("shop").unwrap().collect_all().await.unwrap() },
    );

    let all: Vec<Item> = a.into_iter().chain(b).collect();
    assert_eq!(all.len(), 2);

    let skus: HashSet<String> = all
        .iter()
        .map(|item| item.decode::<ProductInfo>().unwrap().sku)
        .collect();
    assert_eq!(skus, HashSet::from(["A1".to_string(), "B2".to_string()]));
    assert!(store.snapshot(&queue_key("shop").unwrap()).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_drainers_on_threads() {
    let store = MemoryStore::new();
    let mut producer = QueueDrainer::new(store.clone());
    for i in 0..200 {
        producer.publish(&product("X", i), "bulk").await.unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut drainer = QueueDrainer::new(store);
                let items = drainer.drain("bulk").unwrap().collect_all().await.unwrap();
                items
                    .iter()
                    .map(|item| item.decode::<ProductInfo>().unwrap().qty)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = Vec::new();
    for handle in handles {
        let qtys = handle.await.unwrap();
        // 单个消费者看到的顺序仍是 FIFO
        assert!(qtys.windows(2).all(|w| w[0] < w[1]));
        seen.extend(qtys);
    }

    seen.sort_unstable();
    assert_eq!(seen, (0..200).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_drain_and_publish_share_key() {
    let mut store = MemoryStore::new();
    let mut drainer = QueueDrainer::new(store.clone());

    drainer.publish(&product("A1", 3), "shop").await.unwrap();
    assert_eq!(store.len("shop:product_info").await.unwrap(), 1);

    let drain = drainer.drain("shop").unwrap();
    assert_eq!(drain.key(), "shop:product_info");
}

#[tokio::test]
async fn test_bounded_drain_with_external_deadline() {
    let mut drainer = QueueDrainer::new(MemoryStore::new());
    for i in 0..3 {
        drainer.publish(&product("A1", i), "shop").await.unwrap();
    }

    let drained = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        drainer.drain("shop").unwrap().collect_all().await
    })
    .await
    .expect("drain finished in time")
    .unwrap();
    assert_eq!(drained.len(), 3);
}

#[tokio::test]
async fn test_close_releases_store() {
    let store = MemoryStore::new();
    let mut drainer = QueueDrainer::new(store.clone());
    assert!(drainer.ping().await.unwrap());
    drainer.close();

    let mut other = QueueDrainer::new(store);
    assert_eq!(other.len("shop").await.unwrap(), 0);
}
