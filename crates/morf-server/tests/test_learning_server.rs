use morf_core::{Learner, LearnerConfig, ModelConfig};
use morf_server::{LearningServer, MessageClient, Request, Response};
use morf_test_data::TestDataSet;
use std::path::Path;
use std::time::Duration;

fn learner(data_dir: &Path) -> Learner {
    let mut config = LearnerConfig::new(data_dir, 1);
    config.model = ModelConfig {
        point_dims: vec![8, 16],
        head_dims: vec![8],
    };
    config.training.seed = Some(3);
    let device = morf_core::device(true).unwrap();
    Learner::new(config, device).unwrap()
}

#[tokio::test]
async fn test_learning_server_session() {
    let (root, _temp) = TestDataSet::linkers_01().create_temp().unwrap();
    let server = LearningServer::bind("127.0.0.1:0", learner(&root))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let running = tokio::spawn(server.run());

    let mut client = MessageClient::connect(addr).await.unwrap();

    let time = client.send(&Request::Time).await.unwrap();
    assert!(time.is_ok());

    assert_eq!(client.add("0001").await.unwrap(), 1);
    assert_eq!(client.add("0002").await.unwrap(), 2);

    let fit = client.fit().await.unwrap();
    assert_eq!(fit.keys.len(), 2);
    assert_eq!(fit.feature_shape, vec![2, 16, 3]);
    assert_eq!(fit.property_shape, vec![2, 1]);
    assert!(fit.loss.is_finite());

    let estimate = client.predict("0003").await.unwrap();
    assert_eq!(estimate.len(), 1);

    // 0004 is stored both as a simulated and as a candidate linker
    let candidate = client.predict_possible("0004").await.unwrap();
    assert_eq!(candidate, client.predict("0004").await.unwrap());
    let not_a_candidate = client
        .send(&Request::PredictPossible("0001".into()))
        .await
        .unwrap();
    assert!(matches!(not_a_candidate, Response::Err(_)));

    // failures are reported and the connection stays usable
    let missing = client.send(&Request::Add("9999".into())).await.unwrap();
    assert!(matches!(missing, Response::Err(_)));
    let unknown = client.send_message("train 10").await.unwrap();
    assert!(matches!(unknown, Response::Err(_)));
    let len = client.send(&Request::Len).await.unwrap();
    assert_eq!(len, Response::Ok("2".to_string()));
    assert_eq!(client.len().await.unwrap(), 2);

    let weights = root.join("weights.safetensors");
    client.save(&weights).await.unwrap();
    assert!(weights.is_file());

    client.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_handle_stops_idle_server() {
    let (root, _temp) = TestDataSet::linkers_01().create_temp().unwrap();
    let server = LearningServer::bind("127.0.0.1:0", learner(&root))
        .await
        .unwrap();
    let handle = server.shutdown_handle();
    let running = tokio::spawn(server.run());

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_before_run() {
    let (root, _temp) = TestDataSet::linkers_01().create_temp().unwrap();
    let server = LearningServer::bind("127.0.0.1:0", learner(&root))
        .await
        .unwrap();
    server.shutdown_handle().shutdown();
    tokio::time::timeout(Duration::from_secs(3), server.run())
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_two_clients_share_one_learner() {
    let (root, _temp) = TestDataSet::linkers_01().create_temp().unwrap();
    let server = LearningServer::bind("127.0.0.1:0", learner(&root))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.shutdown_handle();
    let running = tokio::spawn(server.run());

    let mut first = MessageClient::connect(addr).await.unwrap();
    let mut second = MessageClient::connect(addr).await.unwrap();
    assert_eq!(first.add("0001").await.unwrap(), 1);
    assert_eq!(second.add("0002").await.unwrap(), 2);

    handle.shutdown();
    running.await.unwrap().unwrap();
}
