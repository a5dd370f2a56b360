use giri_board::config::{BackendConfig, ModemConfig, SerialConfig};
use giri_board::core::protocol;
use giri_board::domain::ports::SerialLink;
use giri_board::{
    notification_channels, spawn_board, spawn_frame_reader, HttpBackend, JudgeCommand,
};
use httpmock::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Link that replays queued modem output, then stays silent.
struct ReplayLink {
    bursts: VecDeque<Vec<u8>>,
}

impl ReplayLink {
    fn with_frames(payloads: &[&str]) -> Self {
        let bursts = payloads
            .iter()
            .map(|payload| format!("{}\r\n", protocol::encode_frame(payload)).into_bytes())
            .collect();
        Self { bursts }
    }
}

impl SerialLink for ReplayLink {
    fn bytes_available(&mut self) -> giri_board::Result<usize> {
        Ok(self.bursts.front().map_or(0, Vec::len))
    }

    fn read_available(&mut self, buf: &mut [u8]) -> giri_board::Result<usize> {
        let Some(burst) = self.bursts.pop_front() else {
            return Ok(0);
        };
        buf[..burst.len()].copy_from_slice(&burst);
        Ok(burst.len())
    }

    fn write_all(&mut self, _data: &[u8]) -> giri_board::Result<()> {
        Ok(())
    }
}

fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: server.base_url(),
        roster_load_delay_ms: 0,
        request_timeout_seconds: 5,
        ..BackendConfig::default()
    }
}

fn fast_serial() -> SerialConfig {
    SerialConfig {
        poll_interval_ms: 5,
        ..SerialConfig::default()
    }
}

fn no_modem() -> ModemConfig {
    ModemConfig {
        enabled: false,
        ..ModemConfig::default()
    }
}

#[tokio::test]
async fn test_judge_remote_set_end_to_end() {
    let server = MockServer::start_async().await;
    let roster_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/dashboard_get/")
                .query_param("platform", "1")
                .query_param("competition", "1");
            then.status(200).body("{'7': 'Ann A A'}");
        })
        .await;
    let result_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/dashboard_set/")
                .query_param("sportsmenid", "7")
                .query_param("competition", "1")
                .query_param("result", "5");
            then.status(200).body("saved");
        })
        .await;

    let config = backend_config(&server);
    let backend = Arc::new(HttpBackend::new(&config).unwrap());
    let (bus, mut ui) = notification_channels();
    let (board, board_task) = spawn_board(backend, &config, bus);

    assert_eq!(ui.visibility.recv().await, Some(true));
    assert_eq!(ui.name.recv().await.unwrap(), "Ann A A");
    roster_mock.assert_async().await;

    let link = ReplayLink::with_frames(&[
        "ID8888888888888888COM3P00END",
        "ID8888888888888888COM1P0001END",
        "ID8888888888888888COM1P0002END",
        "ID8888888888888888COM1P0003END",
        "ID8888888888888888COM1P0004END",
        "ID8888888888888888COM1P0005END",
        "ID8888888888888888COM4P00END",
    ]);
    let reader = spawn_frame_reader(link, &fast_serial(), &no_modem(), board.clone());

    let mut counters = Vec::new();
    while counters.last().map(String::as_str) != Some("0") {
        counters.push(ui.counter.recv().await.unwrap());
    }
    assert_eq!(counters, vec!["1", "2", "3", "4", "5", "0"]);
    assert_eq!(ui.timer.recv().await.unwrap(), "00:00");
    // Single athlete: the roster wraps back to the same name.
    assert_eq!(ui.name.recv().await.unwrap(), "Ann A A");

    for _ in 0..100 {
        if result_mock.hits_async().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    result_mock.assert_async().await;

    let snapshot = board.snapshot().await.unwrap();
    assert_eq!(snapshot.scoring.repetition_count, 0);
    assert_eq!(snapshot.scoring.last_committed_count, 5);
    assert_eq!(snapshot.athlete.unwrap().id, "7");

    board.shutdown().await.unwrap();
    board_task.await.unwrap();
    tokio_test::assert_ok!(reader.await.unwrap());
}

#[tokio::test]
async fn test_roster_reload_after_backend_recovers() {
    let server = MockServer::start_async().await;
    let mut failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/dashboard_get/");
            then.status(503);
        })
        .await;

    let config = backend_config(&server);
    let backend = Arc::new(HttpBackend::new(&config).unwrap());
    let (bus, mut ui) = notification_channels();
    let (board, _board_task) = spawn_board(backend, &config, bus);

    assert_eq!(ui.visibility.recv().await, Some(false));
    assert_eq!(board.snapshot().await.unwrap().athlete, None);

    failing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dashboard_get/");
            then.status(200).body(r#"{"3": "Cid C C", "4": "Dee D D"}"#);
        })
        .await;

    board.reload_roster().await.unwrap();
    assert_eq!(ui.visibility.recv().await, Some(true));
    assert_eq!(ui.name.recv().await.unwrap(), "Cid C C");

    let snapshot = board.snapshot().await.unwrap();
    assert_eq!(snapshot.roster_len, 2);
}

#[tokio::test]
async fn test_zero_result_is_not_submitted() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dashboard_get/");
            then.status(200).body("{'7': 'Ann A A', '8': 'Bob B B'}");
        })
        .await;
    let result_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/dashboard_set/");
            then.status(200);
        })
        .await;

    let config = backend_config(&server);
    let backend = Arc::new(HttpBackend::new(&config).unwrap());
    let (bus, mut ui) = notification_channels();
    let (board, _board_task) = spawn_board(backend, &config, bus);
    assert_eq!(ui.name.recv().await.unwrap(), "Ann A A");

    board.send(JudgeCommand::Commit).await.unwrap();
    assert_eq!(ui.name.recv().await.unwrap(), "Bob B B");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(result_mock.hits_async().await, 0);
}
