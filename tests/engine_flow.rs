//! End-to-end: host events and sensor fetches in, pushed key frames out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_graphics::prelude::*;
use ohm_deck::catalog::parse_catalog;
use ohm_deck::config::{HISTORY_CAPACITY, KEY_SIZE, POLL_INTERVAL};
use ohm_deck::{
    DisplayType, Engine, Error, HostEvent, KeyId, MemorySink, Result, SensorReading, SensorSource, SettingsMap,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Serves whatever readings are currently set; `None` answers 503.
#[derive(Clone, Default)]
struct StubMonitor {
    readings: Arc<Mutex<Option<Vec<SensorReading>>>>,
    fetches: Arc<Mutex<usize>>,
}

impl StubMonitor {
    fn set(
        &self,
        readings: Vec<SensorReading>,
    ) {
        *self.readings.lock().unwrap() = Some(readings);
    }

    fn go_down(&self) { *self.readings.lock().unwrap() = None; }

    fn fetches(&self) -> usize { *self.fetches.lock().unwrap() }
}

impl SensorSource for StubMonitor {
    async fn fetch(&self) -> Result<Vec<SensorReading>> {
        *self.fetches.lock().unwrap() += 1;
        let current = self.readings.lock().unwrap().clone();
        current.ok_or(Error::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

fn settings(value: Value) -> SettingsMap {
    match value {
        Value::Object(map) => map,
        other => panic!("settings must be an object, got {other}"),
    }
}

fn show(
    key: &str,
    value: Value,
) -> HostEvent {
    HostEvent::KeyShown {
        key: key.into(),
        settings: settings(value),
    }
}

fn engine(monitor: &StubMonitor) -> Engine<StubMonitor, MemorySink> {
    Engine::new(monitor.clone(), MemorySink::new(), POLL_INTERVAL, Size::new_equal(KEY_SIZE))
}

fn history_values(
    engine: &Engine<StubMonitor, MemorySink>,
    key: &str,
) -> Vec<f64> {
    engine
        .registry()
        .lookup(&KeyId::from(key))
        .map(|b| b.history().iter().filter_map(SensorReading::numeric_value).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_history_keeps_the_latest_sixty_in_order() {
    let monitor = StubMonitor::default();
    let mut engine = engine(&monitor);
    engine.handle_event(show("cpu", json!({ "sensor_name": "CPU Total", "sensor_type": "line" })));

    for i in 0..100 {
        monitor.set(vec![SensorReading::new("CPU Total", f64::from(i)).with_range(0.0, 100.0)]);
        engine.poll_once().await.unwrap();
        assert!(history_values(&engine, "cpu").len() <= HISTORY_CAPACITY);
    }

    let expected: Vec<f64> = (40..100).map(f64::from).collect();
    assert_eq!(history_values(&engine, "cpu"), expected, "Exactly the most recent 60, oldest first");
}

#[tokio::test]
async fn test_one_reading_reaches_every_key_watching_it() {
    let monitor = StubMonitor::default();
    monitor.set(vec![
        SensorReading::new("cpu", "35 %").with_range(0.0, 100.0),
        SensorReading::new("gpu", "61 °C").with_range(30.0, 90.0),
        SensorReading::new("unwatched", "1"),
    ]);

    let mut engine = engine(&monitor);
    engine.handle_event(show("k1", json!({ "sensor_name": "cpu" })));
    engine.handle_event(show("k2", json!({ "sensor_name": "cpu", "sensor_type": "knob" })));
    engine.handle_event(show("k3", json!({ "sensor_name": "gpu", "sensor_type": "line" })));

    let delivered = engine.poll_once().await.unwrap();
    assert_eq!(delivered, 3, "Unmatched sensor names produce no deliveries");
    assert_eq!(monitor.fetches(), 1);

    assert_eq!(history_values(&engine, "k1"), [35.0]);
    assert_eq!(history_values(&engine, "k2"), [35.0]);
    assert_eq!(history_values(&engine, "k3"), [61.0]);

    let sink = engine.sink();
    for key in ["k1", "k2", "k3"] {
        assert_eq!(sink.pushes_for(&key.into()), 1, "{key} should get exactly one frame");
    }
}

#[tokio::test]
async fn test_flat_sparkline_renders_without_dividing_by_zero() {
    let monitor = StubMonitor::default();
    let mut engine = engine(&monitor);
    engine.handle_event(show("fan", json!({ "sensor_name": "Fan", "sensor_type": "line" })));

    monitor.set(vec![SensorReading::new("Fan", 5.0).with_range(5.0, 5.0)]);
    for _ in 0..5 {
        engine.poll_once().await.unwrap();
    }

    let binding = engine.registry().lookup(&"fan".into()).unwrap();
    assert_eq!(binding.display_type(), DisplayType::Sparkline);

    let frame = engine.sink().last_for(&"fan".into()).unwrap();
    let bottom = KEY_SIZE as i32 - 1;
    let fg = binding.theme().foreground;
    assert_eq!(frame.pixel(Point::new(5, bottom)), Some(fg), "Flat series is drawn along the bottom of [5, 6]");
}

#[tokio::test]
async fn test_failed_fetch_leaves_keys_as_they_were() {
    let monitor = StubMonitor::default();
    monitor.set(vec![SensorReading::new("cpu", "20 %").with_range(0.0, 100.0)]);
    let mut engine = engine(&monitor);
    engine.handle_event(show("k1", json!({ "sensor_name": "cpu", "sensor_type": "knob" })));
    engine.poll_once().await.unwrap();
    let before = engine.sink().last_for(&"k1".into()).cloned();

    monitor.go_down();
    let err = engine.poll_once().await.unwrap_err();
    assert!(err.is_fetch(), "503 is a fetch failure");
    assert_eq!(history_values(&engine, "k1"), [20.0]);
    assert_eq!(engine.sink().len(), 1, "Nothing pushed on the failed tick");
    assert_eq!(engine.sink().last_for(&"k1".into()).cloned(), before);

    monitor.set(vec![SensorReading::new("cpu", "80 %").with_range(0.0, 100.0)]);
    engine.poll_once().await.unwrap();
    assert_eq!(history_values(&engine, "k1"), [20.0, 80.0], "Delivery resumes on the next good tick");
    assert_ne!(engine.sink().last_for(&"k1".into()).cloned(), before);
}

#[tokio::test(start_paused = true)]
async fn test_timer_restarts_exactly_once_after_last_key_leaves() {
    let monitor = StubMonitor::default();
    monitor.set(vec![SensorReading::new("cpu", "1 %")]);
    let mut engine = engine(&monitor);
    let (tx, rx) = mpsc::channel(8);

    let host = async {
        tx.send(show("k1", json!({ "sensor_name": "cpu" }))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        tx.send(HostEvent::KeyHidden { key: "k1".into() }).await.unwrap();

        // Quiet period with no keys: no fetches
        tokio::time::sleep(Duration::from_secs(10)).await;

        tx.send(show("k2", json!({ "sensor_name": "cpu" }))).await.unwrap();
        tx.send(show("k3", json!({ "sensor_name": "cpu" }))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        drop(tx);
    };
    tokio::join!(engine.run(rx), host);

    assert_eq!(engine.registry().timer().starts(), 2, "One start per empty -> non-empty transition");
    assert_eq!(monitor.fetches(), 4, "Two ticks per visible period, none while empty");
    assert_eq!(history_values(&engine, "k2"), [1.0, 1.0]);
}

#[test]
fn test_catalog_prefix_rule_fixture() {
    let json = r#"{"Text":"A","id":1,"Children":[{"Text":"B","id":2,"Children":[{"Text":"C","id":3}]}]}"#;
    let names: Vec<String> = parse_catalog(json.as_bytes())
        .unwrap()
        .iter()
        .map(|r| r.full_name().to_string())
        .collect();
    assert_eq!(names, ["A", "B", "B/C"]);
}
