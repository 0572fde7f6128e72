use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

fn fixture_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/config.yaml")
}

#[test]
fn list_prints_merged_lines() {
    let mut cmd = Command::cargo_bin("shoplist").expect("Binary exists");
    cmd.arg("list")
        .arg("--config")
        .arg(fixture_config())
        .arg("--user")
        .arg("1")
        .env_remove("SHOPLIST_FONT_PATH");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Flour (g) — 500").and(predicate::str::contains("Sugar (g) — 50")));
}

#[test]
fn list_json_prints_structured_lines() {
    let mut cmd = Command::cargo_bin("shoplist").expect("Binary exists");
    let output = cmd
        .arg("list")
        .arg("--config")
        .arg(fixture_config())
        .arg("--user")
        .arg("1")
        .arg("--json")
        .env_remove("SHOPLIST_FONT_PATH")
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(lines[0]["name"], "Flour");
    assert_eq!(lines[0]["measurement_unit"], "g");
    assert_eq!(lines[0]["total_amount"], 500);
    assert_eq!(lines[1]["name"], "Sugar");
}

#[test]
fn download_writes_pdf_file() {
    let out_dir = tempdir().unwrap();
    let out_path = out_dir.path().join("shop_list.pdf");

    let mut cmd = Command::cargo_bin("shoplist").expect("Binary exists");
    cmd.arg("download")
        .arg("--config")
        .arg(fixture_config())
        .arg("--user")
        .arg("1")
        .arg("--output")
        .arg(&out_path)
        .env_remove("SHOPLIST_FONT_PATH");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote shop_list.pdf"));

    let bytes = std::fs::read(&out_path).expect("PDF written");
    assert_eq!(&bytes[0..4], b"%PDF", "PDF file missing magic header");
}

#[test]
fn ingredients_filters_by_prefix() {
    let mut cmd = Command::cargo_bin("shoplist").expect("Binary exists");
    cmd.arg("ingredients")
        .arg("--config")
        .arg(fixture_config())
        .arg("--prefix")
        .arg("Fl")
        .env_remove("SHOPLIST_FONT_PATH");

    cmd.assert().success().stdout(
        predicate::str::contains("Flour (g)")
            .and(predicate::str::contains("Flour (kg)"))
            .and(predicate::str::contains("Sugar").not()),
    );
}

#[test]
fn missing_config_fails() {
    let mut cmd = Command::cargo_bin("shoplist").expect("Binary exists");
    cmd.arg("list")
        .arg("--config")
        .arg("/nonexistent/shoplist.yaml")
        .arg("--user")
        .arg("1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let msg = format!("{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use shoplist::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::List {
            config: PathBuf::from("dummy.yaml"),
            user: 1,
            json: false,
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
