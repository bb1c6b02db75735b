use assert_fs::prelude::*;
use predicates::prelude::*;

use calltrail::config::{Config, OutputFormat};
use calltrail::core::FsSourceStore;
use calltrail::Engine;

fn project() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();

    temp.child("lib/app/order.ex")
        .write_str(
            r#"
defmodule App.Order do
  def place(data) do
    data
    |> App.Validate.check()
    |> App.Payments.charge()
  end

  def cancel(order), do: App.Notify.send(order)
end
"#,
        )
        .unwrap();
    temp.child("lib/app/validate.ex")
        .write_str(
            r#"
defmodule App.Validate do
  def check(data), do: data
end
"#,
        )
        .unwrap();
    temp.child("lib/app/payments/payments.ex")
        .write_str(
            r#"
defmodule App.Payments do
  def charge(order) do
    order
    |> App.Gateway.authorize()
    |> App.Ledger.record()
  end
end
"#,
        )
        .unwrap();
    temp.child("lib/app/broken.ex")
        .write_str("defmodule App.Broken do\n  def oops( do\nend\n")
        .unwrap();

    temp
}

fn engine_for(temp: &assert_fs::TempDir) -> Engine {
    let mut config = Config::default();
    config.project.source_locations = vec![format!("{}/lib/**/*.ex", temp.path().display())];
    config.project.output_dir = temp.path().join("diagrams");
    Engine::with_config(config, Box::new(FsSourceStore)).unwrap()
}

#[tokio::test]
async fn generates_expanded_sequence_diagram() {
    let temp = project();
    let mut engine = engine_for(&temp);

    let source = temp.child("lib/app/order.ex");
    let written = engine
        .generate(source.path(), "place", None, None)
        .await
        .unwrap();

    let diagram = temp.child("diagrams/App.Order.place.md");
    assert_eq!(written, diagram.path());
    diagram.assert(predicate::path::exists());
    diagram.assert(
        "```mermaid\n\
sequenceDiagram\n\
participant App.Order\n\
participant App.Validate\n\
participant App.Payments\n\
participant App.Gateway\n\
participant App.Ledger\n\
App.Order->>App.Validate: check\n\
App.Validate-->>App.Order: check response\n\
App.Order->>App.Payments: charge\n\
App.Payments-->>App.Order: charge response\n\
App.Payments->>App.Gateway: authorize\n\
App.Gateway-->>App.Payments: authorize response\n\
App.Payments->>App.Ledger: record\n\
App.Ledger-->>App.Payments: record response\n\
```\n\
\n",
    );
}

#[tokio::test]
async fn unknown_function_renders_single_participant() {
    let temp = project();
    let mut engine = engine_for(&temp);
    let output = temp.child("out/missing.md");

    engine
        .generate(temp.child("lib/app/order.ex").path(), "refund", Some(output.path().to_path_buf()), None)
        .await
        .unwrap();

    output.assert(predicate::str::contains("participant App.Order\n"));
    output.assert(predicate::str::contains("->>").not());
}

#[tokio::test]
async fn json_output_lists_call_records() {
    let temp = project();
    let mut engine = engine_for(&temp);

    let written = engine
        .generate(temp.child("lib/app/order.ex").path(), "cancel", None, Some(OutputFormat::Json))
        .await
        .unwrap();

    assert!(written.ends_with("App.Order.cancel.json"));
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(value["entry_module"], "App.Order");
    assert_eq!(value["calls"][0]["caller"], "App.Order");
    assert_eq!(value["calls"][0]["callee"], "App.Notify");
    assert_eq!(value["calls"][0]["function"], "send");
}

#[tokio::test]
async fn broken_entry_unit_is_an_error() {
    let temp = project();
    let mut engine = engine_for(&temp);

    let result = engine
        .generate(temp.child("lib/app/broken.ex").path(), "oops", None, None)
        .await;

    assert!(result.is_err());
    temp.child("diagrams").assert(predicate::path::missing());
}

#[test]
fn index_skips_broken_units() {
    let temp = project();
    let mut engine = engine_for(&temp);

    let index = engine.build_index();
    let modules: Vec<&str> = index.module_names().collect();

    assert_eq!(modules, vec!["App.Order", "App.Payments", "App.Validate"]);
    assert_eq!(index.diagnostics().len(), 1);
    assert!(index.diagnostics()[0].path.ends_with("lib/app/broken.ex"));
}
