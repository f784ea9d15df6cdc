use gramspec::data::Dataset;
use gramspec::schema::Schema;
use gramspec::{generate_chart_spec, ChartConfig, ChartError, ChartRequest, ChartType, Theme, ViewportOptions};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run the gramspec binary with `args`, feeding `stdin` when given
fn run_gramspec(args: &[&str], stdin: Option<&str>) -> Result<String, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_gramspec"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn parse_output(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("Output is not valid JSON")
}

fn load_schema(path: &str) -> Schema {
    let raw = fs::read_to_string(path).expect("Failed to read schema");
    Schema::from_json(&serde_json::from_str(&raw).unwrap()).unwrap()
}

fn sales_request() -> ChartRequest {
    let schema = load_schema("test/sales_schema.json");
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let data = Dataset::from_csv(csv.as_bytes(), &schema).unwrap();
    ChartRequest::new(schema, data)
}

fn cities_request() -> ChartRequest {
    let schema = load_schema("test/cities_schema.json");
    let raw = fs::read_to_string("test/cities.json").expect("Failed to read test data");
    let data = Dataset::from_json(&serde_json::from_str(&raw).unwrap()).unwrap();
    ChartRequest::new(schema, data)
}

// =============================================================================
// Library
// =============================================================================

#[test]
fn test_sales_default_is_line_chart() {
    let spec = generate_chart_spec(&sales_request()).unwrap().into_value();
    assert_eq!(spec["$schema"], json!("https://vega.github.io/schema/vega-lite/v6.json"));
    assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 5);
    assert_eq!(spec["data"]["values"][0]["revenue"], json!(1200.5));

    let ghost = &spec["layer"][0];
    assert_eq!(ghost["mark"]["type"], json!("line"));
    assert_eq!(ghost["encoding"]["x"]["field"], json!("date"));
    assert_eq!(ghost["encoding"]["x"]["type"], json!("temporal"));
    assert_eq!(ghost["encoding"]["y"]["title"], json!("Gross Revenue"));
    assert_eq!(ghost["encoding"]["detail"], json!({"field": "region"}));
}

#[test]
fn test_every_eligible_kind_compiles() {
    let request = sales_request();
    for kind in gramspec::resolve::determine_eligible_chart_types(&request.schema) {
        let req = request.clone().with_config(ChartConfig::of_type(kind));
        let spec = generate_chart_spec(&req).unwrap_or_else(|e| panic!("{} failed: {:#}", kind, e));
        assert!(spec.get("$schema").is_some(), "{} has no $schema", kind);
    }
}

#[test]
fn test_kind_with_only_color_gets_axis_defaults() {
    let mut config = ChartConfig::of_type(ChartType::Bar);
    config.color_field = Some("region".into());
    let spec = generate_chart_spec(&sales_request().with_config(config)).unwrap().into_value();

    let encoding = &spec["encoding"];
    assert_eq!(spec["mark"]["type"], json!("bar"));
    assert_eq!(encoding["x"]["field"], json!("region"));
    assert_eq!(encoding["y"]["field"], json!("revenue"));
    assert_eq!(encoding["order"]["field"], json!("revenue"));
    assert_eq!(encoding["color"]["field"], json!("region"));
}

#[test]
fn test_dark_mobile_bar_chart() {
    let mut config = ChartConfig::of_type(ChartType::BarH);
    config.y_field = Some("region".into());
    config.x_field = Some("units".into());
    let request = sales_request()
        .with_config(config)
        .with_theme(Theme::Dark)
        .with_viewport(ViewportOptions::mobile(360, 640));
    let spec = generate_chart_spec(&request).unwrap().into_value();
    assert_eq!(spec["mark"]["type"], json!("bar"));
    assert_eq!(spec["encoding"]["y"]["field"], json!("region"));
    assert!(spec["encoding"]["y"]["axis"]["labelExpr"].as_str().unwrap().contains("13"));
}

#[test]
fn test_cities_default_to_bar_but_map_uses_albers() {
    let default = generate_chart_spec(&cities_request()).unwrap().into_value();
    assert_eq!(default["mark"]["type"], json!("bar"));

    let request = cities_request().with_config(ChartConfig::of_type(ChartType::UsaMap));
    let spec = generate_chart_spec(&request).unwrap().into_value();
    assert_eq!(spec["projection"], json!({"type": "albersUsa"}));
    let points = &spec["layer"][1];
    assert_eq!(points["encoding"]["longitude"]["field"], json!("lon"));
    assert_eq!(points["encoding"]["latitude"]["field"], json!("lat"));
}

#[test]
fn test_treemap_without_label_field_fails() {
    let schema = Schema::from_json(&json!({"amount": {"type": "number"}})).unwrap();
    let request = ChartRequest::new(schema, Dataset::default()).with_config(ChartConfig::of_type(ChartType::Treemap));
    let err = generate_chart_spec(&request).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChartError>(),
        Some(ChartError::MissingField { chart: "treemap", .. })
    ));
}

#[test]
fn test_map_without_location_fails() {
    let mut config = ChartConfig::of_type(ChartType::UsaMap);
    config.color_field = Some("units".into());
    let err = generate_chart_spec(&sales_request().with_config(config)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unsupported map configuration: must provide either xField and yField for scatter plot or geoField"
    );
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn test_cli_csv_from_stdin() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let stdout = run_gramspec(&["--schema", "test/sales_schema.json", "--format", "csv"], Some(&csv)).unwrap();
    let spec = parse_output(&stdout);
    assert_eq!(spec["layer"][0]["mark"]["type"], json!("line"));
}

#[test]
fn test_cli_shorthand_config_and_title() {
    let stdout = run_gramspec(
        &[
            "--schema",
            "test/sales_schema.json",
            "--data",
            "test/sales.csv",
            "--format",
            "csv",
            "--config",
            "bar(x: region, y: units, show_title: true)",
            "--title",
            "Units by region",
        ],
        None,
    )
    .unwrap();
    let spec = parse_output(&stdout);
    assert_eq!(spec["mark"]["type"], json!("bar"));
    assert_eq!(spec["encoding"]["x"]["field"], json!("region"));
    assert_eq!(spec["title"], json!("Units by region"));
}

#[test]
fn test_cli_json_config_and_selection() {
    let stdout = run_gramspec(
        &[
            "--schema",
            "test/sales_schema.json",
            "--data",
            "test/sales.csv",
            "--format",
            "csv",
            "--config",
            r#"{"chartType": "bar", "xField": "region", "yField": "revenue"}"#,
            "--selection",
            r#"[{"region": "West", "units": 12}]"#,
        ],
        None,
    )
    .unwrap();
    let spec = parse_output(&stdout);
    assert_eq!(spec["params"][1]["value"], json!([{"region": "West"}]));
}

#[test]
fn test_cli_headline_emits_vega() {
    let stdout = run_gramspec(
        &[
            "--schema",
            "test/cities_schema.json",
            "--data",
            "test/cities.json",
            "--config",
            "headline()",
            "--pretty",
        ],
        None,
    )
    .unwrap();
    assert!(stdout.contains('\n'));
    let spec = parse_output(&stdout);
    assert_eq!(spec["$schema"], json!("https://vega.github.io/schema/vega/v6.json"));
    assert_eq!(spec["data"][0]["values"][0]["city"], json!("Seattle"));
}

#[test]
fn test_cli_eligible_kinds() {
    let stdout = run_gramspec(&["--schema", "test/cities_schema.json", "--eligible"], None).unwrap();
    let kinds = parse_output(&stdout);
    let kinds: Vec<&str> = kinds.as_array().unwrap().iter().filter_map(Value::as_str).collect();
    assert!(kinds.contains(&"usa-map"));
    assert!(kinds.contains(&"bar"));
    assert!(!kinds.contains(&"line"));
}

#[test]
fn test_cli_rejects_bad_shorthand() {
    let err = run_gramspec(
        &["--schema", "test/sales_schema.json", "--data", "test/sales.csv", "--format", "csv", "--config", "bar(x: region"],
        None,
    )
    .unwrap_err();
    assert!(err.contains("Invalid chart config"));
}

#[test]
fn test_cli_no_chart_for_text_only_schema() {
    let err = run_gramspec(&["--schema", "test/notes_schema.json"], Some(r#"[{"note": "hello"}]"#)).unwrap_err();
    assert!(err.contains("No chart kind fits the schema"));
}

#[test]
fn test_cli_missing_schema_file() {
    let err = run_gramspec(&["--schema", "test/absent.json"], Some("[]")).unwrap_err();
    assert!(err.contains("Failed to read schema file"));
}
