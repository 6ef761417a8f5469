use tabula::{Adapter, CalculationMode, Severity, TsamConfig};
use tabula_mock::{FAILING_PROCESS, MockCollection};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,tabula=debug (with --features tabula/tracing)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();

    let destination = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "target/tabula-demo".to_string());

    // 1. Register the fixture processes, including one that fails bus resolution.
    let mock = MockCollection::new();
    let mut builder = Adapter::builder()
        .mapping(mock.mapping_config())
        .calculation_mode(CalculationMode::Lenient)
        .package_name("tabula-demo");
    for (name, data) in mock.processes() {
        builder = builder.process_data(name, data);
    }
    if let Some(data) = mock.process(FAILING_PROCESS) {
        builder = builder.process_data(FAILING_PROCESS, data);
    }

    // 2. Optionally reduce every year to one typical day.
    if std::env::var_os("TABULA_DEMO_TSAM").is_some() {
        builder = builder.tsam(TsamConfig {
            typical_periods: 1,
            hours_per_period: 24,
            ..TsamConfig::default()
        });
    }
    let adapter = builder.build()?;

    // 3. Build and write.
    let package = adapter.build_and_write(&destination)?;

    // 4. Summarize.
    for (facade, table) in &package.elements {
        println!("{facade}: {} component(s)", table.rows.len());
    }
    println!("busses: {}", package.busses.names().collect::<Vec<_>>().join(", "));
    for failure in &package.failures {
        println!("skipped: {failure}");
    }
    for d in package
        .diagnostics
        .iter()
        .filter(|d| d.kind.severity() == Severity::Warning)
    {
        println!("warning [{:?}] {}: {}", d.kind, d.process.as_deref().unwrap_or("-"), d.message);
    }
    println!("written to {destination}");
    Ok(())
}
