use telemetry_query::telemetry;

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    telemetry_query::run()
}
