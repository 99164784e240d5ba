use cellomics_core::pipeline::config::PipelineConfig;
use cellomics_core::pipeline::BatchReport;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            failed: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Cellomics Stitch"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Rescale"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bit depth"),
        s.value.apply_to(config.target_bit_depth)
    );
    let (low, high) = config
        .stretch
        .bounds()
        .unwrap_or((config.stretch.low_percentile, f64::NAN));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Clip"),
        s.value.apply_to(format!("{:.2}% - {:.2}%", low * 100.0, high * 100.0))
    );
    println!();

    println!("  {}", s.header.apply_to("Composite"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Order"),
        s.value.apply_to(config.order)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(if config.parallel { "parallel" } else { "sequential" })
    );
    println!();
}

pub fn print_batch_summary(report: &BatchReport, config: &PipelineConfig) {
    let s = Styles::new();
    let written = report.succeeded().count();
    let failed = report.failure_count();

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Wells"),
        s.value.apply_to(report.wells.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Written"),
        s.value.apply_to(written)
    );
    if failed > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Failed"),
            s.failed.apply_to(failed)
        );
        for (key, err) in report.failed() {
            println!("    {} {}", s.failed.apply_to(key), err);
        }
    }
    println!(
        "\n  Output saved under {}",
        s.path.apply_to(config.output.display())
    );
}
