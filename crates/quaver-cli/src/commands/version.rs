//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - statevector circuits for sample-stream processing",
        style("Quaver").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  quaver-core    Statevector circuit engine");
    println!("  quaver-stream  Chunked parallel batch processing");
    println!("  quaver-cli     Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
