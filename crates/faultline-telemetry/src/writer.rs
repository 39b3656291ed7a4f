use std::fs::OpenOptions;
use std::sync::Arc;

use faultline_config::LogOutput;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Open the configured log destination
///
/// # Errors
///
/// Returns an error if a log file cannot be opened for appending
pub fn make_writer(output: &LogOutput) -> anyhow::Result<BoxMakeWriter> {
    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File { path } => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };

    Ok(writer)
}
