use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    let hints = hints_for(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

fn hints_for(err: &Error) -> Vec<String> {
    let mut collector = HintCollector::default();

    collector.collect_io_hints(err);
    collector.collect_model_hints(err);

    if !collector.has_typed_hints {
        collector.collect_fallback_hints(err);
    }

    collector.hints
}

#[derive(Default)]
struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_io_hints(&mut self, err: &Error) {
        use graphite::io::Error as IoError;

        let Some(io_err) = err.downcast_ref::<IoError>() else {
            return;
        };

        self.mark_typed();

        match io_err {
            IoError::Io { source } => self.collect_std_io_hints(source),

            IoError::Parse { line, .. } => {
                self.add(format!("XYZ parser stopped near line {}", line));
                self.add("Expected an atom count, a comment line, then `symbol x y z` rows");
                self.add("Check that the atom count matches the number of coordinate rows");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File contains invalid or non-UTF-8 data");
                self.add("Verify the file is plain-text XYZ");
            }

            ErrorKind::UnexpectedEof => {
                self.add("Unexpected end of file encountered");
                self.add("The file may be truncated or incomplete");
            }

            ErrorKind::BrokenPipe => {
                self.add("Broken pipe: output consumer terminated");
                self.add("This may occur when piping to commands like `head`");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path, permissions, and disk space");
            }
        }
    }

    fn collect_model_hints(&mut self, err: &Error) {
        use graphite::nn::Error as NnError;

        let Some(nn_err) = err.downcast_ref::<NnError>() else {
            return;
        };

        self.mark_typed();

        match nn_err {
            NnError::GateParity { irreps_node, irreps_edge, .. } => {
                self.add(format!(
                    "No scalar irrep appears in {} × {}",
                    irreps_node, irreps_edge
                ));
                self.add("Include a 0e or 0o component in irreps_edge (e.g. \"1x0e + 1x1o\")");
                self.add("Or restrict irreps_hidden to scalar channels");
            }

            NnError::InvalidConfig(_) => {
                self.add("Check the model configuration values");
                self.add("num_convs must be at least 1 and radial_neurons non-empty");
            }

            NnError::InvalidGate(_) => {
                self.add("Odd gate scalars need an odd activation such as tanh");
                self.add("Check the parities of the hidden and edge irreps");
            }

            NnError::ShapeMismatch { expected, got } => {
                self.add(format!("A layer expected {} but received {}", expected, got));
                self.add("Adjacent layers must agree on their irreps");
            }

            NnError::DimensionMismatch { what, .. } => {
                self.add(format!("Input '{}' has the wrong feature width", what));
            }

            NnError::InvalidGraph(_) => {
                self.add("Edge indices must lie in 0..num_nodes");
                self.add("Species indices must be below num_species");
            }

            NnError::InconsistentParity(_) => {
                self.add("Spherical harmonics need irreps with parity (-1)^l or all-even parity");
                self.add("Use \"y\" parity in irreps_edge, e.g. \"0y + 1y + 2y\"");
            }

            NnError::Irreps(_) => {
                self.add("Irreps strings look like \"16x0e + 4x1o\"");
            }

            NnError::ConfigParse(_) => {
                self.add("Model configuration has invalid TOML or unknown keys");
                self.add("Irreps fields are strings; num_convs and seed are integers");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = err.to_string().to_lowercase();

        if msg.contains("stdin") {
            self.add("Pass an input file with -i or pipe data via stdin");
        } else if msg.contains("cutoff") {
            self.add("Pass a positive --cutoff in the units of the coordinates");
        } else if msg.contains("no atoms") {
            self.add("Verify the input file is not empty");
        }
    }
}
