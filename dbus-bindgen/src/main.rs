extern crate xml;
extern crate structopt;

mod generate;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;

use crate::generate::{generate, GenOpts, Mode};

#[derive(StructOpt)]
#[structopt(name = "D-Bus Rust binding generator", about = "Generates Rust code from xml introspection data")]
struct Args {
    /// D-Bus XML Introspection file; reads from stdin otherwise.
    #[structopt(long, value_name = "FILE")]
    file: Option<PathBuf>,
    /// Whether to generate client stubs or server dispatch glue.
    #[structopt(
        short,
        long,
        value_name = "MODE",
        default_value = "client",
        possible_values = &["server", "client"],
        case_insensitive = true,
    )]
    mode: String,
    /// Write output into the specified file.
    #[structopt(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Name generated items after this prefix instead of the interface name.
    #[structopt(short, long, value_name = "PREFIX")]
    prefix: Option<String>,
    /// If present, skips a specific prefix for interface names, e g 'org.freedesktop.DBus.'.
    #[structopt(short = "i", long, value_name = "PREFIX")]
    skipprefix: Option<String>,
    /// Comma separated list of filter strings. Only matching interfaces are generated if set.
    #[structopt(short = "f", long, value_name = "FILTER", use_delimiter = true)]
    interfaces: Option<Vec<String>>,
    /// Name of the runtime crate, defaults to 'dbus_bind'.
    #[structopt(long, value_name = "CRATE", default_value = "dbus_bind")]
    bindcrate: String,
    /// Name of the dispatch crate, defaults to 'dbus_dispatch'.
    #[structopt(long, value_name = "CRATE", default_value = "dbus_dispatch")]
    dispatchcrate: String,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let xmldata = if let Some(ref file_path) = args.file {
        std::fs::read_to_string(file_path)
            .map_err(|e| format!("Failed to read {}: {}", file_path.display(), e))?
    } else {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        s
    };

    let mode = match &*args.mode.to_lowercase() {
        "server" => Mode::Server,
        _ => Mode::Client,
    };

    let opts = GenOpts {
        mode,
        bindcrate: args.bindcrate,
        dispatchcrate: args.dispatchcrate,
        prefix: args.prefix,
        skipprefix: args.skipprefix,
        interfaces: args.interfaces.map(|v| v.into_iter().collect()),
        command_line: std::env::args().skip(1).collect::<Vec<String>>().join(" "),
    };

    let code = generate(&xmldata, &opts)?;

    match args.output {
        Some(file_path) => {
            let mut f = std::fs::File::create(&file_path)
                .map_err(|e| format!("Failed to create {}: {}", file_path.display(), e))?;
            f.write_all(code.as_bytes())?;
            f.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut h = stdout.lock();
            h.write_all(code.as_bytes())?;
            h.flush()?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::from_args();
    if let Err(e) = run(args) {
        eprintln!("dbus-bindgen-rust: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(xml_path: PathBuf, out_path: PathBuf) -> Args {
        Args {
            file: Some(xml_path),
            mode: "client".into(),
            output: Some(out_path),
            prefix: None,
            skipprefix: None,
            interfaces: None,
            bindcrate: "dbus_bind".into(),
            dispatchcrate: "dbus_dispatch".into(),
        }
    }

    #[test]
    fn writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("simple.xml");
        std::fs::write(&xml_path,
            "<node><interface name=\"com.example.Simple\"><method name=\"Poke\"/></interface></node>").unwrap();
        let out_path = dir.path().join("out.rs");
        run(args_for(xml_path, out_path.clone())).unwrap();
        let code = std::fs::read_to_string(&out_path).unwrap();
        assert!(code.contains("pub trait ComExampleSimple"));
    }

    #[test]
    fn bad_xml_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("broken.xml");
        std::fs::write(&xml_path, "<node><interface name=\"com.example.Simple\">").unwrap();
        let out_path = dir.path().join("out.rs");
        assert!(run(args_for(xml_path, out_path)).is_err());
    }
}
