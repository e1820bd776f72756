//! benchlink CLI binary
//!
//! Minimal entrypoint; all logic lives in the library and cli::run().

fn main() {
    if let Err(err) = benchlink::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
