//! Entry point for the `boundary` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = boundary_server::init_logging().and_then(|()| boundary_server::run()) {
        eprintln!("boundary: {err}");
        std::process::exit(1);
    }
}
