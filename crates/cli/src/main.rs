//! routebench CLI entry point.

fn main() {
    if let Err(e) = routebench_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
