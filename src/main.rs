//! repostate binary.

fn main() {
    if let Err(e) = repostate::cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
